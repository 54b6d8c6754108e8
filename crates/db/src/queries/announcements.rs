use crate::models::YoutubeAnnouncementsRow;
use sqlx::PgPool;

pub async fn get_by_guild(
    pool: &PgPool,
    guild_id: i64,
) -> Result<Option<YoutubeAnnouncementsRow>, sqlx::Error> {
    sqlx::query_as::<_, YoutubeAnnouncementsRow>(
        r#"
        SELECT guild_id, message, enabled
        FROM youtube_announcements
        WHERE guild_id = $1
        "#,
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await
}

pub async fn upsert(
    pool: &PgPool,
    guild_id: i64,
    message: &str,
    enabled: Option<bool>,
) -> Result<YoutubeAnnouncementsRow, sqlx::Error> {
    sqlx::query_as::<_, YoutubeAnnouncementsRow>(
        r#"
        INSERT INTO youtube_announcements (guild_id, message, enabled)
        VALUES ($1, $2, COALESCE($3, false))
        ON CONFLICT (guild_id)
        DO UPDATE SET message = EXCLUDED.message, enabled = EXCLUDED.enabled
        RETURNING guild_id, message, enabled
        "#,
    )
    .bind(guild_id)
    .bind(message)
    .bind(enabled)
    .fetch_one(pool)
    .await
}
