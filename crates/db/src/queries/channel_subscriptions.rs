use crate::models::ChannelSubscriptionRow;
use common::types::NewChannelSubscription;
use sqlx::PgPool;

pub async fn create(
    pool: &PgPool,
    id: &str,
    new: &NewChannelSubscription,
) -> Result<ChannelSubscriptionRow, sqlx::Error> {
    sqlx::query_as::<_, ChannelSubscriptionRow>(
        r#"
        INSERT INTO youtube_channel_subscriptions
            (id, guild_id, channel_id, youtube_channel_id, youtube_channel_name,
             mention_everyone, mention_roles, publish_livestream, publish_shorts, enabled)
        VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, true), COALESCE($9, true), true)
        RETURNING id, guild_id, channel_id, youtube_channel_id, youtube_channel_name,
                  mention_everyone, mention_roles, publish_livestream, publish_shorts,
                  enabled, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&new.guild_id)
    .bind(&new.channel_id)
    .bind(&new.youtube_channel_id)
    .bind(&new.youtube_channel_name)
    .bind(new.mention_everyone)
    .bind(&new.mention_roles)
    .bind(new.publish_livestream)
    .bind(new.publish_shorts)
    .fetch_one(pool)
    .await
}

pub async fn get_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ChannelSubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, ChannelSubscriptionRow>(
        r#"
        SELECT id, guild_id, channel_id, youtube_channel_id, youtube_channel_name,
               mention_everyone, mention_roles, publish_livestream, publish_shorts,
               enabled, created_at, updated_at
        FROM youtube_channel_subscriptions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_guild(
    pool: &PgPool,
    guild_id: &str,
) -> Result<Vec<ChannelSubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, ChannelSubscriptionRow>(
        r#"
        SELECT id, guild_id, channel_id, youtube_channel_id, youtube_channel_name,
               mention_everyone, mention_roles, publish_livestream, publish_shorts,
               enabled, created_at, updated_at
        FROM youtube_channel_subscriptions
        WHERE guild_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_youtube_channel(
    pool: &PgPool,
    youtube_channel_id: &str,
) -> Result<Vec<ChannelSubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, ChannelSubscriptionRow>(
        r#"
        SELECT id, guild_id, channel_id, youtube_channel_id, youtube_channel_name,
               mention_everyone, mention_roles, publish_livestream, publish_shorts,
               enabled, created_at, updated_at
        FROM youtube_channel_subscriptions
        WHERE youtube_channel_id = $1
        "#,
    )
    .bind(youtube_channel_id)
    .fetch_all(pool)
    .await
}

pub async fn count_by_guild(pool: &PgPool, guild_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM youtube_channel_subscriptions
        WHERE guild_id = $1
        "#,
    )
    .bind(guild_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM youtube_channel_subscriptions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn disable_by_channel(pool: &PgPool, channel_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE youtube_channel_subscriptions
        SET enabled = false, updated_at = now()
        WHERE channel_id = $1
        "#,
    )
    .bind(channel_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn update_youtube_channel_name(
    pool: &PgPool,
    youtube_channel_id: &str,
    name: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE youtube_channel_subscriptions
        SET youtube_channel_name = $1, updated_at = now()
        WHERE youtube_channel_id = $2
        "#,
    )
    .bind(name)
    .bind(youtube_channel_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn distinct_youtube_channel_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT youtube_channel_id
        FROM youtube_channel_subscriptions
        ORDER BY youtube_channel_id
        "#,
    )
    .fetch_all(pool)
    .await
}
