pub const GUILD_MAX_FEEDS: i64 = 50;
pub const GUILD_MAX_FEEDS_PREMIUM: i64 = 250;

/// Premium status of the guild a request runs on behalf of. Resolving it is
/// the host's job.
pub trait PremiumContext {
    fn is_premium(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildContext {
    pub guild_id: String,
    pub premium: bool,
}

impl PremiumContext for GuildContext {
    fn is_premium(&self) -> bool {
        self.premium
    }
}

pub fn max_feeds(is_premium: bool) -> i64 {
    if is_premium {
        GUILD_MAX_FEEDS_PREMIUM
    } else {
        GUILD_MAX_FEEDS
    }
}

pub fn max_feeds_for_context<C: PremiumContext + ?Sized>(ctx: &C) -> i64 {
    max_feeds(ctx.is_premium())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_feeds() {
        assert_eq!(max_feeds(false), 50);
        assert_eq!(max_feeds(true), 250);
    }

    #[test]
    fn test_max_feeds_for_context() {
        let free = GuildContext {
            guild_id: "1".to_string(),
            premium: false,
        };
        let premium = GuildContext {
            guild_id: "1".to_string(),
            premium: true,
        };

        assert_eq!(max_feeds_for_context(&free), GUILD_MAX_FEEDS);
        assert_eq!(max_feeds_for_context(&premium), GUILD_MAX_FEEDS_PREMIUM);
    }
}
