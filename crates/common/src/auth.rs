use subtle::ConstantTimeEq;

pub const CALLBACK_PATH_PREFIX: &str = "/yt_new_upload/";

/// Path the hub posts to. The verify token rides in the path because the hub
/// sends no custom headers.
pub fn callback_path(verify_token: &str) -> String {
    format!("{}{}", CALLBACK_PATH_PREFIX, verify_token)
}

pub fn callback_url(host: &str, verify_token: &str) -> String {
    format!("https://{}{}", host, callback_path(verify_token))
}

pub fn verify_token_matches(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_url() {
        assert_eq!(
            callback_url("bot.example.com", "tok"),
            "https://bot.example.com/yt_new_upload/tok"
        );
    }

    #[test]
    fn test_verify_token_matches() {
        assert!(verify_token_matches("secret", "secret"));
        assert!(!verify_token_matches("secret", "secreT"));
        assert!(!verify_token_matches("secret", "secret2"));
        assert!(!verify_token_matches("secret", ""));
    }
}
