use async_trait::async_trait;
use common::auth::callback_url;
use common::config::HubSettings;
use common::feed::topic_url;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubMode {
    Subscribe,
    Unsubscribe,
}

impl HubMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HubMode::Subscribe => "subscribe",
            HubMode::Unsubscribe => "unsubscribe",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebSubError {
    #[error("hub request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("hub rejected request: {status} ({reason}) {body}")]
    HubRejected {
        status: u16,
        reason: String,
        body: String,
    },
}

/// Subscription primitives against a WebSub hub.
#[async_trait]
pub trait Hub: Send + Sync {
    async fn subscribe(&self, youtube_channel_id: &str) -> Result<(), WebSubError>;
    async fn unsubscribe(&self, youtube_channel_id: &str) -> Result<(), WebSubError>;
}

#[async_trait]
impl<T: Hub + ?Sized> Hub for std::sync::Arc<T> {
    async fn subscribe(&self, youtube_channel_id: &str) -> Result<(), WebSubError> {
        (**self).subscribe(youtube_channel_id).await
    }

    async fn unsubscribe(&self, youtube_channel_id: &str) -> Result<(), WebSubError> {
        (**self).unsubscribe(youtube_channel_id).await
    }
}

#[derive(Clone)]
pub struct WebSubClient {
    client: reqwest::Client,
    settings: HubSettings,
}

impl WebSubClient {
    pub fn new(client: reqwest::Client, settings: HubSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    pub fn form(&self, mode: HubMode, youtube_channel_id: &str) -> [(&'static str, String); 5] {
        [
            (
                "hub.callback",
                callback_url(&self.settings.host, &self.settings.verify_token),
            ),
            ("hub.topic", topic_url(youtube_channel_id)),
            ("hub.verify", "sync".to_string()),
            ("hub.mode", mode.as_str().to_string()),
            ("hub.verify_token", self.settings.verify_token.clone()),
        ]
    }

    pub async fn request(&self, mode: HubMode, youtube_channel_id: &str) -> Result<(), WebSubError> {
        let form = self.form(mode, youtube_channel_id);

        let resp = self
            .client
            .post(&self.settings.hub_url)
            .form(&form[..])
            .send()
            .await
            .map_err(|err| {
                error!(
                    error = %err,
                    channel_id = %youtube_channel_id,
                    mode = mode.as_str(),
                    "websub: hub request failed"
                );
                WebSubError::Transport(err)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WebSubError::HubRejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
                body,
            });
        }

        match mode {
            HubMode::Subscribe => {
                info!(channel_id = %youtube_channel_id, "websub: subscribed to channel")
            }
            HubMode::Unsubscribe => {
                info!(channel_id = %youtube_channel_id, "websub: unsubscribed from channel")
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Hub for WebSubClient {
    async fn subscribe(&self, youtube_channel_id: &str) -> Result<(), WebSubError> {
        self.request(HubMode::Subscribe, youtube_channel_id).await
    }

    async fn unsubscribe(&self, youtube_channel_id: &str) -> Result<(), WebSubError> {
        self.request(HubMode::Unsubscribe, youtube_channel_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<Vec<(String, String)>>>>;

    async fn spawn_hub(status: StatusCode, body: &'static str) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/subscribe",
                post(
                    move |State(seen): State<Seen>, Form(form): Form<Vec<(String, String)>>| async move {
                        seen.lock().unwrap().push(form);
                        (status, body)
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/subscribe", addr), seen)
    }

    fn client(hub_url: &str) -> WebSubClient {
        WebSubClient::new(
            reqwest::Client::new(),
            HubSettings {
                hub_url: hub_url.to_string(),
                host: "bot.example.com".to_string(),
                verify_token: "tok123".to_string(),
            },
        )
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> &'a str {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing {}", key))
    }

    #[test]
    fn test_form_fields() {
        let form = client("http://unused").form(HubMode::Subscribe, "UC123");
        let keys: Vec<_> = form.iter().map(|(k, _)| *k).collect();

        assert_eq!(
            keys,
            vec![
                "hub.callback",
                "hub.topic",
                "hub.verify",
                "hub.mode",
                "hub.verify_token"
            ]
        );
        assert_eq!(form[0].1, "https://bot.example.com/yt_new_upload/tok123");
        assert_eq!(
            form[1].1,
            "https://www.youtube.com/xml/feeds/videos.xml?channel_id=UC123"
        );
        assert_eq!(form[2].1, "sync");
        assert_eq!(form[3].1, "subscribe");
        assert_eq!(form[4].1, "tok123");
    }

    #[test]
    fn test_unsubscribe_form_mode() {
        let form = client("http://unused").form(HubMode::Unsubscribe, "UC123");
        assert_eq!(form[3], ("hub.mode", "unsubscribe".to_string()));
    }

    #[tokio::test]
    async fn test_subscribe_accepted() {
        let (url, seen) = spawn_hub(StatusCode::NO_CONTENT, "").await;

        client(&url).subscribe("UCabc").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let form = &seen[0];
        assert_eq!(form.len(), 5);
        assert_eq!(field(form, "hub.mode"), "subscribe");
        assert_eq!(field(form, "hub.verify"), "sync");
        assert_eq!(field(form, "hub.verify_token"), "tok123");
        assert_eq!(
            field(form, "hub.topic"),
            "https://www.youtube.com/xml/feeds/videos.xml?channel_id=UCabc"
        );
        assert_eq!(
            field(form, "hub.callback"),
            "https://bot.example.com/yt_new_upload/tok123"
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_sends_unsubscribe_mode() {
        let (url, seen) = spawn_hub(StatusCode::ACCEPTED, "").await;

        client(&url).unsubscribe("UCabc").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(field(&seen[0], "hub.mode"), "unsubscribe");
    }

    #[tokio::test]
    async fn test_rejected_status_includes_body() {
        let (url, _seen) = spawn_hub(StatusCode::NOT_FOUND, "not found").await;

        let err = client(&url).subscribe("UCabc").await.unwrap_err();

        match &err {
            WebSubError::HubRejected { status, body, .. } => {
                assert_eq!(*status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("expected HubRejected, got {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("not found"));
    }

    #[tokio::test]
    async fn test_unsubscribe_rejected() {
        let (url, _seen) = spawn_hub(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;

        let err = client(&url).unsubscribe("UCabc").await.unwrap_err();
        assert!(matches!(err, WebSubError::HubRejected { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_hub_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}/subscribe", addr))
            .subscribe("UCabc")
            .await
            .unwrap_err();
        assert!(matches!(err, WebSubError::Transport(_)));
    }
}
