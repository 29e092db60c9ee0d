//! Careeragent Notify - push notifications to the profile owner
//!
//! Notifications are a side channel: tools call [`Notifier::notify`] once,
//! log any failure and carry on. There is no retry.

use careeragent_core::NotifierConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Notification error types
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Something that can deliver a short text message to the profile owner.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Pushover message API client
pub struct PushoverNotifier {
    client: reqwest::Client,
    token: String,
    user: String,
    api_url: String,
}

impl PushoverNotifier {
    pub fn new(token: impl Into<String>, user: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token: token.into(),
            user: user.into(),
            api_url: NotifierConfig::default().api_url,
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[async_trait::async_trait]
impl Notifier for PushoverNotifier {
    fn name(&self) -> &str { "pushover" }

    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        debug!("Pushover: {}", message);

        let response = self
            .client
            .post(&self.api_url)
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user.as_str()),
                ("message", message),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

/// Writes notifications to the log instead of sending them.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str { "log" }

    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!(target: "careeragent::notify", "{}", message);
        Ok(())
    }
}

/// Pick the notifier for a configuration: Pushover when both credentials are
/// set, the log otherwise.
pub fn from_config(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match (&config.pushover_token, &config.pushover_user) {
        (Some(token), Some(user)) => {
            let notifier = PushoverNotifier::new(token, user, Duration::from_secs(config.timeout_secs))?
                .with_api_url(&config.api_url);
            Ok(Arc::new(notifier))
        }
        _ => {
            warn!("Pushover credentials not set; notifications will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}
