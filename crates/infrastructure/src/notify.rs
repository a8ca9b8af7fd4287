//! Webhook 通知适配器
//!
//! 邮件投递属于外部协作者，这里只把 `{user_id, subject, body}` POST 给
//! 配置的回调地址，尽力而为。

use async_trait::async_trait;
use serde::Serialize;

use application::notifier::{Notifier, NotifyError};
use domain::UserId;

#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    user_id: UserId,
    subject: &'a str,
    body: &'a str,
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, user_id: UserId, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.client
            .post(&self.endpoint)
            .json(&NotificationPayload {
                user_id,
                subject,
                body,
            })
            .send()
            .await
            .map_err(|err| NotifyError::failed(err.to_string()))?
            .error_for_status()
            .map_err(|err| NotifyError::failed(err.to_string()))?;
        Ok(())
    }
}
