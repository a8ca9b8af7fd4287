use async_trait::async_trait;
use domain::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    Failed(String),
}

impl NotifyError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 尽力而为的用户通知端口。失败由调用方记录日志后继续，
/// 绝不因通知失败中断状态转移。
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: UserId, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// 空实现：未配置通知协作者时使用。
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        subject: &str,
        _body: &str,
    ) -> Result<(), NotifyError> {
        tracing::debug!(%user_id, subject, "notifier disabled, dropping notification");
        Ok(())
    }
}
