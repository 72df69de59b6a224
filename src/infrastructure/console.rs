use crate::domain::ports::Notifier;
use crate::error::Result;
use async_trait::async_trait;

/// Notifier that writes messages to the log instead of an SMTP relay.
///
/// The replay binary uses it so dispatched notices are visible on stderr
/// without any mail transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        tracing::info!(recipient, subject, "notification dispatched");
        Ok(())
    }
}
