use async_trait::async_trait;
use tracing::{debug, info};

/// Outbound notification sink (email, chat). Delivery is best-effort:
/// implementations report whether the message went out and must never fail
/// the calling operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, to: &str, subject: &str, body: &str) -> bool;
}

/// Sink used when no delivery channel is configured: the message is written
/// to the service log and reported as undelivered.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, to: &str, subject: &str, body: &str) -> bool {
        info!(%to, %subject, "notification (delivery not configured)");
        debug!(%body, "notification body");
        false
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub struct SentMessage {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    /// Records every message so tests can assert on recipients and bodies.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<SentMessage>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, to: &str, subject: &str, body: &str) -> bool {
            self.sent.lock().unwrap().push(SentMessage {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            true
        }
    }
}
