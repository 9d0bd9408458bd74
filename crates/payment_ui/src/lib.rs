use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUiOptions {
    pub client_secret: String,
    pub container: String,
}

#[async_trait]
pub trait PaymentUiSession: Send + Sync {
    async fn confirm(&self, return_url: &str) -> anyhow::Result<()>;
    fn is_attached(&self) -> bool;
    fn detach(&self);
}

#[async_trait]
pub trait PaymentUiConnector: Send + Sync {
    async fn mount(
        &self,
        options: PaymentUiOptions,
    ) -> anyhow::Result<std::sync::Arc<dyn PaymentUiSession>>;
}

/// Owns a mounted hosted payment form; detaches it when dropped. `detach`
/// on the underlying session must be idempotent.
pub struct PaymentUiMount {
    session: std::sync::Arc<dyn PaymentUiSession>,
}

impl PaymentUiMount {
    pub fn new(session: std::sync::Arc<dyn PaymentUiSession>) -> Self {
        Self { session }
    }

    pub async fn confirm(&self, return_url: &str) -> anyhow::Result<()> {
        self.session.confirm(return_url).await
    }

    pub fn is_attached(&self) -> bool {
        self.session.is_attached()
    }
}

impl Drop for PaymentUiMount {
    fn drop(&mut self) {
        self.session.detach();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct CountingSession {
        detached: AtomicUsize,
    }

    #[async_trait]
    impl PaymentUiSession for CountingSession {
        async fn confirm(&self, _return_url: &str) -> anyhow::Result<()> {
            Ok(())
        }

        fn is_attached(&self) -> bool {
            self.detached.load(Ordering::SeqCst) == 0
        }

        fn detach(&self) {
            self.detached.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn mount_detaches_on_drop() {
        let session = Arc::new(CountingSession {
            detached: AtomicUsize::new(0),
        });
        let mount = PaymentUiMount::new(session.clone());
        assert!(mount.is_attached());
        drop(mount);
        assert_eq!(session.detached.load(Ordering::SeqCst), 1);
        assert!(!session.is_attached());
    }

    #[test]
    fn options_serialize_for_the_bridge() {
        let options = PaymentUiOptions {
            client_secret: "cs_test_123".to_string(),
            container: "#payment-element".to_string(),
        };
        let encoded = serde_json::to_string(&options).expect("serialize options");
        assert!(encoded.contains("cs_test_123"));
        assert!(encoded.contains("#payment-element"));
    }
}
