//! Shared helpers for the engine and API tests.

use async_trait::async_trait;
use pulse_core::config::StoreConfig;
use pulse_core::error::PulseError;
use pulse_core::traits::Messenger;
use pulse_store::Store;
use std::sync::{Arc, Mutex};

/// Messenger that records sends in memory and can be told to fail.
pub struct MockMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MockMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, to: &str, body: &str) -> Result<String, PulseError> {
        if self.fail {
            return Err(PulseError::Delivery("mock gateway down".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("SMmock{}", sent.len()))
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Fresh file-backed store in a temp dir. The dir must outlive the store.
pub async fn test_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("test.db").to_string_lossy().into_owned(),
    };
    let store = Store::new(&config).await.unwrap();
    (dir, store)
}
