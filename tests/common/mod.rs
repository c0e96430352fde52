//! Shared test harness for integration tests.
//!
//! Provides [`MockClient`], a scriptable [`RemoteClient`] with per-operation
//! call counters, queued failure injection and an optional gate to hold the
//! stash operation open, plus a [`harness`] constructor wiring a store to a
//! queue backed by the mock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;

use vocalpress::client::{MetadataPayload, PublishedFile, RemoteClient};
use vocalpress::error::{Error, Result};
use vocalpress::queue::RequestQueue;
use vocalpress::record::MediaKind;
use vocalpress::session::{Gender, Language, Locutor, SessionMetadata};
use vocalpress::store::RecordStore;

/// Scriptable remote client.
///
/// By default every operation succeeds with a generated value. Failures can
/// be queued per operation with [`fail_next_stash`](Self::fail_next_stash)
/// and friends; setting [`stash_gate`](Self::hold_stashes) makes every
/// stash wait until the gate is released, so tests can observe in-flight
/// operations.
#[derive(Default)]
pub struct MockClient {
    pub stash_calls: AtomicUsize,
    pub publish_calls: AtomicUsize,
    pub finalize_calls: AtomicUsize,
    stash_failures: Mutex<VecDeque<Error>>,
    publish_failures: Mutex<VecDeque<Error>>,
    finalize_failures: Mutex<VecDeque<Error>>,
    stash_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next stash call fail with `code`.
    pub fn fail_next_stash(&self, code: &str) {
        self.stash_failures.lock().push_back(Error::remote(code));
    }

    /// Make the next publish call fail with `code`.
    pub fn fail_next_publish(&self, code: &str) {
        self.publish_failures.lock().push_back(Error::remote(code));
    }

    /// Make the next finalize call fail with `code`.
    pub fn fail_next_finalize(&self, code: &str) {
        self.finalize_failures.lock().push_back(Error::remote(code));
    }

    /// Make the next publish call fail with a nested detail message.
    pub fn fail_next_publish_with_info(&self, code: &str, info: &str) {
        self.publish_failures
            .lock()
            .push_back(Error::remote_with_info(code, info));
    }

    /// Hold every stash call open until the returned gate is notified.
    pub fn hold_stashes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.stash_gate.lock() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl RemoteClient for MockClient {
    async fn upload_temporary(&self, _blob: Bytes, _name_hint: &str) -> Result<String> {
        let call = self.stash_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let gate = self.stash_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(err) = self.stash_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(format!("key{call}"))
    }

    async fn publish_permanent(
        &self,
        _storage_key: &str,
        name: &str,
        _description: &str,
    ) -> Result<PublishedFile> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.publish_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(PublishedFile {
            title: name.to_string(),
            url: format!("https://files.example/{name}"),
            timestamp: Utc::now(),
        })
    }

    async fn create_metadata_item(&self, _payload: &MetadataPayload) -> Result<String> {
        let call = self.finalize_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(err) = self.finalize_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(format!("Q{call}"))
    }
}

/// Session context used by every integration test.
pub fn session_metadata() -> SessionMetadata {
    SessionMetadata {
        language: Language {
            code: "fr".into(),
            label: "French".into(),
            ext_id: "Q150".into(),
            iso3: Some("fra".into()),
        },
        locutor: Locutor {
            name: "Alex".into(),
            ext_id: Some("Q7".into()),
            gender: Gender::Other,
            location: "Lyon".into(),
            languages: vec!["fr".into()],
            main: true,
            is_new: false,
        },
        license: "CC-BY-SA-4.0".into(),
        media: MediaKind::Audio,
        author: None,
    }
}

/// Build a store wired to a queue backed by the given mock client.
pub fn harness(client: Arc<MockClient>) -> Arc<RecordStore> {
    let queue = Arc::new(RequestQueue::new(client));
    RecordStore::new(session_metadata(), queue)
}
