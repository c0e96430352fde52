//! The aggregating record collection and its pipeline orchestration.
//!
//! [`RecordStore`] owns every [`Record`] of a session, keeps per-state
//! counters consistent on every transition (never by rescanning), and
//! drives the three advancing operations (stash, publish, finalize)
//! through the shared [`RequestQueue`]. It is also the only layer that
//! interprets failures: it classifies cancellations, restores the
//! pre-attempt state and records the error text.

mod events;
mod types;

pub use events::StoreEvent;
pub use types::WordEntry;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use rand::Rng;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::queue::RequestQueue;
use crate::record::{self, Record, RecordState};
use crate::session::{Language, Locutor, SessionMetadata};

/// Broadcast capacity for store events.
const EVENT_CAPACITY: usize = 256;

/// Collection of all records of a session, with derived counters and the
/// orchestration of their pipeline operations.
pub struct RecordStore {
    metadata: RwLock<SessionMetadata>,
    /// Presentation order; insertion order is meaningful.
    words: RwLock<Vec<String>>,
    records: RwLock<HashMap<String, Record>>,
    checkboxes: RwLock<HashMap<String, bool>>,
    /// Per-state record counts, adjusted on every transition.
    status_count: RwLock<HashMap<RecordState, u64>>,
    /// Per-record error values; drives the error counter independently of
    /// the state counters.
    errors: RwLock<HashMap<String, Option<String>>>,
    error_count: RwLock<u64>,
    queue: Arc<RequestQueue>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl RecordStore {
    /// Create an empty store for the given session context.
    pub fn new(metadata: SessionMetadata, queue: Arc<RequestQueue>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let mut status_count = HashMap::new();
        for state in RecordState::ALL {
            status_count.insert(state, 0);
        }

        Arc::new(Self {
            metadata: RwLock::new(metadata),
            words: RwLock::new(Vec::new()),
            records: RwLock::new(HashMap::new()),
            checkboxes: RwLock::new(HashMap::new()),
            status_count: RwLock::new(status_count),
            errors: RwLock::new(HashMap::new()),
            error_count: RwLock::new(0),
            queue,
            event_tx,
        })
    }

    /// Subscribe to record state changes and error changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    fn broadcast(&self, event: StoreEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("no subscribers for store event");
        }
    }

    // ========================================================================
    // Word-list ingestion
    // ========================================================================

    /// Add words to the list, creating a record for each.
    ///
    /// Tabs are stripped and whitespace trimmed; empty strings and exact
    /// duplicates are skipped. Returns how many records were created.
    pub fn add_words<I>(&self, entries: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<WordEntry>,
    {
        let media = self.metadata.read().media;
        let mut added = 0;

        for entry in entries {
            let entry: WordEntry = entry.into();
            let word = entry.text.replace('\t', "").trim().to_string();

            if word.is_empty() {
                debug!("skipping empty word");
                continue;
            }
            if let Some(rec) = self.records.write().get_mut(&word) {
                // Known word: only its extra statements can be refreshed.
                if !entry.extra.is_empty() {
                    rec.set_extra(entry.extra);
                }
                debug!(word = %word, "skipping duplicate word");
                continue;
            }

            let mut rec = Record::new(word.clone(), media);
            rec.set_extra(entry.extra);

            self.records.write().insert(word.clone(), rec);
            self.errors.write().insert(word.clone(), None);
            self.checkboxes.write().insert(word.clone(), true);
            *self
                .status_count
                .write()
                .entry(RecordState::Up)
                .or_insert(0) += 1;
            self.words.write().push(word);
            added += 1;
        }

        if added > 0 {
            info!(added, "added words to the session");
        }
        added
    }

    // ========================================================================
    // Advancing operations
    // ========================================================================

    /// Stash a record: attach `blob` if supplied, then upload the captured
    /// media to temporary storage through the request queue.
    ///
    /// On success the record moves to `Stashed`; on failure it is restored
    /// to `Ready` with the error recorded. A cancelled upload is not an
    /// error and leaves the record wherever its reset put it.
    pub async fn do_stash(&self, word: &str, blob: Option<Bytes>) -> Result<()> {
        self.ensure_known(word)?;
        self.set_error_value(word, None);

        let meta = self.metadata.read().clone();

        if let Some(blob) = blob {
            self.with_record(word, |rec| {
                if rec.set_blob(blob, meta.media) {
                    Ok(())
                } else {
                    Err(Error::validation(format!(
                        "record '{word}' can no longer be re-recorded"
                    )))
                }
            })?;
        }

        let (token, blob, name_hint) = self.with_record(word, |rec| {
            let blob = rec
                .blob()
                .cloned()
                .ok_or_else(|| Error::validation(format!("record '{word}' has no captured media")))?;
            let name_hint = record::filename(rec, &meta);
            let token = rec.begin_stash()?;
            Ok((token, blob, name_hint))
        })?;

        info!(word = %word, "stashing record");
        let task_token = token.clone();
        let result = self
            .queue
            .push(token, move |client| {
                Box::pin(async move {
                    tokio::select! {
                        biased;
                        () = task_token.cancelled() => Err(Error::Cancelled),
                        res = client.upload_temporary(blob, &name_hint) => res,
                    }
                })
            })
            .await;

        match result {
            Ok(file_key) => match self.with_record(word, |rec| rec.mark_stashed(file_key)) {
                Ok(()) => {
                    self.set_checkbox(word, true);
                    info!(word = %word, "record stashed");
                    Ok(())
                }
                Err(_) => {
                    // The record was reset while its stash was completing.
                    debug!(word = %word, "discarding stash result for a reset record");
                    Ok(())
                }
            },
            Err(err) => self.settle_failure(word, RecordState::Ready, err),
        }
    }

    /// Publish a stashed record to permanent storage, then finalize it.
    ///
    /// On failure the record is restored to `Stashed`. When the permanent
    /// descriptor already exists from a partial earlier attempt the upload
    /// is skipped and the flow proceeds directly to finalize, so the file
    /// is never published twice.
    pub async fn do_publish(&self, word: &str) -> Result<()> {
        self.ensure_known(word)?;
        self.set_error_value(word, None);

        let already_published = {
            let records = self.records.read();
            records
                .get(word)
                .ok_or_else(|| Error::not_found(word))?
                .published()
                .is_some()
        };
        if already_published {
            info!(word = %word, "permanent copy already exists; skipping publish");
            return self.do_finalize(word).await;
        }

        let meta = self.metadata.read().clone();
        let (token, file_key, name, description) = self.with_record(word, |rec| {
            let file_key = rec
                .file_key()
                .map(str::to_string)
                .ok_or_else(|| Error::validation(format!("record '{word}' is not stashed")))?;
            let name = record::filename(rec, &meta);
            let description = record::description(rec, &meta);
            let token = rec.begin_publish()?;
            Ok((token, file_key, name, description))
        })?;

        info!(word = %word, "publishing record");
        let task_token = token.clone();
        let result = self
            .queue
            .push(token, move |client| {
                Box::pin(async move {
                    tokio::select! {
                        biased;
                        () = task_token.cancelled() => Err(Error::Cancelled),
                        res = client.publish_permanent(&file_key, &name, &description) => res,
                    }
                })
            })
            .await;

        match result {
            Ok(file) => {
                if self.with_record(word, |rec| rec.mark_uploaded(file)).is_err() {
                    debug!(word = %word, "discarding publish result for a reset record");
                    return Ok(());
                }
                self.do_finalize(word).await
            }
            Err(err) => self.settle_failure(word, RecordState::Stashed, err),
        }
    }

    /// Create the metadata item describing a published record.
    ///
    /// Runs on the queue's priority lane: a record left uploaded but not
    /// finalized for long risks duplicate publish attempts, so finalize
    /// work must not be starved behind other records' stash and publish
    /// traffic. On failure the record is restored to `Uploaded`.
    pub async fn do_finalize(&self, word: &str) -> Result<()> {
        self.ensure_known(word)?;
        self.set_error_value(word, None);

        let meta = self.metadata.read().clone();
        let (token, payload) = self.with_record(word, |rec| {
            let payload = record::metadata_payload(rec, &meta)?;
            let token = rec.begin_finalize()?;
            Ok((token, payload))
        })?;

        info!(word = %word, "finalizing record");
        let task_token = token.clone();
        let result = self
            .queue
            .force(token, move |client| {
                Box::pin(async move {
                    tokio::select! {
                        biased;
                        () = task_token.cancelled() => Err(Error::Cancelled),
                        res = client.create_metadata_item(&payload) => res,
                    }
                })
            })
            .await;

        match result {
            Ok(item_id) => match self.with_record(word, |rec| rec.mark_done(item_id)) {
                Ok(()) => {
                    self.set_checkbox(word, true);
                    info!(word = %word, "record fully published");
                    Ok(())
                }
                Err(_) => {
                    debug!(word = %word, "discarding finalize result for a reset record");
                    Ok(())
                }
            },
            Err(err) => self.settle_failure(word, RecordState::Uploaded, err),
        }
    }

    /// Classify a failed queue outcome: cancellations return silently,
    /// anything else restores the pre-attempt state and records the error.
    fn settle_failure(&self, word: &str, restore_to: RecordState, err: Error) -> Result<()> {
        if err.is_cancelled() {
            // Another piece of the system superseded this operation on
            // purpose; don't mess with it.
            debug!(word = %word, "operation cancelled");
            return Ok(());
        }

        let text = err.user_message();
        warn!(word = %word, error = %text, restore_to = ?restore_to, "remote operation failed");

        let recorded = self.with_record(word, |rec| {
            rec.set_error(text.as_str());
            Ok(())
        });
        if recorded.is_err() {
            // The record was removed while its failure was settling; there
            // is nothing left to charge the error against.
            debug!(word = %word, "record removed before its failure settled");
            return Err(err);
        }
        let _ = self.with_record(word, |rec| {
            rec.restore(restore_to);
            Ok(())
        });
        self.set_error_value(word, Some(text));
        Err(err)
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Reset one record to `Up`, clearing its error and re-ticking its
    /// checkbox. Any pending operation is cancelled, not failed.
    pub fn reset_record(&self, word: &str) -> Result<()> {
        self.with_record(word, |rec| {
            rec.reset();
            Ok(())
        })?;
        self.set_error_value(word, None);
        self.set_checkbox(word, true);
        Ok(())
    }

    /// Remove a record entirely, cancelling any pending operation.
    /// Returns false when the word is unknown.
    pub fn clear_record(&self, word: &str) -> bool {
        let Some(rec) = self.records.write().remove(word) else {
            return false;
        };
        rec.cancel_pending();

        {
            let mut counts = self.status_count.write();
            if let Some(count) = counts.get_mut(&rec.state()) {
                *count -= 1;
            }
        }
        if let Some(Some(_)) = self.errors.write().remove(word) {
            *self.error_count.write() -= 1;
        }
        self.checkboxes.write().remove(word);
        self.words.write().retain(|w| w != word);
        true
    }

    /// Remove every record and zero all counters.
    pub fn clear_all_records(&self) {
        {
            let mut records = self.records.write();
            for rec in records.values() {
                rec.cancel_pending();
            }
            records.clear();
        }
        self.words.write().clear();
        self.checkboxes.write().clear();
        self.errors.write().clear();
        *self.error_count.write() = 0;

        let mut counts = self.status_count.write();
        for state in RecordState::ALL {
            counts.insert(state, 0);
        }
    }

    /// Remove every `Done` record and reset all the others to `Up`.
    pub fn clear_all_published_records(&self) {
        for word in self.words() {
            if self.state_of(&word) == Some(RecordState::Done) {
                self.clear_record(&word);
            } else {
                let _ = self.reset_record(&word);
            }
        }
    }

    /// Re-arm every record carrying an error back to `Up`.
    pub fn reset_all_errors(&self) {
        for word in self.words() {
            if self.error_of(&word).is_some() {
                let _ = self.reset_record(&word);
            }
        }
    }

    /// Re-arm every record stuck in `Stashing` (e.g. after an interrupted
    /// session) back to `Up`.
    pub fn reset_stashing_records(&self) {
        for word in self.words() {
            if self.state_of(&word) == Some(RecordState::Stashing) {
                let _ = self.reset_record(&word);
            }
        }
    }

    /// Shuffle the presentation order without touching any record state.
    pub fn randomise_list(&self) {
        let mut rng = rand::thread_rng();
        let mut words = self.words.write();

        // Fisher-Yates shuffle
        for i in (1..words.len()).rev() {
            let j = rng.gen_range(0..=i);
            words.swap(i, j);
        }
    }

    // ========================================================================
    // Session context
    // ========================================================================

    /// Current session context.
    pub fn session_metadata(&self) -> SessionMetadata {
        self.metadata.read().clone()
    }

    /// Replace the whole session context. Existing records are invalid
    /// under the new context and are cleared.
    pub fn set_metadata(&self, metadata: SessionMetadata) {
        *self.metadata.write() = metadata;
        info!("session context changed; clearing all records");
        self.clear_all_records();
    }

    /// Change the locutor profile, clearing all records.
    pub fn set_locutor(&self, locutor: Locutor) {
        self.metadata.write().locutor = locutor;
        info!("locutor changed; clearing all records");
        self.clear_all_records();
    }

    /// Change the target language, clearing all records.
    pub fn set_language(&self, language: Language) {
        self.metadata.write().language = language;
        info!("language changed; clearing all records");
        self.clear_all_records();
    }

    /// Change the license, clearing all records.
    pub fn set_license(&self, license: impl Into<String>) {
        self.metadata.write().license = license.into();
        info!("license changed; clearing all records");
        self.clear_all_records();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Words in presentation order.
    pub fn words(&self) -> Vec<String> {
        self.words.read().clone()
    }

    /// Snapshot of one record.
    pub fn get_record(&self, word: &str) -> Option<Record> {
        self.records.read().get(word).cloned()
    }

    /// Current state of one record.
    pub fn state_of(&self, word: &str) -> Option<RecordState> {
        self.records.read().get(word).map(Record::state)
    }

    /// Error recorded against one record, if any.
    pub fn error_of(&self, word: &str) -> Option<String> {
        self.errors.read().get(word).cloned().flatten()
    }

    /// Words whose last operation failed, in presentation order.
    pub fn failed_words(&self) -> Vec<String> {
        let errors = self.errors.read();
        self.words
            .read()
            .iter()
            .filter(|word| matches!(errors.get(*word), Some(Some(_))))
            .cloned()
            .collect()
    }

    /// Sum of the record counts for the given states.
    pub fn count_status(&self, states: &[RecordState]) -> u64 {
        let counts = self.status_count.read();
        states
            .iter()
            .map(|state| counts.get(state).copied().unwrap_or(0))
            .sum()
    }

    /// Whether any record currently sits in `state`.
    pub fn has_status(&self, state: RecordState) -> bool {
        self.count_status(&[state]) > 0
    }

    /// Snapshot of all per-state counts.
    pub fn status_counts(&self) -> HashMap<RecordState, u64> {
        self.status_count.read().clone()
    }

    /// Number of records currently carrying an error.
    pub fn count_errors(&self) -> u64 {
        *self.error_count.read()
    }

    /// Whether any record currently carries an error.
    pub fn has_errors(&self) -> bool {
        self.count_errors() > 0
    }

    /// Whether closing the session now would lose data: true while any
    /// record is past `Up` but not yet `Done`.
    pub fn has_data(&self) -> bool {
        self.records.read().values().any(Record::has_data)
    }

    /// Checkbox value for a word (whether it is included).
    pub fn checkbox(&self, word: &str) -> Option<bool> {
        self.checkboxes.read().get(word).copied()
    }

    /// Set the checkbox value for a word.
    pub fn set_checkbox(&self, word: &str, checked: bool) {
        if let Some(value) = self.checkboxes.write().get_mut(word) {
            *value = checked;
        }
    }

    /// The word after `current` in presentation order.
    pub fn next_word(&self, current: &str) -> Option<String> {
        let words = self.words.read();
        let index = words.iter().position(|w| w == current)?;
        words.get(index + 1).cloned()
    }

    /// The word before `current` in presentation order.
    pub fn previous_word(&self, current: &str) -> Option<String> {
        let words = self.words.read();
        let index = words.iter().position(|w| w == current)?;
        index.checked_sub(1).and_then(|i| words.get(i).cloned())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_known(&self, word: &str) -> Result<()> {
        if self.records.read().contains_key(word) {
            Ok(())
        } else {
            Err(Error::not_found(word))
        }
    }

    /// Run `f` against one record, then account for whatever transition it
    /// performed: adjust the state counters and broadcast the change.
    fn with_record<T>(&self, word: &str, f: impl FnOnce(&mut Record) -> Result<T>) -> Result<T> {
        let (old, new, out) = {
            let mut records = self.records.write();
            let rec = records
                .get_mut(word)
                .ok_or_else(|| Error::not_found(word))?;
            let old = rec.state();
            let out = f(rec);
            (old, rec.state(), out)
        };

        if old != new {
            {
                let mut counts = self.status_count.write();
                if let Some(count) = counts.get_mut(&old) {
                    *count -= 1;
                }
                *counts.entry(new).or_insert(0) += 1;
            }
            debug!(word = %word, from = ?old, to = ?new, "record state changed");
            self.broadcast(StoreEvent::state_changed(word, new, old));
        }
        out
    }

    /// Set or clear the error recorded for a word, keeping the error
    /// counter in sync with the error map. Errors are only ever charged
    /// against records that still exist.
    fn set_error_value(&self, word: &str, error: Option<String>) {
        {
            let records = self.records.read();
            if !records.contains_key(word) {
                debug!(word = %word, "dropping error value for a removed record");
                return;
            }
            let mut errors = self.errors.write();
            let prev = errors.insert(word.to_string(), error.clone());
            let mut count = self.error_count.write();
            if matches!(prev, Some(Some(_))) {
                *count -= 1;
            }
            if error.is_some() {
                *count += 1;
            }
        }
        self.broadcast(StoreEvent::record_error(word, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::client::{MetadataPayload, PublishedFile, RemoteClient};
    use crate::record::MediaKind;
    use crate::session::Gender;

    /// Stub client: every operation succeeds with a canned value.
    struct StubClient;

    #[async_trait]
    impl RemoteClient for StubClient {
        async fn upload_temporary(&self, _blob: Bytes, _name_hint: &str) -> Result<String> {
            Ok("key1".into())
        }

        async fn publish_permanent(
            &self,
            _storage_key: &str,
            name: &str,
            _description: &str,
        ) -> Result<PublishedFile> {
            Ok(PublishedFile {
                title: name.to_string(),
                url: format!("https://files.example/{name}"),
                timestamp: Utc::now(),
            })
        }

        async fn create_metadata_item(&self, _payload: &MetadataPayload) -> Result<String> {
            Ok("Q100".into())
        }
    }

    fn metadata() -> SessionMetadata {
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

    fn store() -> Arc<RecordStore> {
        let queue = Arc::new(RequestQueue::new(Arc::new(StubClient)));
        RecordStore::new(metadata(), queue)
    }

    /// The counter invariant: per-state counts sum to the record count.
    fn assert_counters_consistent(store: &RecordStore) {
        let total: u64 = store.status_counts().values().sum();
        assert_eq!(total, store.records.read().len() as u64);
        for state in RecordState::ALL {
            let scanned = store
                .records
                .read()
                .values()
                .filter(|r| r.state() == state)
                .count() as u64;
            assert_eq!(store.count_status(&[state]), scanned, "count for {state:?}");
        }
    }

    #[tokio::test]
    async fn add_words_trims_dedupes_and_skips_empty() {
        let store = store();
        let added = store.add_words(["hello", "  hello  ", "\tworld\t", "", "   "]);

        assert_eq!(added, 2);
        assert_eq!(store.words(), vec!["hello", "world"]);
        assert_eq!(store.count_status(&[RecordState::Up]), 2);
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn add_words_keeps_extra_statements() {
        let store = store();
        let entry = WordEntry::with_extra(
            "bass (fish)",
            HashMap::from([("P99".to_string(), "noun".to_string())]),
        );
        assert_eq!(store.add_words([entry]), 1);

        let rec = store.get_record("bass (fish)").unwrap();
        assert_eq!(rec.transcription(), "bass");
        assert_eq!(rec.qualifier(), Some("fish"));
        assert_eq!(rec.extra()["P99"], "noun");

        // Re-adding a known word refreshes its extra statements only.
        let update = WordEntry::with_extra(
            "bass (fish)",
            HashMap::from([("P99".to_string(), "name".to_string())]),
        );
        assert_eq!(store.add_words([update]), 0);
        let rec = store.get_record("bass (fish)").unwrap();
        assert_eq!(rec.extra()["P99"], "name");
    }

    #[tokio::test]
    async fn stash_scenario_reaches_stashed_with_counters() {
        let store = store();
        store.add_words(["hello"]);

        store
            .do_stash("hello", Some(Bytes::from_static(b"pcm")))
            .await
            .unwrap();

        let rec = store.get_record("hello").unwrap();
        assert_eq!(rec.state(), RecordState::Stashed);
        assert_eq!(rec.file_key(), Some("key1"));
        assert_eq!(store.count_status(&[RecordState::Stashed]), 1);
        assert_eq!(store.count_errors(), 0);
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn full_pipeline_reaches_done() {
        let store = store();
        store.add_words(["hello"]);

        store
            .do_stash("hello", Some(Bytes::from_static(b"pcm")))
            .await
            .unwrap();
        store.do_publish("hello").await.unwrap();

        let rec = store.get_record("hello").unwrap();
        assert_eq!(rec.state(), RecordState::Done);
        assert_eq!(rec.metadata_item(), Some("Q100"));
        assert!(!store.has_data());
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn stash_without_media_is_a_validation_error() {
        let store = store();
        store.add_words(["hello"]);

        let outcome = store.do_stash("hello", None).await;
        assert!(matches!(outcome, Err(Error::Validation(_))));
        assert_eq!(store.state_of("hello"), Some(RecordState::Up));
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn operations_on_unknown_words_are_rejected() {
        let store = store();
        assert!(matches!(
            store.do_stash("ghost", None).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.do_publish("ghost").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.do_finalize("ghost").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reset_record_is_idempotent() {
        let store = store();
        store.add_words(["hello"]);
        store
            .do_stash("hello", Some(Bytes::from_static(b"pcm")))
            .await
            .unwrap();

        store.reset_record("hello").unwrap();
        assert_eq!(store.state_of("hello"), Some(RecordState::Up));
        assert_counters_consistent(&store);

        store.reset_record("hello").unwrap();
        assert_eq!(store.state_of("hello"), Some(RecordState::Up));
        let rec = store.get_record("hello").unwrap();
        assert!(rec.blob().is_none());
        assert!(rec.file_key().is_none());
        assert!(!rec.has_failed());
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn failure_settling_after_removal_leaves_no_ghost_error() {
        let store = store();
        store.add_words(["hello"]);

        // The record vanishes while its failed operation is still settling.
        assert!(store.clear_record("hello"));
        let outcome = store.settle_failure("hello", RecordState::Ready, Error::remote("network"));

        assert!(matches!(outcome, Err(Error::Remote { .. })));
        assert_eq!(store.count_errors(), 0);
        assert!(store.errors.read().is_empty());
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn clear_record_keeps_counters_consistent() {
        let store = store();
        store.add_words(["hello", "world"]);
        store
            .do_stash("hello", Some(Bytes::from_static(b"pcm")))
            .await
            .unwrap();

        assert!(store.clear_record("hello"));
        assert!(!store.clear_record("hello"));
        assert_eq!(store.words(), vec!["world"]);
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn clear_all_published_removes_done_and_resets_the_rest() {
        let store = store();
        store.add_words(["done-word", "pending-word"]);

        store
            .do_stash("done-word", Some(Bytes::from_static(b"a")))
            .await
            .unwrap();
        store.do_publish("done-word").await.unwrap();
        store
            .do_stash("pending-word", Some(Bytes::from_static(b"b")))
            .await
            .unwrap();

        store.clear_all_published_records();

        assert_eq!(store.words(), vec!["pending-word"]);
        assert_eq!(store.state_of("pending-word"), Some(RecordState::Up));
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn randomise_list_keeps_contents_and_state() {
        let store = store();
        let words: Vec<String> = (0..20).map(|i| format!("word{i}")).collect();
        store.add_words(words.clone());

        store.randomise_list();

        let mut shuffled = store.words();
        assert_eq!(shuffled.len(), words.len());
        shuffled.sort();
        let mut original = words.clone();
        original.sort();
        assert_eq!(shuffled, original);
        assert_eq!(store.count_status(&[RecordState::Up]), 20);
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn context_change_clears_all_records() {
        let store = store();
        store.add_words(["hello", "world"]);

        let mut locutor = store.session_metadata().locutor;
        locutor.name = "Sam".into();
        store.set_locutor(locutor);

        assert!(store.words().is_empty());
        assert_eq!(store.count_status(&RecordState::ALL), 0);
        assert_eq!(store.session_metadata().locutor.name, "Sam");
        assert_counters_consistent(&store);
    }

    #[tokio::test]
    async fn next_and_previous_follow_presentation_order() {
        let store = store();
        store.add_words(["a", "b", "c"]);

        assert_eq!(store.next_word("a").as_deref(), Some("b"));
        assert_eq!(store.next_word("c"), None);
        assert_eq!(store.previous_word("b").as_deref(), Some("a"));
        assert_eq!(store.previous_word("a"), None);
        assert_eq!(store.next_word("ghost"), None);
    }

    #[tokio::test]
    async fn checkboxes_default_to_ticked() {
        let store = store();
        store.add_words(["hello"]);

        assert_eq!(store.checkbox("hello"), Some(true));
        store.set_checkbox("hello", false);
        assert_eq!(store.checkbox("hello"), Some(false));
        store.reset_record("hello").unwrap();
        assert_eq!(store.checkbox("hello"), Some(true));
    }
}
