//! Per-record lifecycle state machine.
//!
//! A [`Record`] tracks one work item's journey from freshly added word to
//! fully published recording. Records are created and driven by the
//! [`RecordStore`](crate::store::RecordStore); the store is also the place
//! where state transitions are counted and broadcast, so all transition
//! methods here are crate-private.

mod naming;

pub use naming::{description, filename, metadata_payload, sanitize_title};

use std::collections::HashMap;
use std::sync::LazyLock;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::PublishedFile;
use crate::error::{Error, Result};

/// Pattern splitting a word into its transcription and optional qualifier,
/// e.g. `"bass (fish)"` → `("bass", "fish")`.
static QUALIFIED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) \((.+)\)$").expect("static pattern compiles"));

/// Lifecycle state of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// Just created, no media captured yet.
    Up,
    /// A media blob is attached and ready to stash.
    Ready,
    /// Temporary-storage upload in flight.
    Stashing,
    /// Held in the temporary stash.
    Stashed,
    /// Permanent publish in flight.
    Uploading,
    /// Permanently published.
    Uploaded,
    /// Metadata item creation in flight.
    Finalizing,
    /// Fully published and described.
    Done,
    /// The last remote operation failed.
    Error,
}

impl RecordState {
    /// Every state, in pipeline order.
    pub const ALL: [RecordState; 9] = [
        RecordState::Up,
        RecordState::Ready,
        RecordState::Stashing,
        RecordState::Stashed,
        RecordState::Uploading,
        RecordState::Uploaded,
        RecordState::Finalizing,
        RecordState::Done,
        RecordState::Error,
    ];
}

/// Container format of the captured media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// WAVE-encoded audio.
    Audio,
    /// WebM-encoded video.
    Video,
}

impl MediaKind {
    /// File extension for this container format.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Audio => "wav",
            MediaKind::Video => "webm",
        }
    }
}

/// One work item: a word, its captured media and its progress through the
/// publishing pipeline.
#[derive(Debug, Clone)]
pub struct Record {
    word: String,
    transcription: String,
    qualifier: Option<String>,
    state: RecordState,
    media: MediaKind,
    blob: Option<Bytes>,
    file_key: Option<String>,
    published: Option<PublishedFile>,
    metadata_item: Option<String>,
    error: Option<String>,
    extra: HashMap<String, String>,
    created_at: DateTime<Utc>,
    cancel: CancellationToken,
}

impl Record {
    /// Create a record for `word` in the `Up` state.
    ///
    /// Records are normally created through
    /// [`RecordStore::add_words`](crate::store::RecordStore::add_words).
    pub fn new(word: impl Into<String>, media: MediaKind) -> Self {
        let word = word.into();
        let (transcription, qualifier) = match QUALIFIED_WORD.captures(&word) {
            Some(caps) => (caps[1].to_string(), Some(caps[2].to_string())),
            None => (word.clone(), None),
        };

        Self {
            word,
            transcription,
            qualifier,
            state: RecordState::Up,
            media,
            blob: None,
            file_key: None,
            published: None,
            metadata_item: None,
            error: None,
            extra: HashMap::new(),
            created_at: Utc::now(),
            cancel: CancellationToken::new(),
        }
    }

    /// Full textual identifier of the record.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Textual transcription (the word without its qualifier).
    pub fn transcription(&self) -> &str {
        &self.transcription
    }

    /// Qualifier of the word, if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Captured media blob, present only while re-recording is still legal.
    pub fn blob(&self) -> Option<&Bytes> {
        self.blob.as_ref()
    }

    /// Container format of the captured media.
    pub fn media(&self) -> MediaKind {
        self.media
    }

    /// Temporary-storage key, set once stashed.
    pub fn file_key(&self) -> Option<&str> {
        self.file_key.as_deref()
    }

    /// Permanent-storage descriptor, set once uploaded.
    pub fn published(&self) -> Option<&PublishedFile> {
        self.published.as_ref()
    }

    /// Metadata item identifier, set once done.
    pub fn metadata_item(&self) -> Option<&str> {
        self.metadata_item.as_deref()
    }

    /// Error recorded against the last failed operation, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Extra metadata statements supplied by the caller.
    pub fn extra(&self) -> &HashMap<String, String> {
        &self.extra
    }

    /// When the record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the record holds data that would be lost by closing the
    /// session: false only in `Up` and `Done`.
    pub fn has_data(&self) -> bool {
        !matches!(self.state, RecordState::Up | RecordState::Done)
    }

    /// Whether the last operation on this record failed.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the captured media is a video.
    pub fn is_video(&self) -> bool {
        self.media == MediaKind::Video
    }

    /// Replace the extra metadata statements.
    pub(crate) fn set_extra(&mut self, extra: HashMap<String, String>) {
        self.extra = extra;
    }

    /// Attach a captured media blob, moving to `Ready`.
    ///
    /// Re-recording is only legal before the permanent upload; any stash in
    /// flight is cancelled and its key discarded. Returns false when the
    /// record is past the point of re-recording.
    pub(crate) fn set_blob(&mut self, blob: Bytes, media: MediaKind) -> bool {
        if !matches!(
            self.state,
            RecordState::Up | RecordState::Ready | RecordState::Stashing | RecordState::Stashed
        ) {
            return false;
        }

        if self.state == RecordState::Stashing {
            self.cancel.cancel();
        }
        self.state = RecordState::Ready;
        self.media = media;
        self.blob = Some(blob);
        self.file_key = None;
        self.error = None;
        true
    }

    /// Begin the temporary-storage upload, returning a fresh cancellation
    /// handle for it.
    pub(crate) fn begin_stash(&mut self) -> Result<CancellationToken> {
        self.begin(
            &[RecordState::Ready, RecordState::Error],
            RecordState::Stashing,
        )
    }

    /// Begin the permanent publish.
    pub(crate) fn begin_publish(&mut self) -> Result<CancellationToken> {
        self.begin(
            &[RecordState::Stashed, RecordState::Error],
            RecordState::Uploading,
        )
    }

    /// Begin the metadata finalize.
    pub(crate) fn begin_finalize(&mut self) -> Result<CancellationToken> {
        self.begin(
            &[RecordState::Uploaded, RecordState::Error],
            RecordState::Finalizing,
        )
    }

    fn begin(&mut self, from: &[RecordState], to: RecordState) -> Result<CancellationToken> {
        if !from.contains(&self.state) {
            return Err(Error::validation(format!(
                "cannot move record '{}' from {:?} to {:?}",
                self.word, self.state, to
            )));
        }
        self.state = to;
        self.cancel = CancellationToken::new();
        Ok(self.cancel.clone())
    }

    /// Record the stash key returned by the remote service; the local blob
    /// is no longer needed.
    pub(crate) fn mark_stashed(&mut self, file_key: String) -> Result<()> {
        if self.state != RecordState::Stashing {
            return Err(Error::validation(format!(
                "record '{}' is not stashing",
                self.word
            )));
        }
        self.file_key = Some(file_key);
        self.blob = None;
        self.state = RecordState::Stashed;
        Ok(())
    }

    /// Record the permanent-storage descriptor; the stash key is spent.
    pub(crate) fn mark_uploaded(&mut self, file: PublishedFile) -> Result<()> {
        if self.state != RecordState::Uploading {
            return Err(Error::validation(format!(
                "record '{}' is not uploading",
                self.word
            )));
        }
        self.published = Some(file);
        self.file_key = None;
        self.state = RecordState::Uploaded;
        Ok(())
    }

    /// Record the metadata item id and finish the pipeline.
    pub(crate) fn mark_done(&mut self, item_id: String) -> Result<()> {
        if self.state != RecordState::Finalizing {
            return Err(Error::validation(format!(
                "record '{}' is not finalizing",
                self.word
            )));
        }
        self.metadata_item = Some(item_id);
        self.state = RecordState::Done;
        Ok(())
    }

    /// Switch to the error state, keeping everything else in place.
    pub(crate) fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.state = RecordState::Error;
    }

    /// Restore the state that preceded a failed attempt. The restore target
    /// is chosen per operation by the store; the error text stays recorded.
    pub(crate) fn restore(&mut self, state: RecordState) {
        self.state = state;
    }

    /// Cancel whatever operation is pending on this record, if any. The
    /// operation observes a cancellation signal, not a failure.
    pub(crate) fn cancel_pending(&self) {
        self.cancel.cancel();
    }

    /// Reset to `Up`: media, keys, descriptor, item id and error are all
    /// cleared and any pending operation is cancelled. Idempotent.
    pub(crate) fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.blob = None;
        self.file_key = None;
        self.published = None;
        self.metadata_item = None;
        self.error = None;
        self.state = RecordState::Up;
    }
}
