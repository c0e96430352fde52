//! Store-level events broadcast to any presentation layer.

use serde::{Deserialize, Serialize};

use crate::record::RecordState;

/// Observable change on a record owned by the store.
///
/// Every state transition and every change of a record's error value is
/// broadcast, so observers can keep derived views current without polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A record moved to a new lifecycle state.
    StateChanged {
        word: String,
        new_state: RecordState,
        old_state: RecordState,
    },
    /// A record's error value changed; `None` clears it.
    RecordError {
        word: String,
        error: Option<String>,
    },
}

impl StoreEvent {
    /// Create a StateChanged event.
    pub fn state_changed(
        word: impl Into<String>,
        new_state: RecordState,
        old_state: RecordState,
    ) -> Self {
        StoreEvent::StateChanged {
            word: word.into(),
            new_state,
            old_state,
        }
    }

    /// Create a RecordError event.
    pub fn record_error(word: impl Into<String>, error: Option<String>) -> Self {
        StoreEvent::RecordError {
            word: word.into(),
            error,
        }
    }
}
