//! Vocalpress - staged publishing pipeline for batch-recorded pronunciations
//!
//! Every word of a session is tracked by a [`record::Record`] state machine
//! moving through temporary storage, permanent storage and metadata
//! finalization. Remote calls are serialized by a single
//! [`queue::RequestQueue`] against the shared [`client::RemoteClient`], and
//! the [`store::RecordStore`] owns the collection, keeps aggregate counters
//! consistent and orchestrates the pipeline.

pub mod client;
pub mod error;
pub mod queue;
pub mod record;
pub mod session;
pub mod store;
