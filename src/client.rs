//! Trait definition and types for the shared remote publishing client.
//!
//! This module defines the [`RemoteClient`] trait that the transport layer
//! must implement, along with the data types exchanged at that seam. The
//! exact wire shapes (authentication, payload encoding) belong to the
//! implementor; the pipeline only cares about the three staged operations.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A permanently published file, as described by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedFile {
    /// Canonical title of the file on the permanent store.
    pub title: String,
    /// Publicly addressable URL of the file.
    pub url: String,
    /// When the file was published.
    pub timestamp: DateTime<Utc>,
}

/// Structured metadata describing a published recording, submitted at
/// finalize time.
///
/// `statements` is a plain property → value mapping with no assumed schema;
/// it is validated (non-empty keys and values) at the finalize boundary
/// only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataPayload {
    /// Item label, keyed by language code.
    pub labels: HashMap<String, String>,
    /// Item description, keyed by language code.
    pub descriptions: HashMap<String, String>,
    /// Claim values keyed by property identifier.
    pub statements: HashMap<String, String>,
}

/// Async client for the shared, rate-sensitive remote service.
///
/// One instance is shared by every record in a session. The
/// [`RequestQueue`](crate::queue::RequestQueue) is the only pipeline
/// component allowed to invoke it, so calls never interleave remotely.
///
/// Implementations are expected to be wrapped in an `Arc` so they can be
/// shared across tasks.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Upload a media blob to temporary storage, returning its storage key.
    ///
    /// `name_hint` is the filename the blob will eventually be published
    /// under; services may use it to pick the stash slot.
    async fn upload_temporary(&self, blob: Bytes, name_hint: &str) -> Result<String>;

    /// Move a stashed file to permanent storage under `name`, with the
    /// given rendered description.
    async fn publish_permanent(
        &self,
        storage_key: &str,
        name: &str,
        description: &str,
    ) -> Result<PublishedFile>;

    /// Create a structured metadata item describing a published file,
    /// returning the new item's identifier.
    async fn create_metadata_item(&self, payload: &MetadataPayload) -> Result<String>;
}
