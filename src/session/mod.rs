//! Shared session context applied to every record created under it.
//!
//! The context names the target language, the speaking [`Locutor`], the
//! license and the media kind for the whole batch. Changing it invalidates
//! existing records, so the store clears them on every context switch.

pub mod persist;

use serde::{Deserialize, Serialize};

use crate::record::MediaKind;

/// Target language of a recording session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Short language code (e.g. "fr").
    pub code: String,
    /// Display label.
    pub label: String,
    /// Identifier of the language on the remote metadata repository.
    pub ext_id: String,
    /// ISO 639-3 code, when one exists.
    pub iso3: Option<String>,
}

/// Gender of the locutor, as recorded in the metadata repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unspecified,
}

impl Gender {
    /// Lowercase label used in rendered descriptions.
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unspecified => "",
        }
    }
}

/// The speaker profile attached to every record created in a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Locutor {
    /// Display name of the locutor.
    pub name: String,
    /// Identifier of the locutor on the remote metadata repository, when
    /// the profile already exists there.
    pub ext_id: Option<String>,
    pub gender: Gender,
    /// Free-form location description.
    pub location: String,
    /// Language codes the locutor speaks.
    pub languages: Vec<String>,
    /// Whether this is the operating user's main profile.
    pub main: bool,
    /// Whether the profile has not been registered remotely yet.
    pub is_new: bool,
}

/// The full shared context of a recording session.
///
/// Serializes to a small JSON document so a caller can persist it between
/// sessions (see [`persist`]); where it is stored is the caller's choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub language: Language,
    pub locutor: Locutor,
    /// License template identifier applied to every published file.
    pub license: String,
    /// Container format captured for every record in this session.
    pub media: MediaKind,
    /// Operating account name, when it differs from the locutor.
    pub author: Option<String>,
}

impl SessionMetadata {
    /// Name of the acting author: the operating account when set, otherwise
    /// the locutor.
    pub fn author_name(&self) -> &str {
        self.author.as_deref().unwrap_or(&self.locutor.name)
    }
}
