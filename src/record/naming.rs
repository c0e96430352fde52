//! Deterministic name, description and metadata generation for records.
//!
//! All functions here are pure: given the same record and session context
//! they produce the same output, with no side effects. Characters the
//! target storage system forbids in titles are replaced by a dash.

use std::collections::HashMap;

use crate::client::MetadataPayload;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::session::SessionMetadata;

/// Leading tag of every generated filename.
const FILENAME_PREFIX: &str = "Rec";

/// Characters the permanent store rejects in file titles.
const ILLEGAL_TITLE_CHARS: &[char] = &['#', '<', '>', '[', ']', '|', '{', '}', ':', '/', '\\'];

/// Replace every character illegal in a storage title with a dash.
pub fn sanitize_title(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_TITLE_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Filename for a record, of the form
/// `Rec-<language> (iso3)-<locutor> (<author>)-<word>.<ext>`.
///
/// The author parenthesis only appears when the operating account differs
/// from the locutor.
pub fn filename(record: &Record, meta: &SessionMetadata) -> String {
    let mut name = format!("{}-{}", FILENAME_PREFIX, meta.language.ext_id);
    if let Some(iso3) = &meta.language.iso3 {
        name.push_str(&format!(" ({iso3})"));
    }

    name.push('-');
    name.push_str(&meta.locutor.name);
    if let Some(author) = &meta.author {
        if author != &meta.locutor.name {
            name.push_str(&format!(" ({author})"));
        }
    }

    name.push('-');
    name.push_str(record.word());
    name.push('.');
    name.push_str(record.media().extension());

    sanitize_title(&name)
}

/// Rendered description published alongside the permanent file.
pub fn description(record: &Record, meta: &SessionMetadata) -> String {
    let date = record.created_at().format("%Y-%m-%d");

    format!(
        "== Description ==\n\
         {{{{Pronunciation record\n \
         | locutor       = {locutor}\n \
         | locutorId     = {locutor_id}\n \
         | locutorGender = {gender}\n \
         | author        = {author}\n \
         | languageId    = {language}\n \
         | transcription = {transcription}\n \
         | qualifier     = {qualifier}\n \
         | date          = {date}\n\
         }}}}\n\n\
         == License ==\n\
         {{{{{license}}}}}",
        locutor = meta.locutor.name,
        locutor_id = meta.locutor.ext_id.as_deref().unwrap_or(""),
        gender = meta.locutor.gender.label(),
        author = meta.author_name(),
        language = meta.language.ext_id,
        transcription = record.transcription(),
        qualifier = record.qualifier().unwrap_or(""),
        date = date,
        license = meta.license,
    )
}

/// Build the structured metadata item for a published record.
///
/// Caller-supplied extra statements are validated here and nowhere else:
/// empty property identifiers or values are rejected.
pub fn metadata_payload(record: &Record, meta: &SessionMetadata) -> Result<MetadataPayload> {
    let mut labels = HashMap::new();
    labels.insert("en".to_string(), record.word().to_string());

    let lang_tag = meta.language.iso3.as_deref().unwrap_or(&meta.language.ext_id);
    let mut descriptions = HashMap::new();
    descriptions.insert(
        "en".to_string(),
        format!(
            "audio record - {} - {} ({})",
            lang_tag,
            meta.locutor.name,
            meta.author_name()
        ),
    );

    let mut statements = HashMap::new();
    statements.insert("media-file".to_string(), filename(record, meta));
    statements.insert("language".to_string(), meta.language.ext_id.clone());
    statements.insert(
        "locutor".to_string(),
        meta.locutor
            .ext_id
            .clone()
            .unwrap_or_else(|| meta.locutor.name.clone()),
    );
    statements.insert(
        "transcription".to_string(),
        record.transcription().to_string(),
    );
    if let Some(qualifier) = record.qualifier() {
        statements.insert("qualifier".to_string(), qualifier.to_string());
    }
    statements.insert(
        "date".to_string(),
        format!("{}T00:00:00Z", record.created_at().format("%Y-%m-%d")),
    );
    statements.insert("license".to_string(), meta.license.clone());

    for (property, value) in record.extra() {
        if property.trim().is_empty() {
            return Err(Error::validation(format!(
                "empty extra property id on record '{}'",
                record.word()
            )));
        }
        if value.trim().is_empty() {
            return Err(Error::validation(format!(
                "empty value for extra property '{}' on record '{}'",
                property,
                record.word()
            )));
        }
        statements.insert(property.clone(), value.clone());
    }

    Ok(MetadataPayload {
        labels,
        descriptions,
        statements,
    })
}
