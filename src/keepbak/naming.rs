//! # Artifact Naming Protocol
//!
//! Every backup is named `{YYYY_MM_DD}_{base_name}.bkp`. The same format is used to
//! write an artifact and to recognize it later, so encoding and decoding live side by
//! side here and are tested against each other.
//!
//! The base name is matched literally: `notes+draft.txt` only ever matches itself,
//! never `notesdraft.txt`. Matching is anchored and case-sensitive, and the date must
//! be a real calendar date (`2024_13_01` or `2024_02_30` are not backups).

use crate::error::{KeepbakError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;

pub const DATE_FORMAT: &str = "%Y_%m_%d";
pub const ARTIFACT_SUFFIX: &str = ".bkp";

pub fn encode_artifact_name(date: NaiveDate, base_name: &str) -> String {
    format!("{}_{}{}", date.format(DATE_FORMAT), base_name, ARTIFACT_SUFFIX)
}

/// Returns the embedded date when `name` is a backup of `base_name`.
pub fn decode_artifact_name(name: &str, base_name: &str) -> Option<NaiveDate> {
    ArtifactMatcher::new(base_name).ok()?.decode(name)
}

/// A compiled matcher for the artifacts of a single source.
#[derive(Debug, Clone)]
pub struct ArtifactMatcher {
    base_name: String,
    pattern: Regex,
}

impl ArtifactMatcher {
    pub fn new(base_name: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"^(?P<date>[0-9]{{4}}_[0-9]{{2}}_[0-9]{{2}})_{}{}$",
            regex::escape(base_name),
            regex::escape(ARTIFACT_SUFFIX)
        ))?;
        Ok(Self {
            base_name: base_name.to_string(),
            pattern,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn decode(&self, name: &str) -> Option<NaiveDate> {
        let caps = self.pattern.captures(name)?;
        NaiveDate::parse_from_str(&caps["date"], DATE_FORMAT).ok()
    }

    pub fn encode(&self, date: NaiveDate) -> String {
        encode_artifact_name(date, &self.base_name)
    }
}

/// The base name a source contributes to its artifact names.
///
/// `resolved` is consulted only when `src` has no final component of its own
/// (`.`, `..`, `dir/..`); it should be the canonical form of `src`.
pub fn source_base_name(src: &Path, resolved: Option<&Path>) -> Result<String> {
    let name = src
        .file_name()
        .or_else(|| resolved.and_then(Path::file_name))
        .ok_or_else(|| {
            KeepbakError::Validation(format!(
                "src path has no base name: {}",
                src.display()
            ))
        })?;

    name.to_str().map(str::to_string).ok_or_else(|| {
        KeepbakError::Validation(format!(
            "src base name is not valid UTF-8: {}",
            src.display()
        ))
    })
}
