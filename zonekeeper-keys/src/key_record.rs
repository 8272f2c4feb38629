//! Parsed key file records and lifecycle state queries
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::error::{KeyError, KeyResult};
use crate::key_types::{
    parse_timestamp, FileOwnership, KeyIdentity, KeyState, KeyType, NextTransition,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One on-disk key pair, parsed from its public record file
///
/// A logical key is backed by two files: the public record (`.key`) and the
/// private material (`.private`). Records are immutable in memory; schedule
/// changes go through the external time-setting tool and require a re-read
/// to observe.
#[derive(Debug, Clone, Serialize)]
pub struct KeyRecord {
    /// Identity parsed from the file name
    pub identity: KeyIdentity,
    /// Key role from the descriptive comment, when present
    pub key_type: Option<KeyType>,
    pub created: Option<DateTime<Utc>>,
    pub published: Option<DateTime<Utc>>,
    pub activated: Option<DateTime<Utc>>,
    pub inactivated: Option<DateTime<Utc>>,
    pub deleted: Option<DateTime<Utc>>,
    /// Filesystem metadata, informational only
    pub ownership: Option<FileOwnership>,
    /// Public record file
    pub record_path: PathBuf,
    /// Private key material file, derived by convention
    pub private_path: PathBuf,
    dnskey_rdata: String,
}

impl KeyRecord {
    /// Read and parse the public record file at `path`
    ///
    /// The paired `.private` path is derived by convention; whether it
    /// exists is the caller's concern.
    pub fn from_record_file(path: &Path) -> KeyResult<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| KeyError::MalformedName(path.display().to_string()))?;
        let identity = KeyIdentity::from_stem(stem)?;
        let text = fs::read_to_string(path)?;
        let mut record = Self::parse(identity, &text, path)?;
        record.ownership = FileOwnership::probe(path);
        Ok(record)
    }

    /// Parse record file text into a record
    ///
    /// Pure apart from the paths stored for later reference, so it can be
    /// exercised without real files.
    pub fn parse(identity: KeyIdentity, text: &str, record_path: &Path) -> KeyResult<Self> {
        let mut record = KeyRecord {
            private_path: record_path.with_extension("private"),
            record_path: record_path.to_path_buf(),
            identity,
            key_type: None,
            created: None,
            published: None,
            activated: None,
            inactivated: None,
            deleted: None,
            ownership: None,
            dnskey_rdata: String::new(),
        };
        let mut rdata = Vec::new();
        for line in text.lines() {
            if line.starts_with(';') {
                record.apply_comment(line)?;
            } else if let Some((_, payload)) = line.split_once("DNSKEY") {
                rdata.push(payload.trim());
            }
        }
        record.dnskey_rdata = rdata.join("\n");
        Ok(record)
    }

    fn apply_comment(&mut self, line: &str) -> KeyResult<()> {
        if line.contains("Created:") {
            self.created = Some(date_token(line)?);
        } else if line.contains("Publish:") {
            self.published = Some(date_token(line)?);
        } else if line.contains("Activate:") {
            self.activated = Some(date_token(line)?);
        } else if line.contains("Inactive:") {
            self.inactivated = Some(date_token(line)?);
        } else if line.contains("Delete:") {
            self.deleted = Some(date_token(line)?);
        } else if line.contains("This is a ") && line.contains("keyid") && line.contains("for") {
            self.apply_descriptive_comment(line)?;
        }
        Ok(())
    }

    /// Descriptive line, e.g.
    /// `; This is a zone-signing key, keyid 24848, for example.com.`
    ///
    /// Carries the key purpose and repeats the identity; a repeat that
    /// disagrees with the file name is a hard failure.
    fn apply_descriptive_comment(&mut self, line: &str) -> KeyResult<()> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let purpose = words.get(4).copied().unwrap_or_default();
        self.key_type = Some(KeyType::from_purpose_word(purpose)?);

        let claimed_id = words
            .get(7)
            .and_then(|w| w.trim_end_matches(',').parse::<u16>().ok())
            .ok_or_else(|| KeyError::MalformedComment(line.trim().to_string()))?;
        if claimed_id != self.identity.key_id {
            return Err(KeyError::KeyIdMismatch {
                name: self.identity.to_string(),
                claimed: claimed_id,
                actual: self.identity.key_id,
            });
        }

        let claimed_zone = words.last().copied().unwrap_or_default();
        if claimed_zone != self.identity.zone {
            return Err(KeyError::ZoneMismatch {
                name: self.identity.to_string(),
                claimed: claimed_zone.to_string(),
                actual: self.identity.zone.clone(),
            });
        }
        Ok(())
    }

    /// Lifecycle state at `reference`
    ///
    /// Evaluated as a strict priority chain, most terminal stage first.
    pub fn state(&self, reference: DateTime<Utc>) -> KeyState {
        if self.deleted.is_some_and(|t| t <= reference) {
            return KeyState::Deleted;
        }
        if self.inactivated.is_some_and(|t| t <= reference) {
            return KeyState::Inactive;
        }
        if self.activated.is_some_and(|t| t <= reference) {
            return KeyState::Active;
        }
        if self.published.is_some_and(|t| t <= reference) {
            return KeyState::Published;
        }
        if self.created.is_some_and(|t| t > reference) {
            return KeyState::Future;
        }
        KeyState::Unscheduled
    }

    /// Earliest scheduled transition strictly after `reference`
    ///
    /// The set timestamps among publish/activate/inactivate/delete must be
    /// non-decreasing in that order; `created` is not part of the ordering.
    /// An out-of-order schedule is reported rather than raised, so callers
    /// can still inspect externally edited files.
    pub fn next_transition(&self, reference: DateTime<Utc>) -> NextTransition {
        let assigned: Vec<DateTime<Utc>> =
            [self.published, self.activated, self.inactivated, self.deleted]
                .into_iter()
                .flatten()
                .collect();
        if assigned.windows(2).any(|pair| pair[0] > pair[1]) {
            return NextTransition::InconsistentSchedule;
        }
        match assigned.into_iter().find(|t| *t > reference) {
            Some(t) => NextTransition::At(t),
            None => NextTransition::Exhausted,
        }
    }

    /// DNSKEY payload text embedded in the record file, in file order
    ///
    /// Empty when the file carries no DNSKEY lines.
    pub fn dnskey_rdata(&self) -> &str {
        &self.dnskey_rdata
    }

    /// File stem the external tools address this key by
    pub fn base_name(&self) -> String {
        self.identity.base_name()
    }

    /// Canonical presentation order: zone, role, algorithm, key tag
    ///
    /// Untyped records sort first, key-signing ahead of zone-signing.
    pub fn sort_key(&self) -> (&str, Option<KeyType>, u8, u16) {
        (
            self.identity.zone.as_str(),
            self.key_type,
            self.identity.algorithm,
            self.identity.key_id,
        )
    }
}

impl fmt::Display for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)
    }
}

/// Third whitespace token of a dated comment line,
/// e.g. `; Created: 20240101000000 (Mon Jan  1 00:00:00 2024)`
fn date_token(line: &str) -> KeyResult<DateTime<Utc>> {
    let token = line
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| KeyError::MalformedDate(line.trim().to_string()))?;
    parse_timestamp(token)
}
