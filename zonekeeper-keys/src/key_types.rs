//! Key type definitions and rollover schedule primitives
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
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Timestamp layout used in key file comments and tool flags
const TIMESTAMP_LAYOUT: &str = "%Y%m%d%H%M%S";

/// Length of a serialized timestamp: "yyyymmddhhmmss"
const TIMESTAMP_LEN: usize = 14;

/// Parse a 14-character `YYYYMMDDHHMMSS` token as a UTC instant
pub fn parse_timestamp(token: &str) -> KeyResult<DateTime<Utc>> {
    if token.len() != TIMESTAMP_LEN {
        return Err(KeyError::MalformedDate(token.to_string()));
    }
    NaiveDateTime::parse_from_str(token, TIMESTAMP_LAYOUT)
        .map(|dt| dt.and_utc())
        .map_err(|_| KeyError::MalformedDate(token.to_string()))
}

/// Format a UTC instant in the 14-character layout the external tools accept
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_LAYOUT).to_string()
}

/// DNSSEC key role, parsed from the descriptive comment inside a key file
///
/// Ordering matches the presentation order of a zone's key set: key-signing
/// keys sort ahead of zone-signing keys, untyped records ahead of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    /// Key-signing key
    Ksk,
    /// Zone-signing key
    Zsk,
}

impl KeyType {
    /// Map the purpose word the generation tool writes into the comment
    pub(crate) fn from_purpose_word(word: &str) -> KeyResult<Self> {
        match word {
            "zone-signing" => Ok(KeyType::Zsk),
            "key-signing" => Ok(KeyType::Ksk),
            other => Err(KeyError::UnrecognizedType(other.to_string())),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyType::Ksk => "KSK",
            KeyType::Zsk => "ZSK",
        })
    }
}

/// Lifecycle state of a key at a given reference instant
///
/// A key can satisfy several "at or before" conditions at once; the derived
/// state is always the most advanced stage reached, not the earliest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyState {
    /// The delete time has passed
    Deleted,
    /// The inactivation time has passed
    Inactive,
    /// The activation time has passed
    Active,
    /// The publish time has passed
    Published,
    /// The creation time lies in the future
    Future,
    /// No timestamp applies at the reference instant
    Unscheduled,
}

impl KeyState {
    /// Short label used in listings
    pub fn label(&self) -> &'static str {
        match self {
            KeyState::Deleted => "DEL",
            KeyState::Inactive => "INAC",
            KeyState::Active => "ACT",
            KeyState::Published => "PUB",
            KeyState::Future => "FUT",
            KeyState::Unscheduled => "",
        }
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a next-transition query against a key's schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NextTransition {
    /// The schedule advances again at this instant
    At(DateTime<Utc>),
    /// Every scheduled transition lies at or before the reference
    Exhausted,
    /// The set timestamps are not in publish/activate/inactivate/delete order
    InconsistentSchedule,
}

/// Canonical identity of a key, as encoded in its file name
///
/// File names follow the `K<zone>+<algorithm>+<keyid>` convention. Parsing
/// is a pure string operation on the stem, independent of any filesystem
/// access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KeyIdentity {
    /// Zone the key belongs to, trailing dot included
    pub zone: String,
    /// DNSSEC signing algorithm number
    pub algorithm: u8,
    /// Key tag
    pub key_id: u16,
}

impl KeyIdentity {
    /// Parse a file stem of the form `K<zone>+<algorithm>+<keyid>`
    pub fn from_stem(stem: &str) -> KeyResult<Self> {
        let malformed = || KeyError::MalformedName(stem.to_string());
        let rest = stem.strip_prefix('K').ok_or_else(malformed)?;
        let mut fields = rest.split('+');
        let zone = fields.next().ok_or_else(malformed)?;
        let algorithm = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(malformed)?;
        let key_id = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(malformed)?;
        if zone.is_empty() || fields.next().is_some() {
            return Err(malformed());
        }
        Ok(Self {
            zone: zone.to_string(),
            algorithm,
            key_id,
        })
    }

    /// File stem this identity round-trips to
    pub fn base_name(&self) -> String {
        format!("K{}+{:03}+{:05}", self.zone, self.algorithm, self.key_id)
    }
}

impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:03}+{:05}", self.zone, self.algorithm, self.key_id)
    }
}

/// Filesystem ownership captured alongside a record
///
/// Informational only; never consulted by scheduling logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileOwnership {
    pub owner: u32,
    pub group: u32,
    pub mode: u32,
}

impl FileOwnership {
    /// Probe ownership of a path; `None` when the platform or the probe
    /// does not provide it
    pub fn probe(path: &Path) -> Option<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let meta = std::fs::metadata(path).ok()?;
            Some(Self {
                owner: meta.uid(),
                group: meta.gid(),
                mode: meta.mode(),
            })
        }
        #[cfg(not(unix))]
        {
            let _ = path;
            None
        }
    }
}

/// Rollover schedule to apply to a key
///
/// Each field is an optional point in time; unset fields leave the key's
/// corresponding timestamp untouched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchedule {
    pub publish: Option<DateTime<Utc>>,
    pub activate: Option<DateTime<Utc>>,
    pub inactivate: Option<DateTime<Utc>>,
    pub delete: Option<DateTime<Utc>>,
}

impl KeySchedule {
    /// True when no timestamp is set
    pub fn is_empty(&self) -> bool {
        self.publish.is_none()
            && self.activate.is_none()
            && self.inactivate.is_none()
            && self.delete.is_none()
    }

    /// Flag/value pairs for the external time-setting tool, covering only
    /// the timestamps actually set
    pub(crate) fn settime_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (flag, instant) in [
            ("-P", self.publish),
            ("-A", self.activate),
            ("-I", self.inactivate),
            ("-D", self.delete),
        ] {
            if let Some(instant) = instant {
                args.push(flag.to_string());
                args.push(format_timestamp(instant));
            }
        }
        args
    }
}
