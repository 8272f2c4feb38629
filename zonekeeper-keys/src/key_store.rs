//! Key enumeration and successor creation for a zone's key directory
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
use crate::key_record::KeyRecord;
use crate::key_types::KeySchedule;
use crate::tooling::{SystemToolRunner, ToolRunner};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zonekeeper_config::KeyDirConfig;

const DEFAULT_KEYGEN_BIN: &str = "dnssec-keygen";
const DEFAULT_SETTIME_BIN: &str = "dnssec-settime";

/// Handle over one directory of key files
///
/// Holds no state beyond the directory, the tool binary names, a verbosity
/// flag, and the injected tool runner; every query re-reads the
/// filesystem. Concurrent processes racing on the same directory are not
/// serialized here.
pub struct KeyStore {
    dir: PathBuf,
    keygen_bin: String,
    settime_bin: String,
    echo: bool,
    runner: Arc<dyn ToolRunner>,
}

impl KeyStore {
    /// Store over `dir` using the stock BIND tools
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_runner(dir, Arc::new(SystemToolRunner))
    }

    /// Store with a custom tool runner
    pub fn with_runner<P: AsRef<Path>>(dir: P, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            keygen_bin: DEFAULT_KEYGEN_BIN.to_string(),
            settime_bin: DEFAULT_SETTIME_BIN.to_string(),
            echo: true,
            runner,
        }
    }

    /// Store wired from loaded configuration
    pub fn from_config(cfg: &KeyDirConfig) -> Self {
        let mut store = Self::new(&cfg.key_dir);
        store.keygen_bin = cfg.keygen_bin.clone();
        store.settime_bin = cfg.settime_bin.clone();
        store
    }

    /// Echo each external invocation at info level before it runs
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// The bound key directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn call(&self, program: &str, args: &[String]) -> KeyResult<Vec<String>> {
        if self.echo {
            info!(program, ?args, dir = %self.dir.display(), "executing");
        }
        self.runner.run(&self.dir, program, args)
    }

    /// Enumerate valid key pairs for `zone`, sorted by zone, role,
    /// algorithm, and key tag
    ///
    /// With `recursive`, keys of any subdomain of `zone` are included as
    /// well. A `.key` file without its `.private` partner is skipped with
    /// a warning; any parse or identity failure aborts the whole listing.
    /// Duplicate identities (possible through non-canonical zero padding
    /// in file names) are reported, not deduplicated.
    pub fn list_keys(&self, zone: &str, recursive: bool) -> KeyResult<Vec<KeyRecord>> {
        let zone = zone.trim_start_matches('.');
        let subdomain_suffix = format!(".{zone}");
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("key") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(rest) = stem.strip_prefix('K') else {
                continue;
            };
            let Some((zone_field, _)) = rest.split_once('+') else {
                continue;
            };
            if zone_field != zone && !(recursive && zone_field.ends_with(&subdomain_suffix)) {
                continue;
            }
            if !path.with_extension("private").exists() {
                warn!(
                    file = %path.display(),
                    "key file exists, but corresponding .private does not"
                );
                continue;
            }
            records.push(KeyRecord::from_record_file(&path)?);
        }

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.base_name()) {
                warn!(key = %record, "duplicate key identity in listing");
            }
        }

        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        debug!(zone, recursive, count = records.len(), "listed keys");
        Ok(records)
    }

    /// Rewrite a key's timing metadata through the external tool
    ///
    /// Only flags for timestamps present in `schedule` are passed; an
    /// empty schedule skips the invocation entirely. The in-memory record
    /// is not updated; re-read it to observe the change.
    pub fn set_key_times(&self, record: &KeyRecord, schedule: &KeySchedule) -> KeyResult<()> {
        let mut args = schedule.settime_args();
        if args.is_empty() {
            debug!(key = %record, "no timestamps supplied, skipping settime");
            return Ok(());
        }
        args.push(record.base_name());
        self.call(&self.settime_bin, &args)?;
        Ok(())
    }

    /// Generate the successor of `template` and apply `schedule` to it
    ///
    /// The generation tool cannot combine a successor relationship with
    /// custom timestamps in one call, so the key is generated with a zero
    /// prediction interval and the schedule is written in a second step.
    /// If that second step fails, the new key material is left on disk.
    pub fn create_successor(
        &self,
        template: &KeyRecord,
        schedule: &KeySchedule,
    ) -> KeyResult<PendingSuccessor> {
        let args = vec![
            "-S".to_string(),
            template.base_name(),
            "-i".to_string(),
            "0".to_string(),
        ];
        let output = self.call(&self.keygen_bin, &args)?;
        let base = output
            .last()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| {
                KeyError::ToolOutput(format!("{} produced no key name", self.keygen_bin))
            })?;
        let record = KeyRecord::from_record_file(&self.dir.join(format!("{base}.key")))?;
        info!(template = %template, successor = %record, "generated successor key");
        self.set_key_times(&record, schedule)?;
        Ok(PendingSuccessor {
            as_generated: record,
        })
    }

    /// Re-read a record from disk
    pub fn reload(&self, record: &KeyRecord) -> KeyResult<KeyRecord> {
        KeyRecord::from_record_file(&record.record_path)
    }
}

/// Successor key whose rollover schedule has been written to disk
///
/// The embedded record was parsed before the schedule rewrite and does not
/// reflect it; [`PendingSuccessor::finalize`] re-reads the file to obtain
/// the authoritative post-write state.
#[derive(Debug)]
pub struct PendingSuccessor {
    /// Record as parsed immediately after generation
    pub as_generated: KeyRecord,
}

impl PendingSuccessor {
    /// Authoritative post-schedule record, re-read from disk
    pub fn finalize(&self, store: &KeyStore) -> KeyResult<KeyRecord> {
        store.reload(&self.as_generated)
    }
}
