//! DNSSEC key lifecycle management for Zonekeeper
//!
//! Discovers key material on disk, derives each key's lifecycle state from
//! the timestamps embedded in its record file, and drives successor-key
//! creation through the external BIND utilities. Cryptographic operations
//! and timestamp persistence stay with those tools; this crate owns the
//! key-state model and the rollover scheduling around them.
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


pub mod error;
pub mod key_record;
pub mod key_store;
pub mod key_types;
pub mod tooling;

pub use error::{KeyError, KeyResult};
pub use key_record::KeyRecord;
pub use key_store::{KeyStore, PendingSuccessor};
pub use key_types::{
    format_timestamp, parse_timestamp, FileOwnership, KeyIdentity, KeySchedule, KeyState, KeyType,
    NextTransition,
};
pub use tooling::{SystemToolRunner, ToolRunner};
