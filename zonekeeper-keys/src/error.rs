//! Error types for DNSSEC key management
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


use thiserror::Error;

/// Key management errors
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("malformed key file name: '{0}' (expected K<zone>+<algorithm>+<keyid>)")]
    MalformedName(String),

    #[error("unexpected date format: '{0}'")]
    MalformedDate(String),

    #[error("malformed descriptive comment: '{0}'")]
    MalformedComment(String),

    #[error("{name} claims to be for keyid {claimed}, but its file name says {actual}")]
    KeyIdMismatch {
        name: String,
        claimed: u16,
        actual: u16,
    },

    #[error("{name} claims to be for zone {claimed}, but its file name says {actual}")]
    ZoneMismatch {
        name: String,
        claimed: String,
        actual: String,
    },

    #[error("unexpected key type word: '{0}'")]
    UnrecognizedType(String),

    #[error("{program} exited with status {status}: {stderr}")]
    ExternalTool {
        program: String,
        status: i32,
        stderr: String,
    },

    #[error("unexpected tool output: {0}")]
    ToolOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for key operations
pub type KeyResult<T> = Result<T, KeyError>;
