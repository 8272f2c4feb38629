//! External tool invocation seam
//!
//! Key generation and timestamp rewriting are delegated to the BIND
//! utilities. The trait keeps the store testable without the binaries
//! installed; tests substitute a recording implementation.
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
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Backend seam for running the external key tools
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args`, working directory set to `dir`
    ///
    /// Returns stdout split into trimmed lines. Output is fully consumed
    /// before the call returns; nothing outlives one invocation.
    fn run(&self, dir: &Path, program: &str, args: &[String]) -> KeyResult<Vec<String>>;
}

/// Runs tools as real child processes, blocking until they exit
///
/// No timeout is applied; a hung tool blocks the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, dir: &Path, program: &str, args: &[String]) -> KeyResult<Vec<String>> {
        debug!(program, ?args, dir = %dir.display(), "running external tool");
        let output = Command::new(program).args(args).current_dir(dir).output()?;
        if !output.status.success() {
            return Err(KeyError::ExternalTool {
                program: program.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .trim()
            .lines()
            .map(|line| line.trim().to_string())
            .collect())
    }
}
