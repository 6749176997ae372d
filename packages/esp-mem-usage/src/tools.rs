// Copyright (c) 2026 MCU-Debug Authors.
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

//! Child-process wrapper for the toolchain's nm. The parser never calls this
//! itself; the binary runs it and hands the captured text over.
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use log::debug;

pub const DEFAULT_NM: &str = "xtensa-lx106-elf-nm";
pub const DEFAULT_ADDR2LINE: &str = "xtensa-lx106-elf-addr2line";

#[derive(Debug, Clone)]
pub struct NmTool {
    path: PathBuf,
    print_size: bool,
}

impl Default for NmTool {
    fn default() -> Self {
        Self::new(DEFAULT_NM)
    }
}

impl NmTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            print_size: true,
        }
    }

    /// Ask nm for the size column (`-S`). On by default.
    pub fn print_size(mut self, enabled: bool) -> Self {
        self.print_size = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn command(&self, elf_path: &Path) -> Command {
        let mut cmd = Command::new(&self.path);
        if self.print_size {
            cmd.arg("-S");
        }
        cmd.arg(elf_path);
        cmd
    }

    /// Run nm on `elf_path` and return its listing.
    pub fn run(&self, elf_path: &Path) -> Result<String> {
        let now = Instant::now();
        // output() drains stdout and stderr together, so a chatty nm cannot
        // fill the stderr pipe and stall.
        let output = self
            .command(elf_path)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", self.path.display()))?;
        if !output.status.success() {
            bail!(
                "{} failed on {} ({}): {}",
                self.path.display(),
                elf_path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if !output.stderr.is_empty() {
            debug!(
                "{} wrote {} bytes to stderr",
                self.path.display(),
                output.stderr.len()
            );
        }

        let mut listing = String::with_capacity(output.stdout.len());
        for line in output.stdout.as_slice().lines() {
            listing.push_str(&line?);
            listing.push('\n');
        }
        debug!(
            "{} produced {} bytes for {} in {:.2?}",
            self.path.display(),
            listing.len(),
            elf_path.display(),
            now.elapsed()
        );
        Ok(listing)
    }
}
