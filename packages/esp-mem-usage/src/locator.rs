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

//! Source file lookup for symbols. Always best-effort: a missing tool, a
//! binary without debug info or an unknown address all come back as `None`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::symbols::Symbol;
use crate::utils::normalize_path;

/// Maps an address in a binary to the source file it came from.
pub trait SourceLocator {
    fn lookup(&self, binary: &Path, address: u64) -> Option<String>;
}

impl<F> SourceLocator for F
where
    F: Fn(&Path, u64) -> Option<String>,
{
    fn lookup(&self, binary: &Path, address: u64) -> Option<String> {
        self(binary, address)
    }
}

/// Ask `locator` for the source of `symbol`, resolving relative answers against `base_dir`.
pub fn locate_source(
    locator: &dyn SourceLocator,
    symbol: &Symbol,
    binary: &Path,
    base_dir: Option<&Path>,
) -> Option<PathBuf> {
    if symbol.is_undefined() {
        return None;
    }
    let raw = locator.lookup(binary, symbol.address())?;
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("??") {
        debug!("no source for {} at 0x{:x}", symbol.name(), symbol.address());
        return None;
    }
    let path = Path::new(raw);
    let resolved = match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    };
    Some(normalize_path(&resolved))
}

/// Extract the file part of addr2line output (`/path/file.c:42`, `??:0`, `file.c:?`).
pub fn parse_addr2line_output(output: &str) -> Option<String> {
    let first = output.lines().next()?.trim();
    let file = match first.rsplit_once(':') {
        Some((file, _line)) => file,
        None => first,
    };
    if file.is_empty() || file == "??" {
        return None;
    }
    Some(file.to_string())
}

/// Runs the toolchain's addr2line binary for each lookup.
#[derive(Debug, Clone)]
pub struct Addr2LineTool {
    path: PathBuf,
}

impl Addr2LineTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SourceLocator for Addr2LineTool {
    fn lookup(&self, binary: &Path, address: u64) -> Option<String> {
        let output = Command::new(&self.path)
            .arg("-e")
            .arg(binary)
            .arg(format!("0x{:x}", address))
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        let output = match output {
            Ok(o) => o,
            Err(e) => {
                debug!("failed to run {}: {}", self.path.display(), e);
                return None;
            }
        };
        if !output.status.success() {
            debug!("{} exited with {}", self.path.display(), output.status);
            return None;
        }
        parse_addr2line_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads DWARF line tables in process, no external tool needed.
/// The loaded binary is cached until a different one is asked for.
#[derive(Default)]
pub struct DwarfLocator {
    cache: RefCell<Option<(PathBuf, addr2line::Loader)>>,
}

impl DwarfLocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceLocator for DwarfLocator {
    fn lookup(&self, binary: &Path, address: u64) -> Option<String> {
        let mut cache = self.cache.borrow_mut();
        let stale = cache.as_ref().map_or(true, |(path, _)| path != binary);
        if stale {
            match addr2line::Loader::new(binary) {
                Ok(loader) => *cache = Some((binary.to_path_buf(), loader)),
                Err(e) => {
                    debug!("failed to load debug info from {}: {}", binary.display(), e);
                    *cache = None;
                    return None;
                }
            }
        }
        let (_, loader) = cache.as_ref()?;
        let file = match loader.find_location(address) {
            Ok(Some(location)) => location.file.map(str::to_string),
            Ok(None) => None,
            Err(e) => {
                debug!("line lookup failed at 0x{:x}: {}", address, e);
                None
            }
        };
        file
    }
}
