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

//! Parser for nm symbol listings.
//!
//! Accepted line shapes (whitespace separated, addresses are bare hex):
//!
//! ```text
//! <addr> <type> <name>            plain listing
//! <addr> <size> <type> <name>     nm -S listing
//! <type> <name>                   undefined symbol, no address column
//! ```
//!
//! Anything else is skipped. Plain lines get their size from an optional
//! `SymbolSizes` table, or 0.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::catalog::{memory_map_for_flash_size, CatalogError};
use crate::locator::{locate_source, SourceLocator};
use crate::memory::MemoryMap;
use crate::sizes::SymbolSizes;
use crate::symbols::{Symbol, SymbolKind};

fn hex_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]+$").unwrap())
}

fn type_char(field: &str) -> Option<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn hex(field: &str) -> Option<u64> {
    if !hex_field().is_match(field) {
        return None;
    }
    u64::from_str_radix(field, 16).ok()
}

/// Parse one listing line. Returns `None` for blank or malformed lines.
pub fn parse_line(line: &str, sizes: Option<&SymbolSizes>) -> Option<Symbol> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [code, name] => {
            // Only undefined symbols are printed without an address.
            match SymbolKind::classify(type_char(code)?) {
                (SymbolKind::Undefined, _) => Some(Symbol::undefined(*name)),
                _ => None,
            }
        }
        [addr, code, name] => {
            let address = hex(addr)?;
            match SymbolKind::classify(type_char(code)?) {
                (SymbolKind::Undefined, _) => Some(Symbol::undefined(*name)),
                (kind, is_global) => {
                    let size = sizes.and_then(|s| s.get(name, address)).unwrap_or(0);
                    Some(Symbol::new(*name, kind, address, size, is_global))
                }
            }
        }
        [addr, size, code, name] => {
            let address = hex(addr)?;
            let size = hex(size)?;
            match SymbolKind::classify(type_char(code)?) {
                // Undefined symbols carry no address even if nm printed one.
                (SymbolKind::Undefined, _) => Some(Symbol::undefined(*name)),
                (kind, is_global) => Some(Symbol::new(*name, kind, address, size, is_global)),
            }
        }
        _ => None,
    }
}

/// Result of parsing one listing.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    /// Every symbol read, in listing order, undefined ones included.
    pub symbols: Vec<Symbol>,
    /// Defined symbols whose address no section contains.
    pub unplaced: Vec<Symbol>,
    pub skipped_lines: usize,
}

impl ParseOutput {
    pub fn undefined(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.is_undefined())
    }
}

/// Turns nm output into symbols and routes them into a memory map.
///
/// Remembers the file it last parsed so that source lookups can resolve
/// relative paths against that file's directory.
#[derive(Debug, Default)]
pub struct NmParser {
    sizes: Option<SymbolSizes>,
    last_parsed_file: Option<PathBuf>,
    last_parsed_dir: Option<PathBuf>,
}

impl NmParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `sizes` to fill in sizes of plain (size-less) listing lines.
    pub fn with_sizes(sizes: SymbolSizes) -> Self {
        Self {
            sizes: Some(sizes),
            ..Self::default()
        }
    }

    pub fn set_sizes(&mut self, sizes: Option<SymbolSizes>) {
        self.sizes = sizes;
    }

    pub fn last_parsed_file(&self) -> Option<&Path> {
        self.last_parsed_file.as_deref()
    }

    pub fn last_parsed_dir(&self) -> Option<&Path> {
        self.last_parsed_dir.as_deref()
    }

    /// Parse the nm listing `raw_text` produced for `input_path`, placing every
    /// defined symbol into `map`.
    pub fn parse(&mut self, input_path: &Path, raw_text: &str, map: &mut MemoryMap) -> ParseOutput {
        let mut out = ParseOutput::default();
        for (line_no, line) in raw_text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some(symbol) = parse_line(line, self.sizes.as_ref()) else {
                debug!("skipping line {}: {:?}", line_no + 1, line);
                out.skipped_lines += 1;
                continue;
            };
            out.symbols.push(symbol.clone());
            if symbol.is_undefined() {
                continue;
            }
            if let Err(symbol) = map.place(symbol) {
                warn!("symbol {} at 0x{:08x} is outside every memory section", symbol.name(), symbol.address());
                out.unplaced.push(symbol);
            }
        }

        self.last_parsed_file = Some(input_path.to_path_buf());
        self.last_parsed_dir = input_path.parent().map(Path::to_path_buf);
        debug!(
            "parsed {} symbols from {} ({} unplaced, {} lines skipped)",
            out.symbols.len(),
            input_path.display(),
            out.unplaced.len(),
            out.skipped_lines
        );
        out
    }

    /// Build the built-in memory map for `flash_size` and parse `raw_text` into it.
    pub fn parse_symbols_in_memory_sections(
        &mut self,
        input_path: &Path,
        raw_text: &str,
        flash_size: u64,
    ) -> Result<(MemoryMap, ParseOutput), CatalogError> {
        let mut map = memory_map_for_flash_size(flash_size)?;
        let out = self.parse(input_path, raw_text, &mut map);
        Ok((map, out))
    }

    /// Best-effort source file of `symbol` in the last parsed binary.
    pub fn find_source_file(&self, symbol: &Symbol, locator: &dyn SourceLocator) -> Option<PathBuf> {
        let binary = self.last_parsed_file.as_deref()?;
        locate_source(locator, symbol, binary, self.last_parsed_dir.as_deref())
    }
}
