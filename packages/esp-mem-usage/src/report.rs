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

use std::fmt::Write;

use serde::Serialize;

use crate::memory::{FreeSpace, MemoryMap, MemorySection, SectionType};
use crate::nm_parser::ParseOutput;
use crate::symbols::{Symbol, SymbolKind};
use crate::utils::hex_address;

// Addresses are emitted as hex strings, sizes as plain numbers.

#[derive(Debug, Serialize)]
pub struct SymbolReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demangled: Option<String>,
    pub kind: SymbolKind,
    pub address: String,
    pub size: u64,
    pub global: bool,
}

impl From<&Symbol> for SymbolReport {
    fn from(sym: &Symbol) -> Self {
        let demangled = sym.display_name();
        Self {
            name: sym.name().to_string(),
            demangled: (demangled != sym.name()).then_some(demangled),
            kind: sym.kind(),
            address: hex_address(sym.address()),
            size: sym.size_bytes(),
            global: sym.is_global(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SectionReport {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub start: String,
    pub max_size: Option<u64>,
    pub user_accessible: bool,
    pub used: u64,
    pub used_total: u64,
    pub free: FreeSpace,
    pub symbols: Vec<SymbolReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<SectionReport>,
}

impl From<&MemorySection> for SectionReport {
    fn from(s: &MemorySection) -> Self {
        Self {
            name: s.name().to_string(),
            description: s.description().to_string(),
            section_type: s.section_type(),
            start: hex_address(s.start_address()),
            max_size: s.max_size_bytes(),
            user_accessible: s.is_user_accessible(),
            used: s.occupied_size_bytes(),
            used_total: s.total_occupied_size_bytes(),
            free: s.free_space_bytes(),
            symbols: s.symbols().iter().map(SymbolReport::from).collect(),
            subsections: s.subsections().iter().map(SectionReport::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemoryReport {
    pub binary: String,
    pub sections: Vec<SectionReport>,
    pub undefined: Vec<String>,
    pub unplaced: Vec<SymbolReport>,
    pub skipped_lines: usize,
}

impl MemoryReport {
    pub fn new(binary: &str, map: &MemoryMap, parsed: &ParseOutput) -> Self {
        Self {
            binary: binary.to_string(),
            sections: map.sections().iter().map(SectionReport::from).collect(),
            undefined: parsed.undefined().map(|s| s.name().to_string()).collect(),
            unplaced: parsed.unplaced.iter().map(SymbolReport::from).collect(),
            skipped_lines: parsed.skipped_lines,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn summary_line(out: &mut String, s: &MemorySection, depth: usize) {
    let max = s
        .max_size_bytes()
        .map_or_else(|| "-".to_string(), |m| m.to_string());
    let _ = writeln!(
        out,
        "{:indent$}{:<16} {:>4} {} used {:>8} / {:>8}  {}",
        "",
        s.name(),
        s.section_type().to_string(),
        hex_address(s.start_address()),
        s.occupied_size_bytes(),
        max,
        s.free_space_bytes(),
        indent = depth * 2
    );
    for child in s.subsections() {
        summary_line(out, child, depth + 1);
    }
}

/// One line per section, children indented under their parent.
pub fn render_summary(map: &MemoryMap) -> String {
    let mut out = String::new();
    for s in map.sections() {
        summary_line(&mut out, s, 0);
    }
    out
}
