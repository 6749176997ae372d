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

//! Secondary source of symbol sizes for plain nm listings, which carry no size column.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use object::{Object, ObjectSymbol};

#[derive(Debug, Clone, Default)]
pub struct SymbolSizes {
    // (name, address) -> size in bytes
    sizes: HashMap<(String, u64), u64>,
}

impl SymbolSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, address: u64, size: u64) {
        self.sizes.insert((name.into(), address), size);
    }

    pub fn get(&self, name: &str, address: u64) -> Option<u64> {
        self.sizes.get(&(name.to_string(), address)).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Read sizes straight from the ELF symbol table.
    pub fn from_elf(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_elf_bytes(&data).with_context(|| format!("Failed to parse ELF {}", path.display()))
    }

    pub fn from_elf_bytes(data: &[u8]) -> Result<Self> {
        let obj_file = object::File::parse(data)?;
        let mut sizes = Self::new();
        for sym in obj_file.symbols() {
            if !sym.is_definition() || sym.size() == 0 {
                continue;
            }
            if let Ok(name) = sym.name() {
                if !name.is_empty() {
                    sizes.insert(name, sym.address(), sym.size());
                }
            }
        }
        Ok(sizes)
    }

    /// Collect sizes from `nm -S` output (`<addr> <size> <type> <name>`).
    /// Lines of any other shape are ignored.
    pub fn from_sized_listing(text: &str) -> Self {
        let mut sizes = Self::new();
        for line in text.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 4 || fields[2].chars().count() != 1 {
                continue;
            }
            let addr = u64::from_str_radix(fields[0], 16);
            let size = u64::from_str_radix(fields[1], 16);
            if let (Ok(addr), Ok(size)) = (addr, size) {
                sizes.insert(fields[3], addr, size);
            }
        }
        sizes
    }
}
