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

//! Device memory maps. A catalog is plain data describing the sections of a
//! module for one flash size; `build` turns it into an empty `MemoryMap`.
//!
//! Addresses in catalog JSON may be written as numbers or as hex strings
//! ("0x3ffe8000"), since JSON has no hex literals.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::memory::{MemoryMap, MemorySection, SectionError, SectionType};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;

/// Flash sizes the built-in ESP8266 catalog knows about.
pub const ESP8266_FLASH_SIZES: [u64; 6] = [512 * KB, MB, 2 * MB, 4 * MB, 8 * MB, 16 * MB];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no memory map for a module with {0} bytes of flash")]
    UnsupportedFlashSize(u64),
    #[error("invalid flash size '{0}', expected e.g. 512K, 4M or a byte count")]
    InvalidFlashSize(String),
    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Topology(#[from] SectionError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsectionEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "de_address")]
    pub offset: u64,
    #[serde(deserialize_with = "de_address")]
    pub size: u64,
    #[serde(default)]
    pub user_accessible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<SubsectionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(deserialize_with = "de_address")]
    pub start: u64,
    #[serde(default, deserialize_with = "de_opt_address")]
    pub max_size: Option<u64>,
    #[serde(default)]
    pub user_accessible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<SubsectionEntry>,
}

/// Memory map of one module variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionCatalog {
    #[serde(deserialize_with = "de_address")]
    pub flash_size: u64,
    pub sections: Vec<SectionEntry>,
}

impl SectionCatalog {
    /// Build the (symbol-free) section tree described by this catalog.
    pub fn build(&self) -> Result<MemoryMap, CatalogError> {
        let mut sections = Vec::with_capacity(self.sections.len());
        for entry in &self.sections {
            let mut section = MemorySection::new(
                entry.name.as_str(),
                entry.description.as_str(),
                entry.section_type,
                entry.start,
                entry.max_size,
                entry.user_accessible,
            )?;
            add_subsections(&mut section, &entry.subsections)?;
            sections.push(section);
        }
        Ok(MemoryMap::new(sections)?)
    }

    /// The built-in map of an ESP8266 module with `flash_size` bytes of SPI flash.
    pub fn esp8266(flash_size: u64) -> Result<Self, CatalogError> {
        if !ESP8266_FLASH_SIZES.contains(&flash_size) {
            return Err(CatalogError::UnsupportedFlashSize(flash_size));
        }
        Ok(Self {
            flash_size,
            sections: esp8266_sections(flash_size),
        })
    }
}

fn add_subsections(parent: &mut MemorySection, entries: &[SubsectionEntry]) -> Result<(), SectionError> {
    for entry in entries {
        let child = parent.add_subsection(
            entry.name.as_str(),
            entry.description.as_str(),
            entry.offset,
            entry.size,
            entry.user_accessible,
        )?;
        add_subsections(child, &entry.subsections)?;
    }
    Ok(())
}

/// A set of catalogs loaded from a JSON file, one per flash size.
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    catalogs: Vec<SectionCatalog>,
}

impl CatalogSet {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let catalogs: Vec<SectionCatalog> = serde_json::from_str(text)?;
        Ok(Self { catalogs })
    }

    pub fn flash_sizes(&self) -> Vec<u64> {
        self.catalogs.iter().map(|c| c.flash_size).collect()
    }

    pub fn for_flash_size(&self, flash_size: u64) -> Result<&SectionCatalog, CatalogError> {
        self.catalogs
            .iter()
            .find(|c| c.flash_size == flash_size)
            .ok_or(CatalogError::UnsupportedFlashSize(flash_size))
    }
}

/// Section tree for an ESP8266 module with the given flash size.
pub fn memory_map_for_flash_size(flash_size: u64) -> Result<MemoryMap, CatalogError> {
    SectionCatalog::esp8266(flash_size)?.build()
}

/// Parse "512K", "4M", "4MB", "0x400000" or "4194304".
pub fn parse_flash_size(text: &str) -> Result<u64, CatalogError> {
    let invalid = || CatalogError::InvalidFlashSize(text.to_string());
    let t = text.trim().to_ascii_uppercase();
    if let Some(hex) = t.strip_prefix("0X") {
        return u64::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    let t = t.strip_suffix('B').unwrap_or(&t);
    let (digits, scale) = match t.chars().last() {
        Some('K') => (&t[..t.len() - 1], KB),
        Some('M') => (&t[..t.len() - 1], MB),
        _ => (t, 1),
    };
    let value: u64 = digits.trim().parse().map_err(|_| invalid())?;
    value.checked_mul(scale).ok_or_else(invalid)
}

fn parse_address(s: &str) -> Option<u64> {
    let trimmed = s.trim();
    match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse().ok(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAddress {
    Number(u64),
    Text(String),
}

impl RawAddress {
    fn resolve<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            RawAddress::Number(n) => Ok(n),
            RawAddress::Text(s) => {
                parse_address(&s).ok_or_else(|| E::custom(format!("invalid address '{}'", s)))
            }
        }
    }
}

fn de_address<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    RawAddress::deserialize(d)?.resolve()
}

fn de_opt_address<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<RawAddress>::deserialize(d)? {
        Some(raw) => raw.resolve().map(Some),
        None => Ok(None),
    }
}

fn section(
    name: &str,
    description: &str,
    section_type: SectionType,
    start: u64,
    max_size: Option<u64>,
    user_accessible: bool,
    subsections: Vec<SubsectionEntry>,
) -> SectionEntry {
    SectionEntry {
        name: name.to_string(),
        description: description.to_string(),
        section_type,
        start,
        max_size,
        user_accessible,
        subsections,
    }
}

fn sub(name: &str, description: &str, offset: u64, size: u64, user_accessible: bool) -> SubsectionEntry {
    SubsectionEntry {
        name: name.to_string(),
        description: description.to_string(),
        offset,
        size,
        user_accessible,
        subsections: Vec::new(),
    }
}

fn esp8266_sections(flash_size: u64) -> Vec<SectionEntry> {
    use SectionType::*;

    // Only the first megabyte of flash is mapped at 0x40200000.
    let mapped = flash_size.min(MB);
    let header = 0x1010;
    let mut flash_subsections = vec![sub("flash_header", "Bootloader and image header", 0, header, false)];
    if flash_size <= 512 * KB {
        // Small modules keep the SDK parameter sectors at the end of the mapped window.
        let sdk = 0x4000;
        flash_subsections.push(sub(
            "irom0_0_seg",
            "Cached flash code and constants",
            header,
            mapped - header - sdk,
            true,
        ));
        flash_subsections.push(sub("sdk_config", "SDK parameter sectors", mapped - sdk, sdk, false));
    } else {
        flash_subsections.push(sub(
            "irom0_0_seg",
            "Cached flash code and constants",
            header,
            mapped - header,
            true,
        ));
    }

    let peripherals = vec![
        sub("uart0", "UART0 registers", 0x000, 0x100, false),
        sub("spi1", "SPI1 registers", 0x100, 0x100, false),
        sub("spi0", "SPI0 (flash) registers", 0x200, 0x100, false),
        sub("gpio", "GPIO registers", 0x300, 0x100, false),
        sub("timer", "FRC timer registers", 0x600, 0x100, false),
        sub("rtc", "RTC registers", 0x700, 0x100, false),
        sub("iomux", "Pin mux registers", 0x800, 0x100, false),
        sub("wdt", "Watchdog registers", 0x900, 0x100, false),
        sub("i2s", "I2S registers", 0xe00, 0x100, false),
        sub("uart1", "UART1 registers", 0xf00, 0x100, false),
        sub("rtc_ram", "RTC memory", 0x1000, 0x300, true),
    ];

    vec![
        section("dport0", "DPORT registers", IO, 0x3ff0_0000, Some(0x10), false, vec![]),
        section("reserved0", "Unmapped", Reserved, 0x3ff0_0010, Some(0xe_7ff0), false, vec![]),
        section("dram0", "User data RAM", RAM, 0x3ffe_8000, Some(0x1_4000), true, vec![]),
        section("ets_data", "ETS system data RAM", RAM, 0x3fff_c000, Some(0x4000), false, vec![]),
        section("rom0", "Internal boot ROM", ROM, 0x4000_0000, Some(0x1_0000), false, vec![]),
        section("reserved1", "Unmapped", Reserved, 0x4001_0000, Some(0xf_0000), false, vec![]),
        section("iram1", "Instruction RAM", RAM, 0x4010_0000, Some(0x8000), true, vec![]),
        section("iram_cache", "Flash cache RAM", RAM, 0x4010_8000, Some(0x8000), false, vec![]),
        section("reserved2", "Unmapped", Reserved, 0x4011_0000, Some(0xf_0000), false, vec![]),
        section("irom0", "Memory mapped SPI flash", ROM, 0x4020_0000, Some(mapped), true, flash_subsections),
        section("peripherals", "Peripheral registers", IO, 0x6000_0000, None, false, peripherals),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_size_strings() {
        assert_eq!(parse_flash_size("512K").unwrap(), 512 * 1024);
        assert_eq!(parse_flash_size("4M").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_flash_size("4mb").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_flash_size("0x100000").unwrap(), 1024 * 1024);
        assert_eq!(parse_flash_size("1048576").unwrap(), 1024 * 1024);
        assert!(matches!(parse_flash_size("lots"), Err(CatalogError::InvalidFlashSize(_))));
        assert!(parse_flash_size("").is_err());
    }

    #[test]
    fn builtin_maps_build_for_every_size() {
        for size in ESP8266_FLASH_SIZES {
            let map = memory_map_for_flash_size(size).unwrap();
            assert_eq!(map.sections().len(), 11);
            assert_eq!(map.symbol_count(), 0);
        }
    }

    #[test]
    fn unsupported_flash_size() {
        let err = memory_map_for_flash_size(3 * MB).unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedFlashSize(n) if n == 3 * MB));
    }

    #[test]
    fn builtin_map_is_contiguous_up_to_flash() {
        let map = memory_map_for_flash_size(4 * MB).unwrap();
        let sections = map.sections();
        for pair in sections[..4].windows(2) {
            assert_eq!(pair[0].end(), Some(pair[1].start_address()), "{}", pair[0].name());
        }
        let dram = map.section("dram0").unwrap();
        assert_eq!(dram.max_size_bytes(), Some(80 * 1024));
        assert!(dram.is_user_accessible());
    }

    #[test]
    fn flash_window_depends_on_size() {
        let small = memory_map_for_flash_size(512 * KB).unwrap();
        let irom = small.section("irom0").unwrap();
        assert_eq!(irom.max_size_bytes(), Some(512 * KB));
        assert_eq!(irom.num_subsections(), 3);

        let large = memory_map_for_flash_size(16 * MB).unwrap();
        let irom = large.section("irom0").unwrap();
        assert_eq!(irom.max_size_bytes(), Some(MB));
        assert_eq!(irom.num_subsections(), 2);
        assert_eq!(irom.subsections()[1].start_address(), 0x4020_1010);
    }

    #[test]
    fn peripherals_are_unbounded_with_register_blocks() {
        let map = memory_map_for_flash_size(MB).unwrap();
        let io = map.section("peripherals").unwrap();
        assert_eq!(io.max_size_bytes(), None);
        let gpio = io.subsections().iter().find(|s| s.name() == "gpio").unwrap();
        assert_eq!(gpio.start_address(), 0x6000_0300);
        assert_eq!(gpio.section_type(), SectionType::IO);
    }

    #[test]
    fn json_catalog_with_hex_strings() {
        let text = r#"[
            {
                "flash_size": "0x80000",
                "sections": [
                    { "name": "ram", "type": "ram", "start": "0x1000", "max_size": 256,
                      "user_accessible": true,
                      "subsections": [ { "name": "stack", "offset": "0x80", "size": "0x80" } ] },
                    { "name": "mmio", "type": "io", "start": 1073741824 }
                ]
            }
        ]"#;
        let set = CatalogSet::from_json(text).unwrap();
        assert_eq!(set.flash_sizes(), vec![0x80000]);
        let map = set.for_flash_size(0x80000).unwrap().build().unwrap();
        let ram = map.section("ram").unwrap();
        assert_eq!(ram.subsections()[0].start_address(), 0x1080);
        assert_eq!(map.section("mmio").unwrap().max_size_bytes(), None);
        assert!(set.for_flash_size(MB).is_err());
    }

    #[test]
    fn json_catalog_rejects_bad_topology() {
        let text = r#"[{ "flash_size": 1, "sections": [
            { "name": "ram", "type": "ram", "start": 0, "max_size": 16,
              "subsections": [ { "name": "big", "offset": 8, "size": 16 } ] } ] }]"#;
        let set = CatalogSet::from_json(text).unwrap();
        let err = set.for_flash_size(1).unwrap().build().unwrap_err();
        assert!(matches!(err, CatalogError::Topology(SectionError::NotContained { .. })));

        let text = r#"[{ "flash_size": 1, "sections": [
            { "name": "open", "type": "io", "start": "0x1000",
              "subsections": [ { "name": "late", "offset": "0x1800", "size": 16 } ] },
            { "name": "next", "type": "ram", "start": "0x2000", "max_size": 256 } ] }]"#;
        let err = CatalogSet::from_json(text).unwrap().for_flash_size(1).unwrap().build().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Topology(SectionError::NotContained { ref child, .. }) if child == "late"
        ));

        assert!(matches!(CatalogSet::from_json("{"), Err(CatalogError::Json(_))));
    }
}
