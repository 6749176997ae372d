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

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use esp_mem_usage::debug::{init_logging, is_debug};
use esp_mem_usage::report::{render_summary, MemoryReport};
use esp_mem_usage::tools::{NmTool, DEFAULT_ADDR2LINE, DEFAULT_NM};
use esp_mem_usage::{
    memory_map_for_flash_size, parse_flash_size, Addr2LineTool, CatalogSet, DwarfLocator, MemoryMap, MemorySection,
    NmParser, SortKey, SourceLocator, SymbolSizes,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Address,
    Size,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Address => SortKey::Address,
            SortArg::Size => SortKey::Size,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "esp-mem-usage",
    version,
    about = "Report how an ESP8266 firmware image uses its memory map"
)]
struct Cli {
    /// Firmware ELF file.
    #[arg(value_name = "ELF")]
    elf: PathBuf,

    /// Flash size of the module (512K, 1M, 2M, 4M, 8M, 16M or a byte count).
    #[arg(short = 'f', long = "flash-size", default_value = "4M")]
    flash_size: String,

    /// nm binary of the toolchain.
    #[arg(long = "nm", default_value = DEFAULT_NM)]
    nm: PathBuf,

    /// addr2line binary of the toolchain, used by --locate.
    #[arg(long = "addr2line", default_value = DEFAULT_ADDR2LINE)]
    addr2line: PathBuf,

    /// Read line info from the ELF directly instead of running addr2line.
    #[arg(long = "dwarf", default_value_t = false)]
    dwarf: bool,

    /// JSON file with memory maps replacing the built-in ESP8266 ones.
    #[arg(short = 'c', long = "catalog", value_name = "JSON")]
    catalog: Option<PathBuf>,

    /// Parse an already captured nm listing instead of running nm.
    #[arg(short = 'l', long = "listing", value_name = "FILE")]
    listing: Option<PathBuf>,

    /// Take sizes of size-less listing lines from the ELF symbol table.
    #[arg(long = "elf-sizes", default_value_t = false)]
    elf_sizes: bool,

    /// Print the full report as JSON.
    #[arg(long = "json", default_value_t = false)]
    json: bool,

    /// Symbol order within each section.
    #[arg(short = 's', long = "sort", value_enum, default_value_t = SortArg::Size)]
    sort: SortArg,

    #[arg(long = "descending", default_value_t = false)]
    descending: bool,

    /// Print the source file of a symbol (may be repeated).
    #[arg(long = "locate", value_name = "SYMBOL")]
    locate: Vec<String>,

    /// Enable debug output
    #[arg(short = 'd', long = "debug", default_value_t = false)]
    debug: bool,
}

fn load_memory_map(cli: &Cli, flash_size: u64) -> Result<MemoryMap> {
    match &cli.catalog {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("Failed to read catalog {}", path.display()))?;
            let set = CatalogSet::from_json(&text)?;
            Ok(set.for_flash_size(flash_size)?.build()?)
        }
        None => Ok(memory_map_for_flash_size(flash_size)?),
    }
}

fn load_listing(cli: &Cli) -> Result<String> {
    match &cli.listing {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read listing {}", path.display())),
        None => NmTool::new(&cli.nm).run(&cli.elf),
    }
}

fn warn_overflows(section: &MemorySection) {
    if section.free_space_bytes().is_overflow() {
        warn!("{}: {}", section.name(), section.free_space_bytes());
    }
    for child in section.subsections() {
        warn_overflows(child);
    }
}

fn locate_symbols(cli: &Cli, parser: &NmParser, map: &MemoryMap) {
    let locator: Box<dyn SourceLocator> = if cli.dwarf {
        Box::new(DwarfLocator::new())
    } else {
        Box::new(Addr2LineTool::new(&cli.addr2line))
    };
    for name in &cli.locate {
        let Some((section, symbol)) = map.find_symbol(name) else {
            println!("{}: not found in any section", name);
            continue;
        };
        let source = parser
            .find_source_file(symbol, locator.as_ref())
            .map_or_else(|| "unknown".to_string(), |p| p.display().to_string());
        if is_debug() {
            println!("{} [{} @ 0x{:08x}]: {}", symbol.display_name(), section.name(), symbol.address(), source);
        } else {
            println!("{} [{}]: {}", symbol.display_name(), section.name(), source);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(cli.debug)?;
    let now = Instant::now();

    let flash_size = parse_flash_size(&cli.flash_size)?;
    let mut map = load_memory_map(&cli, flash_size)?;
    let listing = load_listing(&cli)?;

    let mut parser = NmParser::new();
    if cli.elf_sizes {
        match SymbolSizes::from_elf(&cli.elf) {
            Ok(sizes) => parser.set_sizes(Some(sizes)),
            Err(e) => warn!("continuing without ELF sizes: {:#}", e),
        }
    }
    let parsed = parser.parse(&cli.elf, &listing, &mut map);
    map.sort_all(cli.sort.into(), !cli.descending);
    info!(
        "{} symbols, {} placed, {} unplaced in {:.2?}",
        parsed.symbols.len(),
        map.symbol_count(),
        parsed.unplaced.len(),
        now.elapsed()
    );

    for section in map.sections() {
        warn_overflows(section);
    }

    let binary = display_path(&cli.elf);
    if cli.json {
        println!("{}", MemoryReport::new(&binary, &map, &parsed).to_json()?);
    } else {
        print!("{}", render_summary(&map));
        for sym in &parsed.unplaced {
            println!("unplaced: {}", sym);
        }
    }

    locate_symbols(&cli, &parser, &map);
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
