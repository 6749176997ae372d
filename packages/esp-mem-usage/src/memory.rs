use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::symbols::{Symbol, SymbolKind};

/// Coarse category of a region of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionType {
    #[serde(rename = "io")]
    IO,
    #[serde(rename = "reserved")]
    Reserved,
    #[serde(rename = "ram")]
    RAM,
    #[serde(rename = "rom")]
    ROM,
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SectionType::IO => "IO",
            SectionType::Reserved => "RSV",
            SectionType::RAM => "RAM",
            SectionType::ROM => "ROM",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionError {
    #[error("memory section name must not be empty")]
    EmptyName,
    #[error("section '{name}': range 0x{start:x} + 0x{size:x} overflows the address space")]
    AddressOverflow { name: String, start: u64, size: u64 },
    #[error("subsection '{child}' [0x{start:x}, 0x{end:x}) is not contained in '{parent}'")]
    NotContained {
        parent: String,
        child: String,
        start: u64,
        end: u64,
    },
    #[error("subsection '{child}' overlaps sibling '{sibling}' in '{parent}'")]
    Overlap {
        parent: String,
        child: String,
        sibling: String,
    },
}

/// Remaining space in a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "bytes", rename_all = "snake_case")]
pub enum FreeSpace {
    Available(u64),
    /// More bytes are attached than the section can hold; carries the excess.
    Overflow(u64),
    /// The section was declared without a maximum size.
    Unbounded,
}

impl FreeSpace {
    pub fn bytes(&self) -> Option<u64> {
        match self {
            FreeSpace::Available(n) => Some(*n),
            _ => None,
        }
    }
    pub fn is_overflow(&self) -> bool {
        matches!(self, FreeSpace::Overflow(_))
    }
}

impl fmt::Display for FreeSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreeSpace::Available(n) => write!(f, "{} bytes free", n),
            FreeSpace::Overflow(n) => write!(f, "OVERFLOW by {} bytes", n),
            FreeSpace::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Address,
    Size,
}

/// A named region of the target address space with its attached symbols and
/// nested sub-regions.
#[derive(Debug, Clone)]
pub struct MemorySection {
    name: String,
    description: String,
    section_type: SectionType,
    start: u64,
    max_size: Option<u64>,
    user_accessible: bool,
    symbols: Vec<Symbol>,
    // (name, kind, address) -> position in `symbols`
    index: HashMap<(String, SymbolKind, u64), usize>,
    subsections: Vec<MemorySection>,
}

impl MemorySection {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        section_type: SectionType,
        start: u64,
        max_size: Option<u64>,
        user_accessible: bool,
    ) -> Result<Self, SectionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SectionError::EmptyName);
        }
        if let Some(size) = max_size {
            if start.checked_add(size).is_none() {
                return Err(SectionError::AddressOverflow { name, start, size });
            }
        }
        Ok(Self {
            name,
            description: description.into(),
            section_type,
            start,
            max_size,
            user_accessible,
            symbols: Vec::new(),
            index: HashMap::new(),
            subsections: Vec::new(),
        })
    }

    /// Add a child region at `start + offset`. The child inherits the parent's
    /// type, must lie inside the parent and must not overlap earlier siblings.
    pub fn add_subsection(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        offset: u64,
        max_size: u64,
        user_accessible: bool,
    ) -> Result<&mut MemorySection, SectionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SectionError::EmptyName);
        }
        let start = self
            .start
            .checked_add(offset)
            .ok_or_else(|| SectionError::AddressOverflow {
                name: name.clone(),
                start: self.start,
                size: offset,
            })?;
        let end = start
            .checked_add(max_size)
            .ok_or_else(|| SectionError::AddressOverflow {
                name: name.clone(),
                start,
                size: max_size,
            })?;

        // An unbounded parent accepts any child starting at or after its own start.
        let contained = match self.end() {
            Some(parent_end) => end <= parent_end,
            None => true,
        };
        if !contained {
            return Err(SectionError::NotContained {
                parent: self.name.clone(),
                child: name,
                start,
                end,
            });
        }
        if let Some(sibling) = self
            .subsections
            .iter()
            .find(|s| ranges_overlap(start, end, s.start, s.end().unwrap_or(u64::MAX)))
        {
            return Err(SectionError::Overlap {
                parent: self.name.clone(),
                child: name,
                sibling: sibling.name.clone(),
            });
        }

        let child = MemorySection::new(
            name,
            description,
            self.section_type,
            start,
            Some(max_size),
            user_accessible,
        )?;
        self.subsections.push(child);
        let last = self.subsections.len() - 1;
        Ok(&mut self.subsections[last])
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn section_type(&self) -> SectionType {
        self.section_type
    }
    pub fn start_address(&self) -> u64 {
        self.start
    }
    pub fn is_user_accessible(&self) -> bool {
        self.user_accessible
    }
    pub fn max_size_bytes(&self) -> Option<u64> {
        self.max_size
    }

    /// Exclusive end address, `None` when unbounded.
    pub fn end(&self) -> Option<u64> {
        self.max_size.map(|size| self.start + size)
    }

    /// Half-open containment test. An unbounded section contains everything from its start up.
    pub fn contains(&self, addr: u64) -> bool {
        match self.end() {
            Some(end) => addr >= self.start && addr < end,
            None => addr >= self.start,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }
    pub fn subsections(&self) -> &[MemorySection] {
        &self.subsections
    }
    pub fn num_subsections(&self) -> usize {
        self.subsections.len()
    }

    /// Attach a symbol to the deepest region of this section containing its
    /// address. Returns the symbol back when the address is outside this section.
    pub fn add_symbol(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        if symbol.is_undefined() || !self.contains(symbol.address()) {
            return Err(symbol);
        }
        self.attach(symbol);
        Ok(())
    }

    /// Caller has already checked that this section's range covers the address.
    fn attach(&mut self, symbol: Symbol) {
        // First child in declaration order wins.
        if let Some(child) = self
            .subsections
            .iter_mut()
            .find(|s| s.contains(symbol.address()))
        {
            child.attach(symbol);
            return;
        }
        let key = (symbol.name().to_string(), symbol.kind(), symbol.address());
        match self.index.get(&key) {
            Some(&i) => self.symbols[i] = symbol,
            None => {
                self.index.insert(key, self.symbols.len());
                self.symbols.push(symbol);
            }
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .symbols
            .iter()
            .enumerate()
            .map(|(i, s)| ((s.name().to_string(), s.kind(), s.address()), i))
            .collect();
    }

    /// Bytes used by symbols attached directly to this section.
    pub fn occupied_size_bytes(&self) -> u64 {
        self.symbols
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.size_bytes()))
    }

    /// Bytes used by this section and every nested subsection.
    pub fn total_occupied_size_bytes(&self) -> u64 {
        self.subsections
            .iter()
            .fold(self.occupied_size_bytes(), |acc, s| {
                acc.saturating_add(s.total_occupied_size_bytes())
            })
    }

    pub fn free_space_bytes(&self) -> FreeSpace {
        let Some(max) = self.max_size else {
            return FreeSpace::Unbounded;
        };
        let used = self.occupied_size_bytes();
        if used > max {
            FreeSpace::Overflow(used - max)
        } else {
            FreeSpace::Available(max - used)
        }
    }

    /// Stable in-place sort of the directly attached symbols. Subsections are untouched.
    pub fn sort_symbols(&mut self, key: SortKey, ascending: bool) {
        let cmp: fn(&Symbol, &Symbol) -> Ordering = match key {
            SortKey::Name => |a: &Symbol, b: &Symbol| a.name().cmp(b.name()),
            SortKey::Address => |a: &Symbol, b: &Symbol| a.address().cmp(&b.address()),
            SortKey::Size => |a: &Symbol, b: &Symbol| a.size_bytes().cmp(&b.size_bytes()),
        };
        if ascending {
            self.symbols.sort_by(cmp);
        } else {
            self.symbols.sort_by(|a, b| cmp(b, a));
        }
        self.reindex();
    }

    pub fn sort_symbols_by_name(&mut self, ascending: bool) {
        self.sort_symbols(SortKey::Name, ascending)
    }
    pub fn sort_symbols_by_address(&mut self, ascending: bool) {
        self.sort_symbols(SortKey::Address, ascending)
    }
    pub fn sort_symbols_by_size(&mut self, ascending: bool) {
        self.sort_symbols(SortKey::Size, ascending)
    }

    /// Apply the same sort to this section and all of its descendants.
    pub fn sort_symbols_recursive(&mut self, key: SortKey, ascending: bool) {
        self.sort_symbols(key, ascending);
        for child in &mut self.subsections {
            child.sort_symbols_recursive(key, ascending);
        }
    }

    fn find_path<'a>(&'a self, addr: u64, path: &mut Vec<&'a MemorySection>) {
        path.push(self);
        if let Some(child) = self.subsections.iter().find(|s| s.contains(addr)) {
            child.find_path(addr, path);
        }
    }

    fn find_symbol(&self, name: &str) -> Option<(&MemorySection, &Symbol)> {
        if let Some(sym) = self.symbols.iter().find(|s| s.name() == name) {
            return Some((self, sym));
        }
        self.subsections.iter().find_map(|s| s.find_symbol(name))
    }
}

fn ranges_overlap(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> bool {
    a_start < b_end && b_start < a_end
}

/// The top-level sections of a device, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    sections: Vec<MemorySection>,
}

impl MemoryMap {
    /// Fails when a subsection of an unbounded top-level section reaches past
    /// the start of the next top-level section.
    pub fn new(sections: Vec<MemorySection>) -> Result<Self, SectionError> {
        let map = Self { sections };
        for (i, section) in map.sections.iter().enumerate() {
            if section.end().is_some() {
                continue;
            }
            let Some(cap) = map.effective_end(i) else {
                continue;
            };
            for child in &section.subsections {
                let end = child.end().unwrap_or(u64::MAX);
                if end > cap {
                    return Err(SectionError::NotContained {
                        parent: section.name.clone(),
                        child: child.name.clone(),
                        start: child.start,
                        end,
                    });
                }
            }
        }
        Ok(map)
    }

    pub fn sections(&self) -> &[MemorySection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&MemorySection> {
        self.sections.iter().find(|s| s.name() == name)
    }

    /// Effective end of top-level section `index`. A section without a size
    /// runs up to the next section above it, or to the end of the address space.
    fn effective_end(&self, index: usize) -> Option<u64> {
        let section = &self.sections[index];
        if let Some(end) = section.end() {
            return Some(end);
        }
        self.sections
            .iter()
            .map(|s| s.start_address())
            .filter(|&start| start > section.start_address())
            .min()
    }

    fn top_level_index(&self, addr: u64) -> Option<usize> {
        (0..self.sections.len()).find(|&i| {
            let s = &self.sections[i];
            addr >= s.start_address() && self.effective_end(i).map_or(true, |end| addr < end)
        })
    }

    /// Place a symbol into the deepest section whose range contains its address.
    /// The symbol is handed back when no section contains it; undefined symbols
    /// are never placed.
    pub fn place(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        if symbol.is_undefined() {
            return Err(symbol);
        }
        match self.top_level_index(symbol.address()) {
            Some(i) => {
                self.sections[i].attach(symbol);
                Ok(())
            }
            None => Err(symbol),
        }
    }

    /// Chain of sections containing `addr`, outermost first. Empty if unmapped.
    pub fn find_section(&self, addr: u64) -> Vec<&MemorySection> {
        let mut path = Vec::new();
        if let Some(i) = self.top_level_index(addr) {
            self.sections[i].find_path(addr, &mut path);
        }
        path
    }

    pub fn find_symbol(&self, name: &str) -> Option<(&MemorySection, &Symbol)> {
        self.sections.iter().find_map(|s| s.find_symbol(name))
    }

    pub fn symbol_count(&self) -> usize {
        fn count(s: &MemorySection) -> usize {
            s.num_symbols() + s.subsections().iter().map(count).sum::<usize>()
        }
        self.sections.iter().map(count).sum()
    }

    pub fn sort_all(&mut self, key: SortKey, ascending: bool) {
        for section in &mut self.sections {
            section.sort_symbols_recursive(key, ascending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(name: &str, addr: u64, size: u64) -> Symbol {
        Symbol::new(name, SymbolKind::Initialized, addr, size, true)
    }

    fn section(name: &str, start: u64, size: Option<u64>) -> MemorySection {
        MemorySection::new(name, "", SectionType::RAM, start, size, true).unwrap()
    }

    #[test]
    fn rejects_empty_name() {
        let err = MemorySection::new("  ", "x", SectionType::IO, 0, Some(4), false).unwrap_err();
        assert_eq!(err, SectionError::EmptyName);
    }

    #[test]
    fn rejects_range_overflow() {
        let err = MemorySection::new("top", "", SectionType::ROM, u64::MAX - 1, Some(4), false)
            .unwrap_err();
        assert!(matches!(err, SectionError::AddressOverflow { .. }));
    }

    #[test]
    fn subsection_must_fit_parent() {
        let mut parent = section("dram0", 0x1000, Some(0x100));
        assert!(parent.add_subsection("a", "", 0x0, 0x80, true).is_ok());
        let err = parent.add_subsection("b", "", 0x80, 0x81, true).unwrap_err();
        assert!(matches!(err, SectionError::NotContained { .. }));
        let err = parent.add_subsection("c", "", 0x40, 0x10, true).unwrap_err();
        assert!(matches!(err, SectionError::Overlap { ref sibling, .. } if sibling == "a"));
        let child = parent.add_subsection("d", "", 0x80, 0x80, true).unwrap();
        assert_eq!(child.start_address(), 0x1080);
        assert_eq!(child.section_type(), SectionType::RAM);
        assert_eq!(parent.num_subsections(), 2);
    }

    #[test]
    fn symbol_goes_to_deepest_child_only() {
        let mut parent = section("io", 0x6000_0000, Some(0x1000));
        let uart = parent.add_subsection("uart0", "", 0x0, 0x100, false).unwrap();
        uart.add_subsection("fifo", "", 0x0, 0x4, false).unwrap();
        parent.add_subsection("gpio", "", 0x300, 0x100, false).unwrap();

        parent.add_symbol(data("fifo_reg", 0x6000_0000, 4)).unwrap();
        parent.add_symbol(data("gpio_out", 0x6000_0304, 4)).unwrap();
        parent.add_symbol(data("loose", 0x6000_0800, 4)).unwrap();

        assert_eq!(parent.symbols(), &[data("loose", 0x6000_0800, 4)]);
        let uart = &parent.subsections()[0];
        assert_eq!(uart.num_symbols(), 0);
        assert_eq!(uart.subsections()[0].symbols()[0].name(), "fifo_reg");
        assert_eq!(parent.subsections()[1].symbols()[0].name(), "gpio_out");

        assert_eq!(parent.occupied_size_bytes(), 4);
        assert_eq!(parent.total_occupied_size_bytes(), 12);
    }

    #[test]
    fn add_symbol_outside_range_is_returned() {
        let mut s = section("iram1", 0x4010_0000, Some(0x8000));
        let sym = data("far", 0x4010_8000, 4);
        assert_eq!(s.add_symbol(sym.clone()), Err(sym));
        assert_eq!(s.num_symbols(), 0);
        let undef = Symbol::undefined("ext");
        assert!(s.add_symbol(undef).is_err());
    }

    #[test]
    fn reinserting_equal_symbol_replaces_size() {
        let mut s = section("dram0", 0x0, Some(0x100));
        s.add_symbol(data("v", 0x10, 4)).unwrap();
        s.add_symbol(data("w", 0x20, 4)).unwrap();
        s.add_symbol(data("v", 0x10, 8)).unwrap();
        assert_eq!(s.num_symbols(), 2);
        assert_eq!(s.symbols()[0].size_bytes(), 8);
        assert_eq!(s.occupied_size_bytes(), 12);
    }

    #[test]
    fn reinserting_after_sort_hits_the_moved_entry() {
        let mut s = section("dram0", 0x0, Some(0x100));
        s.add_symbol(data("v", 0x10, 4)).unwrap();
        s.add_symbol(data("w", 0x20, 16)).unwrap();
        s.sort_symbols_by_size(false);
        assert_eq!(s.symbols()[0].name(), "w");

        s.add_symbol(data("v", 0x10, 32)).unwrap();
        // Same name and address but a different kind is a separate symbol.
        s.add_symbol(Symbol::new("v", SymbolKind::Uninitialized, 0x10, 1, true)).unwrap();
        let got: Vec<_> = s.symbols().iter().map(|x| (x.name(), x.size_bytes())).collect();
        assert_eq!(got, [("w", 16), ("v", 32), ("v", 1)]);
        assert_eq!(s.occupied_size_bytes(), 49);
    }

    #[test]
    fn free_space_arithmetic() {
        let mut s = section("dram0", 0x0, Some(1024));
        s.add_symbol(data("a", 0x0, 100)).unwrap();
        s.add_symbol(data("b", 0x100, 24)).unwrap();
        assert_eq!(s.free_space_bytes(), FreeSpace::Available(900));
        assert_eq!(s.free_space_bytes().bytes(), Some(900));
    }

    #[test]
    fn free_space_reports_overflow() {
        let mut s = section("dram0", 0x0, Some(1024));
        s.add_symbol(data("a", 0x0, 600)).unwrap();
        s.add_symbol(data("b", 0x200, 600)).unwrap();
        assert_eq!(s.free_space_bytes(), FreeSpace::Overflow(176));
        assert!(s.free_space_bytes().is_overflow());
        assert_eq!(s.free_space_bytes().bytes(), None);
    }

    #[test]
    fn unbounded_section_has_no_free_space_number() {
        let mut s = section("flash", 0x4020_0000, None);
        s.add_symbol(data("a", 0x4030_0000, 10)).unwrap();
        assert_eq!(s.max_size_bytes(), None);
        assert_eq!(s.free_space_bytes(), FreeSpace::Unbounded);
        assert_eq!(s.occupied_size_bytes(), 10);
    }

    #[test]
    fn sorts_are_stable_and_local() {
        let mut s = section("dram0", 0x0, Some(0x1000));
        s.add_subsection("inner", "", 0x800, 0x100, true).unwrap();
        for (name, addr, size) in [("c", 0x30, 4), ("a", 0x10, 8), ("b", 0x20, 4), ("d", 0x40, 8)] {
            s.add_symbol(data(name, addr, size)).unwrap();
        }
        s.add_symbol(data("z", 0x810, 1)).unwrap();
        s.add_symbol(data("y", 0x820, 1)).unwrap();

        let names = |s: &MemorySection| s.symbols().iter().map(|x| x.name().to_string()).collect::<Vec<_>>();

        s.sort_symbols_by_size(true);
        assert_eq!(names(&s), ["c", "b", "a", "d"]);
        s.sort_symbols_by_size(false);
        assert_eq!(names(&s), ["a", "d", "c", "b"]);

        s.sort_symbols_by_name(true);
        assert_eq!(names(&s), ["a", "b", "c", "d"]);
        s.sort_symbols_by_address(false);
        assert_eq!(names(&s), ["d", "c", "b", "a"]);

        assert_eq!(names(&s.subsections()[0]), ["z", "y"]);
    }

    #[test]
    fn sort_reverse_restores_equal_key_order() {
        let mut s = section("dram0", 0x0, Some(0x1000));
        for (name, addr) in [("p", 0x10), ("q", 0x20), ("r", 0x30)] {
            s.add_symbol(data(name, addr, 4)).unwrap();
        }
        s.sort_symbols_by_size(true);
        s.sort_symbols_by_size(false);
        let order: Vec<_> = s.symbols().iter().map(|x| x.name()).collect();
        assert_eq!(order, ["p", "q", "r"]);
    }

    #[test]
    fn place_uses_disjoint_sections() {
        let mut map = MemoryMap::new(vec![
            section("dram0", 0x3ffe_8000, Some(0x1_4000)),
            section("iram1", 0x4010_0000, Some(0x8000)),
        ]).unwrap();
        map.place(data("x", 0x4010_0010, 4)).unwrap();
        assert_eq!(map.sections()[0].num_symbols(), 0);
        assert_eq!(map.sections()[1].num_symbols(), 1);

        let outside = data("nowhere", 0x1000, 4);
        assert_eq!(map.place(outside.clone()), Err(outside));
        assert_eq!(map.symbol_count(), 1);
    }

    #[test]
    fn place_prefers_first_declared_and_skips_zero_size() {
        let mut map = MemoryMap::new(vec![
            section("empty", 0x100, Some(0)),
            section("low", 0x0, Some(0x100)),
            section("high", 0x100, Some(0x100)),
            section("shadow", 0x100, Some(0x100)),
        ]).unwrap();
        map.place(data("edge", 0x100, 4)).unwrap();
        map.place(data("last", 0xff, 4)).unwrap();
        assert_eq!(map.section("empty").unwrap().num_symbols(), 0);
        assert_eq!(map.section("low").unwrap().symbols()[0].name(), "last");
        assert_eq!(map.section("high").unwrap().symbols()[0].name(), "edge");
        assert_eq!(map.section("shadow").unwrap().num_symbols(), 0);
    }

    #[test]
    fn unbounded_section_stops_at_next_start() {
        let mut map = MemoryMap::new(vec![
            section("open", 0x1000, None),
            section("next", 0x2000, Some(0x100)),
            section("tail", 0x3000, None),
        ]).unwrap();
        map.place(data("a", 0x1fff, 1)).unwrap();
        map.place(data("b", 0x2000, 1)).unwrap();
        map.place(data("c", 0xffff_0000, 1)).unwrap();
        // Between the end of "next" and the start of "tail" nothing is mapped.
        assert!(map.place(data("gap", 0x2100, 1)).is_err());

        assert_eq!(map.section("open").unwrap().symbols()[0].name(), "a");
        assert_eq!(map.section("next").unwrap().symbols()[0].name(), "b");
        assert_eq!(map.section("tail").unwrap().symbols()[0].name(), "c");
    }

    #[test]
    fn unbounded_parent_children_must_end_before_next_section() {
        let mut open = section("open", 0x1000, None);
        open.add_subsection("past_next", "", 0x1800, 0x100, true).unwrap();
        let err = MemoryMap::new(vec![open, section("next", 0x2000, Some(0x100))]).unwrap_err();
        assert_eq!(
            err,
            SectionError::NotContained {
                parent: "open".to_string(),
                child: "past_next".to_string(),
                start: 0x2800,
                end: 0x2900,
            }
        );

        let mut open = section("open", 0x1000, None);
        open.add_subsection("inside", "", 0xf00, 0x100, true).unwrap();
        let mut map = MemoryMap::new(vec![open, section("next", 0x2000, Some(0x100))]).unwrap();
        map.place(data("in_child", 0x1f10, 4)).unwrap();
        let path: Vec<_> = map.find_section(0x1f10).iter().map(|s| s.name()).collect();
        assert_eq!(path, ["open", "inside"]);

        // The last unbounded section runs to the end of the address space.
        let mut tail = section("tail", 0x3000, None);
        tail.add_subsection("far", "", 0x1000_0000, 0x10, true).unwrap();
        assert!(MemoryMap::new(vec![section("next", 0x2000, Some(0x100)), tail]).is_ok());
    }

    #[test]
    fn find_section_returns_path() {
        let mut io = section("io", 0x6000_0000, Some(0x1000));
        io.add_subsection("gpio", "", 0x300, 0x100, false).unwrap();
        let mut map = MemoryMap::new(vec![io]).unwrap();
        map.place(data("gpio_out", 0x6000_0304, 4)).unwrap();

        let path: Vec<_> = map.find_section(0x6000_0304).iter().map(|s| s.name()).collect();
        assert_eq!(path, ["io", "gpio"]);
        assert!(map.find_section(0x10).is_empty());

        let (owner, sym) = map.find_symbol("gpio_out").unwrap();
        assert_eq!(owner.name(), "gpio");
        assert_eq!(sym.address(), 0x6000_0304);
    }
}
