use std::fmt;

use serde::Serialize;

/// Storage kind of a symbol, as reported by the nm type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Absolute,
    Uninitialized,
    Initialized,
    ReadOnly,
    Text,
    Weak,
    Undefined,
    Unknown,
}

impl SymbolKind {
    /// Classify an nm type character. Never fails: anything unrecognised is `Unknown`.
    ///
    /// Returns the kind together with the global flag. Upper case means external
    /// linkage; `U` is always global.
    pub fn classify(code: char) -> (SymbolKind, bool) {
        let kind = match code.to_ascii_uppercase() {
            'A' => SymbolKind::Absolute,
            'B' => SymbolKind::Uninitialized,
            'D' => SymbolKind::Initialized,
            'R' => SymbolKind::ReadOnly,
            'T' => SymbolKind::Text,
            'W' => SymbolKind::Weak,
            'U' if code == 'U' => SymbolKind::Undefined,
            _ => SymbolKind::Unknown,
        };
        let is_global = match kind {
            SymbolKind::Undefined => true,
            _ => code.is_ascii_uppercase(),
        };
        (kind, is_global)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SymbolKind::Absolute => "absolute",
            SymbolKind::Uninitialized => "bss",
            SymbolKind::Initialized => "data",
            SymbolKind::ReadOnly => "rodata",
            SymbolKind::Text => "text",
            SymbolKind::Weak => "weak",
            SymbolKind::Undefined => "undefined",
            SymbolKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the symbol listing. Immutable once built.
///
/// Identity is (name, kind, address); the size is deliberately left out since
/// the same symbol can be reported with different sizes by different passes.
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    address: u64,
    size_bytes: u64,
    is_global: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, address: u64, size_bytes: u64, is_global: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            address,
            size_bytes,
            is_global,
        }
    }

    /// A symbol nm reports as unresolved. It has no address and no size.
    pub fn undefined(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Undefined, 0, 0, true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }
    pub fn address(&self) -> u64 {
        self.address
    }
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
    pub fn is_global(&self) -> bool {
        self.is_global
    }
    pub fn is_undefined(&self) -> bool {
        self.kind == SymbolKind::Undefined
    }

    /// Same symbol, different size.
    pub fn with_size(&self, size_bytes: u64) -> Self {
        Self {
            size_bytes,
            ..self.clone()
        }
    }

    /// Human readable name: C++ and Rust mangled names are demangled,
    /// anything else is returned as is.
    pub fn display_name(&self) -> String {
        if let Ok(demangled) = rustc_demangle::try_demangle(&self.name) {
            return format!("{:#}", demangled);
        }
        if self.name.starts_with("_Z") {
            if let Ok(sym) = cpp_demangle::Symbol::new(self.name.as_bytes()) {
                if let Ok(demangled) = sym.demangle() {
                    return demangled;
                }
            }
        }
        self.name.clone()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.address == other.address
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, 0x{:08x}, {} bytes)",
            self.name, self.kind, self.address, self.size_bytes
        )
    }
}
