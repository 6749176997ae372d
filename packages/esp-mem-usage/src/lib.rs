// Crate root: declare modules and control visibility
pub mod catalog;
pub mod debug;
pub mod locator;
pub mod memory;
pub mod nm_parser;
pub mod report;
pub mod sizes;
pub mod symbols;
pub mod tools;
pub mod utils;

// Re-export commonly used API from the library for binaries/tests
pub use catalog::{memory_map_for_flash_size, parse_flash_size, CatalogError, CatalogSet, SectionCatalog};
pub use locator::{locate_source, Addr2LineTool, DwarfLocator, SourceLocator};
pub use memory::{FreeSpace, MemoryMap, MemorySection, SectionError, SectionType, SortKey};
pub use nm_parser::{NmParser, ParseOutput};
pub use sizes::SymbolSizes;
pub use symbols::{Symbol, SymbolKind};
