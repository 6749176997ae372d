use std::path::{Component, Path, PathBuf};

/// Canonicalize `path` if it exists on disk, otherwise fold `.` and `..`
/// lexically. Never fails: source paths reported by debug info often point
/// at machines other than this one.
pub fn normalize_path(path: &Path) -> PathBuf {
    // dunce avoids the \\?\ prefix std::fs::canonicalize produces on Windows.
    if let Ok(canonical) = dunce::canonicalize(path) {
        return canonical;
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Format an address the way reports print it.
pub fn hex_address(address: u64) -> String {
    format!("0x{:08x}", address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_fallback_for_missing_paths() {
        let p = normalize_path(Path::new("/nonexistent/build/../src/./main.c"));
        assert_eq!(p, PathBuf::from("/nonexistent/src/main.c"));
        let p = normalize_path(Path::new("../nonexistent/x.c"));
        assert_eq!(p, PathBuf::from("../nonexistent/x.c"));
    }

    #[test]
    fn existing_paths_are_canonical() {
        let dir = std::env::temp_dir();
        let p = normalize_path(&dir.join("."));
        assert_eq!(p, dunce::canonicalize(&dir).unwrap());
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(hex_address(0x3ffe8000), "0x3ffe8000");
        assert_eq!(hex_address(0x10), "0x00000010");
    }
}
