//! Utility helpers — path resolution.

use std::path::PathBuf;

/// Get the Counselor data directory (e.g. `~/.counselor/`).
pub fn get_data_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".counselor")
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path == "~" {
        let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(path.get(2..).unwrap_or(""))
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_tilde() {
        let expanded = expand_home("~/notes/report.pdf");
        assert!(!expanded.starts_with("~"));
        assert!(expanded.ends_with("notes/report.pdf"));
    }

    #[test]
    fn test_expand_home_bare_tilde() {
        assert!(!expand_home("~").to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_home_absolute() {
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn test_data_path_ends_with_counselor() {
        assert!(get_data_path().ends_with(".counselor"));
    }
}
