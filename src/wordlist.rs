//! Username and password list loading.
//!
//! Lists are plain text files, one candidate per line. Each line is trimmed;
//! no other normalization happens, so an intentionally blank candidate in the
//! middle of a file survives as an empty string.

use std::path::Path;

use anyhow::Context;

use crate::error::{PicklockError, Result};

/// Load a wordlist from a file.
pub fn load(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("{} is not a valid or accessible file", path.display()))?;
    Ok(lines(&contents))
}

/// Split raw list contents into trimmed entries.
pub fn lines(contents: &str) -> Vec<String> {
    contents.lines().map(|line| line.trim().to_string()).collect()
}

/// Reject an empty list with the name of the offending source.
pub fn ensure_non_empty(list: &[String], what: &str) -> Result<()> {
    if list.is_empty() {
        return Err(PicklockError::Config(format!("{what} list is empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_lines() {
        let entries = lines("admin\n  root \nguest\n");
        assert_eq!(entries, vec!["admin", "root", "guest"]);
    }

    #[test]
    fn keeps_interior_blank_lines_as_empty_candidates() {
        let entries = lines("first\n\nsecond");
        assert_eq!(entries, vec!["first", "", "second"]);
    }

    #[test]
    fn rejects_empty_list() {
        assert!(ensure_non_empty(&[], "password").is_err());
        assert!(ensure_non_empty(&["x".to_string()], "password").is_ok());
    }

    #[test]
    fn missing_file_is_a_config_style_error() {
        let err = load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("not a valid or accessible file"));
    }
}
