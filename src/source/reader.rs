use std::path::Path;

use crate::error::{AppError, Result};

/// Read the whole export as text. Bytes that aren't valid UTF-8 become
/// U+FFFD instead of failing the run.
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_valid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("[{\"title\": \"Café\"}]".as_bytes()).unwrap();

        let text = read_lossy(file.path()).unwrap();
        assert_eq!(text, "[{\"title\": \"Café\"}]");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[\"ab\xff\xfecd\"]").unwrap();

        let text = read_lossy(file.path()).unwrap();
        assert!(text.starts_with("[\"ab"));
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with("cd\"]"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");

        match read_lossy(&missing) {
            Err(AppError::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected read error, got {:?}", other),
        }
    }
}
