//! Reading input documents.

use std::path::Path;

use crate::error::{PipelineError, Result};

const BOM: char = '\u{feff}';

/// Read `path` as UTF-8 text, dropping a leading byte-order mark.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if the file cannot be read or is not valid UTF-8.
pub fn read_text_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        PipelineError::InvalidInput(format!("Failed to read '{}': {e}", path.display()))
    })?;

    let text = String::from_utf8(bytes).map_err(|e| {
        PipelineError::InvalidInput(format!(
            "'{}' is not valid UTF-8 (first bad byte at offset {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })?;

    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_utf8_and_strips_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("\u{feff}吾輩は猫である。".as_bytes()).unwrap();

        assert_eq!(read_text_file(file.path()).unwrap(), "吾輩は猫である。");
    }

    #[test]
    fn plain_utf8_is_unchanged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("名前はまだ無い。\n".as_bytes()).unwrap();

        assert_eq!(read_text_file(file.path()).unwrap(), "名前はまだ無い。\n");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // "日本" in Shift_JIS.
        file.write_all(&[0x93, 0xfa, 0x96, 0x7b]).unwrap();

        let err = read_text_file(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text_file(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
