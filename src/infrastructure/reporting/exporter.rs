use crate::domain::error::{AppError, Result};
use std::path::Path;

/// Writes `content` to `path`, creating parent directories as needed.
pub fn save_markdown_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    std::fs::write(path, content)
        .map_err(|e| AppError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), bytes = content.len(), "Report saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/report.md");
        save_markdown_report(&path, "# Report\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        save_markdown_report(&path, "old").unwrap();
        save_markdown_report(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
