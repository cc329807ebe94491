//! Text files collected by the project exporter

use std::path::Path;

use serde::Serialize;

use crate::page::EntryId;
use crate::working_set::Entry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFile {
    #[serde(skip)]
    pub id: EntryId,
    /// Path relative to the dropped folder, or the bare file name
    pub path: String,
    pub content: String,
}

impl Entry for ProjectFile {
    fn id(&self) -> EntryId {
        self.id
    }
}

/// Read `path` as text, recording it relative to `root` when possible.
///
/// Returns `None` for files that are not valid UTF-8; those are skipped the
/// same way an unreadable file is.
pub fn read_project_file(root: Option<&Path>, path: &Path) -> std::io::Result<Option<(String, String)>> {
    let bytes = std::fs::read(path)?;
    let Ok(content) = String::from_utf8(bytes) else {
        return Ok(None);
    };

    let relative = root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);
    let display = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(Some((display, content)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_without_id() {
        let file = ProjectFile {
            id: EntryId(3),
            path: "src/main.rs".into(),
            content: "fn main() {}".into(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"path": "src/main.rs", "content": "fn main() {}"})
        );
    }

    #[test]
    fn test_read_project_file_relative_path() {
        let root = std::env::temp_dir().join(format!("pdfkaro-project-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/lib.rs"), "pub mod a;").unwrap();
        std::fs::write(root.join("blob.bin"), [0xC3, 0x28]).unwrap();

        let (path, content) = read_project_file(Some(&root), &root.join("src/lib.rs"))
            .unwrap()
            .unwrap();
        assert_eq!(path, "src/lib.rs");
        assert_eq!(content, "pub mod a;");

        assert!(read_project_file(Some(&root), &root.join("blob.bin")).unwrap().is_none());
        assert!(read_project_file(None, &root.join("missing.txt")).is_err());

        let _ = std::fs::remove_dir_all(root);
    }
}
