use crate::snapshot::SnapshotFile;
use crate::solution::Solution;
use camino::Utf8Path;
use fs_err as fs;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SnapshotLoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot schema `{found}` (expected `{expected}`)")]
    Schema {
        found: String,
        expected: &'static str,
    },

    #[error("invalid snapshot: {message}")]
    Invalid { message: String },
}

pub fn parse_snapshot(text: &str) -> Result<SnapshotFile, SnapshotLoadError> {
    Ok(serde_json::from_str(text)?)
}

/// Read and bind a snapshot file.
///
/// Documents without inline text are resolved against `root`, or the snapshot's own
/// directory when no root is given.
pub fn load_snapshot(path: &Utf8Path, root: Option<&Utf8Path>) -> Result<Solution, SnapshotLoadError> {
    let text = fs::read_to_string(path)?;
    let file = parse_snapshot(&text)?;
    let root = root
        .or_else(|| path.parent())
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    debug!(snapshot = %path, root = %root, "loading snapshot");
    Solution::from_snapshot(file, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn write(dir: &Utf8Path, rel: &str, text: &str) -> Utf8PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn documents_are_read_relative_to_snapshot_dir() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write(dir, "src/a.cs", "class A { void M() { } }\n");
        let snapshot = write(
            dir,
            "friends.snapshot.json",
            r#"{"schema":"friends.snapshot.v1","documents":[{"path":"src/a.cs"}]}"#,
        );

        let solution = load_snapshot(&snapshot, None).unwrap();
        assert_eq!(
            solution.document_text("src/a.cs"),
            Some("class A { void M() { } }\n")
        );
        assert!(solution.on_disk_texts().contains_key(Utf8Path::new("src/a.cs")));
    }

    #[test]
    fn missing_document_is_io_error() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let snapshot = write(
            dir,
            "s.json",
            r#"{"schema":"friends.snapshot.v1","documents":[{"path":"gone.cs"}]}"#,
        );
        assert!(matches!(load_snapshot(&snapshot, None), Err(SnapshotLoadError::Io(_))));
    }

    #[test]
    fn wrong_schema_is_rejected() {
        let file = parse_snapshot(r#"{"schema":"friends.snapshot.v0"}"#).unwrap();
        let err = Solution::from_snapshot(file, Utf8Path::new(".")).unwrap_err();
        assert!(matches!(err, SnapshotLoadError::Schema { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(parse_snapshot("{"), Err(SnapshotLoadError::Json(_))));
    }
}
