use crate::error::{EditResult, PolicyBlockError};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// When set, the previous contents are copied to `<path><suffix>` before writing.
    pub backup_suffix: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            backup_suffix: Some(".friends.bak".to_string()),
        }
    }
}

/// One document rewritten on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: Utf8PathBuf,
    pub sha256_before: String,
    pub sha256_after: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<Utf8PathBuf>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Write every document whose text differs between `before` and `after` under `root`.
///
/// All preconditions are checked before anything is written: each changed document must
/// still hash to its `before` text on disk. A mismatch blocks the whole write.
pub fn write_changes(
    root: &Utf8Path,
    before: &BTreeMap<Utf8PathBuf, String>,
    after: &BTreeMap<Utf8PathBuf, String>,
    opts: &WriteOptions,
) -> EditResult<Vec<FileChange>> {
    let changed: Vec<(&Utf8PathBuf, &String, &String)> = before
        .iter()
        .filter_map(|(path, old)| {
            let new = after.get(path)?;
            (old != new).then_some((path, old, new))
        })
        .collect();

    let mut mismatches = Vec::new();
    for (path, old, _) in &changed {
        let abs = abs_path(root, path);
        let on_disk = fs::read(&abs).with_context(|| format!("read {}", abs))?;
        let expected = sha256_hex(old.as_bytes());
        let actual = sha256_hex(&on_disk);
        if expected != actual {
            debug!(path = %path, %expected, %actual, "precondition failed");
            mismatches.push(format!("{path}: expected sha256 {expected}, found {actual}"));
        }
    }
    if !mismatches.is_empty() {
        return Err(PolicyBlockError::PreconditionMismatch {
            message: mismatches.join("; "),
        }
        .into());
    }

    let mut written = Vec::with_capacity(changed.len());
    for (path, old, new) in changed {
        let abs = abs_path(root, path);

        let backup = match &opts.backup_suffix {
            Some(suffix) => {
                let backup = Utf8PathBuf::from(format!("{abs}{suffix}"));
                fs::write(&backup, old.as_bytes())
                    .with_context(|| format!("write backup {}", backup))?;
                Some(backup)
            }
            None => None,
        };

        fs::write(&abs, new.as_bytes()).with_context(|| format!("write {}", abs))?;
        info!(path = %path, "rewrote document");

        written.push(FileChange {
            path: path.clone(),
            sha256_before: sha256_hex(old.as_bytes()),
            sha256_after: sha256_hex(new.as_bytes()),
            backup,
        });
    }

    Ok(written)
}

fn abs_path(root: &Utf8Path, rel: &Utf8Path) -> Utf8PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}
