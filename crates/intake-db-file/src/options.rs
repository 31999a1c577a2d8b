use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the record file is rewritten after each create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Truncate and rewrite the file in place. A crash mid-write can leave a
    /// torn file.
    #[default]
    Overwrite,
    /// Write a sibling temp file, fsync it, then rename over the target.
    AtomicRename,
}

/// Options for constructing a [`FileRecordStore`](crate::FileRecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreOptions {
    /// Location of the JSON array file.
    pub path: PathBuf,
    pub write_mode: WriteMode,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/patients.json"),
            write_mode: WriteMode::default(),
        }
    }
}

impl FileStoreOptions {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }
}
