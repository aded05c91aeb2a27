#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Header and rows of the specimen export used across the integration tests.
pub const SPECIMENS_CSV: &str = "\
Catalogue number,Specimen number,gnawing_damage
MZ-001,7,yes
MZ-002,7,no
MZ-003,7,\"no, minor\"
";

/// Operator script: remove every constant column, rename the other two, finish.
pub const SPECIMENS_SCRIPT: &str = "2\n1\ncatalogNumber\n2\ngnawingDamage\n3\n";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read workspace file")
    }
}
