#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub use vodpublish_test_utils::builders::ConfigFileBuilder;
pub use vodpublish_test_utils::fake_runner::FakeRunner;
pub use vodpublish_test_utils::fake_vcs::{FakeVcs, VcsCall};
pub use vodpublish_test_utils::{init_tracing, with_timeout};

/// Work dir and artifact dir inside a fresh temp directory.
pub struct Workspace {
    pub tmp: tempfile::TempDir,
    pub work_dir: PathBuf,
    pub artifact_dir: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let work_dir = tmp.path().join("repo");
        let artifact_dir = tmp.path().join("artifacts");
        std::fs::create_dir_all(&work_dir).expect("create work dir");
        Self {
            tmp,
            work_dir,
            artifact_dir,
        }
    }

    pub fn builder(&self) -> ConfigFileBuilder {
        ConfigFileBuilder::new()
            .work_dir(&self.work_dir)
            .artifact_dir(&self.artifact_dir)
    }

    pub fn file(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.work_dir.join(rel)
    }
}
