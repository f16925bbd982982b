// src/publish/report.rs

use std::path::PathBuf;

use super::artifact::ArtifactRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Succeeded,
    /// `exit_code` is `None` if the process could not be started or was
    /// killed by a signal.
    Failed { exit_code: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NothingToCommit,
    /// Generation failed, so nothing was staged.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed { attempts: u32 },
    Exhausted { attempts: u32, last_error: String },
    NotAttempted,
}

/// What a single publish run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub generation: GenerationOutcome,
    pub artifact: Option<ArtifactRecord>,
    pub staged: Vec<PathBuf>,
    pub commit: CommitOutcome,
    pub push: PushOutcome,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.generation == GenerationOutcome::Succeeded
            && !matches!(self.push, PushOutcome::Exhausted { .. })
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }
}
