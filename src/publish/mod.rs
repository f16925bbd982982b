// src/publish/mod.rs

//! The scheduled publish pipeline.
//!
//! - [`pipeline`] owns the ordered steps of a run (`Publisher`).
//! - [`vcs`] is the version-control seam with the `git` CLI implementation.
//! - [`artifact`] stores the generation log outside source control.
//! - [`retry`] is the fixed-delay retry used for pushing.
//! - [`report`] describes what a run did and maps it to an exit status.

pub mod artifact;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod vcs;

pub use artifact::{ArtifactRecord, LocalArtifactStore};
pub use pipeline::Publisher;
pub use report::{CommitOutcome, GenerationOutcome, PushOutcome, RunReport};
pub use retry::{FixedDelay, RetryExhausted};
pub use vcs::{GitCli, Vcs};
