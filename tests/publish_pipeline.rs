// tests/publish_pipeline.rs

mod common;
use crate::common::{FakeRunner, FakeVcs, VcsCall, Workspace, init_tracing, with_timeout};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use vodpublish::config::ConfigFile;
use vodpublish::errors::PublishError;
use vodpublish::exec::{CommandSpec, OutputTarget, ProcessOutcome, ProcessRunner};
use vodpublish::fs::RealFileSystem;
use vodpublish::publish::{CommitOutcome, GenerationOutcome, Publisher, PushOutcome};
use vodpublish::types::CommitIdentity;

type TestResult = Result<(), Box<dyn Error>>;

const GENERATE: &str = "python3 VOD-generate_m3u.py";

fn publisher(cfg: ConfigFile, runner: &FakeRunner, vcs: &FakeVcs) -> Publisher {
    Publisher::new(
        cfg,
        CommandSpec::Shell(GENERATE.to_string()),
        Arc::new(runner.clone()),
        Arc::new(vcs.clone()),
        Arc::new(RealFileSystem),
    )
}

/// A generation step that writes the artifact set and a log, then exits
/// with `code`.
fn generating_runner(code: i32) -> FakeRunner {
    FakeRunner::new(move |inv| {
        if let OutputTarget::File(log) = &inv.output {
            std::fs::write(log, "INFO - Fetched 2 URLs\nINFO - Wrote 2 videos\n")?;
            if code == 0 {
                std::fs::create_dir_all(inv.cwd.join("m3u_permanent"))?;
                std::fs::write(inv.cwd.join("master.m3u"), "#EXTM3U\n")?;
                std::fs::write(inv.cwd.join("video_metadata.json"), "{\"video_1_1\": {}}")?;
            }
        }
        Ok(ProcessOutcome::exited(code))
    })
}

fn expected_identity() -> CommitIdentity {
    CommitIdentity {
        name: "GitHub Action".to_string(),
        email: "action@github.com".to_string(),
    }
}

#[tokio::test]
async fn unchanged_artifacts_succeed_without_commit() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, false);

    let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

    assert_eq!(report.commit, CommitOutcome::NothingToCommit);
    assert_eq!(report.push, PushOutcome::NotAttempted);
    assert_eq!(report.exit_code(), 0);
    assert!(vcs.commits().is_empty());
    assert_eq!(vcs.push_count(), 0);
    Ok(())
}

#[tokio::test]
async fn changed_metadata_is_committed_once_and_pushed() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, true);

    let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

    assert_eq!(report.generation, GenerationOutcome::Succeeded);
    assert_eq!(report.commit, CommitOutcome::Committed);
    assert_eq!(report.push, PushOutcome::Pushed { attempts: 1 });
    assert_eq!(report.exit_code(), 0);
    assert_eq!(
        vcs.commits(),
        vec![VcsCall::Commit {
            identity: expected_identity(),
            message: "Update master M3U with raw URLs".to_string(),
        }]
    );
    Ok(())
}

#[tokio::test]
async fn only_known_paths_that_exist_are_staged() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, true);

    let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

    // Publisher.toml is in the default list but absent from this work dir.
    let expected: Vec<PathBuf> = ["master.m3u", "m3u_permanent", "video_metadata.json"]
        .iter()
        .map(PathBuf::from)
        .collect();
    assert_eq!(report.staged, expected);
    assert!(vcs.calls().contains(&VcsCall::Stage(expected)));
    Ok(())
}

#[tokio::test]
async fn tracked_artifact_removed_by_generation_is_still_staged() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new(|inv| {
        std::fs::write(inv.cwd.join("master.m3u"), "#EXTM3U\n")?;
        Ok(ProcessOutcome::exited(0))
    });
    let vcs = FakeVcs::new(&ws.work_dir, true).with_tracked(&["video_metadata.json"]);
    let cfg = ws
        .builder()
        .staged_paths(&["master.m3u", "video_metadata.json", "m3u_permanent"])
        .build();

    let report = publisher(cfg, &runner, &vcs).run().await?;

    let expected: Vec<PathBuf> = ["master.m3u", "video_metadata.json"]
        .iter()
        .map(PathBuf::from)
        .collect();
    assert_eq!(report.staged, expected);
    assert_eq!(report.commit, CommitOutcome::Committed);
    Ok(())
}

#[tokio::test]
async fn generation_without_outputs_has_nothing_to_stage() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::succeeding();
    let vcs = FakeVcs::new(&ws.work_dir, true);
    let cfg = ws.builder().staged_paths(&["master.m3u"]).build();

    let report = publisher(cfg, &runner, &vcs).run().await?;

    assert!(report.staged.is_empty());
    assert_eq!(report.commit, CommitOutcome::NothingToCommit);
    assert!(!vcs.calls().iter().any(|c| matches!(c, VcsCall::Stage(_))));
    assert_eq!(report.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn log_is_uploaded_then_removed_before_staging() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, true);

    let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

    assert!(!vcs.tree_at_stage().contains(&PathBuf::from("generate.log")));
    assert!(vcs.tree_at_stage().contains(&PathBuf::from("master.m3u")));
    assert!(!ws.file("generate.log").exists());

    let artifact = report.artifact.expect("log artifact uploaded");
    assert_eq!(artifact.name, "generate-log");
    assert!(artifact.path.starts_with(&ws.artifact_dir));
    assert_eq!(
        std::fs::read_to_string(&artifact.path)?,
        "INFO - Fetched 2 URLs\nINFO - Wrote 2 videos\n"
    );
    assert_eq!(
        (artifact.expires_at - artifact.created_at).num_hours(),
        24
    );
    Ok(())
}

#[tokio::test]
async fn failed_generation_uploads_log_and_skips_commit() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(1);
    let vcs = FakeVcs::new(&ws.work_dir, true);

    let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

    assert_eq!(
        report.generation,
        GenerationOutcome::Failed { exit_code: Some(1) }
    );
    assert_ne!(report.exit_code(), 0);
    assert_eq!(report.commit, CommitOutcome::NotAttempted);
    assert!(report.artifact.is_some());
    assert!(!ws.file("generate.log").exists());
    assert_eq!(vcs.calls(), vec![VcsCall::EnsureWorkTree]);
    Ok(())
}

#[tokio::test]
async fn unspawnable_generator_still_uploads_whatever_log_exists() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new(|inv| {
        if matches!(inv.output, OutputTarget::File(_)) {
            anyhow::bail!("No such file or directory (os error 2)");
        }
        Ok(ProcessOutcome::exited(0))
    });
    let vcs = FakeVcs::new(&ws.work_dir, true);

    let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

    assert_eq!(report.generation, GenerationOutcome::Failed { exit_code: None });
    // The redirect target was created before the spawn failed.
    assert!(report.artifact.is_some());
    assert_eq!(report.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn push_retries_absorb_transient_rejections() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);

    for failures in 1..3 {
        let vcs = FakeVcs::new(&ws.work_dir, true).failing_pushes(failures);
        let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

        assert_eq!(
            report.push,
            PushOutcome::Pushed {
                attempts: failures + 1
            }
        );
        assert_eq!(report.exit_code(), 0);
        assert_eq!(vcs.commits().len(), 1);
    }
    Ok(())
}

#[tokio::test]
async fn three_rejected_pushes_fail_the_run() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, true).failing_pushes(3);

    let report = publisher(ws.builder().build(), &runner, &vcs).run().await?;

    match &report.push {
        PushOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(*attempts, 3);
            assert!(last_error.contains("rejected"));
        }
        other => panic!("expected exhausted push, got {other:?}"),
    }
    assert_eq!(vcs.push_count(), 3);
    assert_ne!(report.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn single_attempt_policy_gives_up_after_one_rejection() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, true).failing_pushes(1);
    let cfg = ws.builder().push_attempts(1).build();

    let report = publisher(cfg, &runner, &vcs).run().await?;

    assert!(matches!(report.push, PushOutcome::Exhausted { attempts: 1, .. }));
    assert_eq!(vcs.push_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn push_attempts_are_spaced_by_the_fixed_delay() -> TestResult {
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, true).failing_pushes(2);
    let cfg = ws.builder().push_retry_delay("5s").build();

    let start = tokio::time::Instant::now();
    let report = publisher(cfg, &runner, &vcs).run().await?;

    assert_eq!(report.push, PushOutcome::Pushed { attempts: 3 });
    assert!(start.elapsed() >= std::time::Duration::from_secs(10));
    Ok(())
}

#[tokio::test]
async fn setup_failure_stops_before_generation() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new(|inv| match &inv.command {
        CommandSpec::Shell(cmd) if cmd.starts_with("pip") => Ok(ProcessOutcome::exited(2)),
        _ => Ok(ProcessOutcome::exited(0)),
    });
    let vcs = FakeVcs::new(&ws.work_dir, true);
    let cfg = ws.builder().setup("pip install urllib3 unidecode").build();

    let err = publisher(cfg, &runner, &vcs).run().await.unwrap_err();

    assert!(matches!(err, PublishError::SetupFailed { code: Some(2), .. }));
    assert_eq!(runner.calls().len(), 1);
    assert!(vcs.commits().is_empty());
    Ok(())
}

#[tokio::test]
async fn configured_remote_is_recloned_shallow() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    std::fs::write(ws.file("stale.txt"), "from a previous run")?;
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, false);
    let cfg = ws.builder().remote("https://example.com/vod.git").build();

    publisher(cfg, &runner, &vcs).run().await?;

    assert_eq!(
        vcs.calls()[0],
        VcsCall::Clone {
            remote: "https://example.com/vod.git".to_string(),
            depth: 1,
        }
    );
    assert!(!ws.file("stale.txt").exists());
    Ok(())
}

#[tokio::test]
async fn generation_runs_in_work_dir_with_log_redirect() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let runner = generating_runner(0);
    let vcs = FakeVcs::new(&ws.work_dir, false);

    publisher(ws.builder().build(), &runner, &vcs).run().await?;

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].cwd, ws.work_dir);
    assert_eq!(calls[0].command, CommandSpec::Shell(GENERATE.to_string()));
    assert_eq!(calls[0].output, OutputTarget::File(ws.file("generate.log")));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn hung_generation_is_killed_and_its_log_still_uploaded() -> TestResult {
    init_tracing();
    let ws = Workspace::new();
    let vcs = FakeVcs::new(&ws.work_dir, true);
    let cfg = ws.builder().timeout("500ms").build();
    let runner: Arc<dyn ProcessRunner> = Arc::new(vodpublish::exec::TokioProcessRunner);
    let publisher = Publisher::new(
        cfg,
        CommandSpec::Shell("echo partial-progress >&2; sleep 30".to_string()),
        runner,
        Arc::new(vcs.clone()),
        Arc::new(RealFileSystem),
    );

    let err = with_timeout(publisher.run()).await.unwrap_err();

    assert!(matches!(err, PublishError::Timeout(_)));
    assert!(vcs.commits().is_empty());
    assert!(!ws.file("generate.log").exists());

    let uploaded = publisher.artifacts().list("generate-log")?;
    assert_eq!(uploaded.len(), 1);
    assert!(std::fs::read_to_string(&uploaded[0].path)?.contains("partial-progress"));
    Ok(())
}
