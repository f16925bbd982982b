// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod generate;
pub mod logging;
pub mod publish;
pub mod schedule;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_or_default};
use crate::exec::{CommandSpec, ProcessRunner, TokioProcessRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::generate::{Generator, HttpFetcher};
use crate::publish::{GitCli, Publisher};

/// High-level entry point used by `main.rs`.
///
/// Returns the process exit status.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;

    match args.command {
        Command::Check => {
            let generate_command = resolve_generate_command(&cfg, &config_path)?;
            print_plan(&cfg, &generate_command);
            Ok(0)
        }
        Command::Generate => Ok(run_generate(cfg).await),
        Command::Run => {
            let publisher = build_publisher(cfg, &config_path)?;
            run_publish(&publisher).await
        }
        Command::Daemon { now } => {
            let schedule = crate::schedule::parse_schedule(&cfg.publish.schedule)?;
            let publisher = build_publisher(cfg, &config_path)?;

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                    std::future::pending::<()>().await;
                }
            };

            crate::schedule::run_scheduled(
                &schedule,
                now,
                || run_publish(&publisher),
                shutdown,
            )
            .await?;
            Ok(0)
        }
    }
}

fn build_publisher(cfg: ConfigFile, config_path: &Path) -> Result<Publisher> {
    let generate_command = resolve_generate_command(&cfg, config_path)?;
    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner);
    let vcs = Arc::new(GitCli::new(Arc::clone(&runner), &cfg.publish.work_dir));
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    Ok(Publisher::new(cfg, generate_command, runner, vcs, fs))
}

async fn run_publish(publisher: &Publisher) -> Result<i32> {
    let report = publisher.run().await?;
    info!(
        generation = ?report.generation,
        commit = ?report.commit,
        push = ?report.push,
        artifact = ?report.artifact.as_ref().map(|a| &a.path),
        "publish run finished"
    );
    Ok(report.exit_code())
}

/// The generation step's command.
///
/// An explicit `[generate].command` runs through the shell; otherwise this
/// binary is re-invoked with `generate` so the step keeps its own process,
/// exit status and log stream.
pub fn resolve_generate_command(cfg: &ConfigFile, config_path: &Path) -> Result<CommandSpec> {
    if let Some(cmd) = &cfg.generate.command {
        return Ok(CommandSpec::Shell(cmd.clone()));
    }

    let exe = std::env::current_exe().context("locating the vodpublish executable")?;
    let mut args = Vec::new();
    if config_path.exists() {
        // The child runs inside the work dir, so pass an absolute path.
        let abs = std::fs::canonicalize(config_path)
            .with_context(|| format!("canonicalizing {:?}", config_path))?;
        args.push("--config".to_string());
        args.push(abs.display().to_string());
    }
    args.push("generate".to_string());
    Ok(CommandSpec::exec(exe, args))
}

/// Run the built-in generator in the current directory.
///
/// Errors are logged rather than returned so that they land in the
/// generation log; the exit status carries the failure.
pub async fn run_generate(cfg: ConfigFile) -> i32 {
    let settings = cfg.generate;
    let fetcher = match HttpFetcher::new(settings.fetch_timeout, &settings.user_agent) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "generation failed");
            return 1;
        }
    };

    let generator = Generator::new(fetcher, Arc::new(RealFileSystem), settings, ".");
    match generator.run().await {
        Ok(summary) => {
            info!(
                videos = summary.videos,
                failed_sources = summary.failed_sources,
                "generation complete"
            );
            0
        }
        Err(e) => {
            error!(error = %e, "generation failed");
            1
        }
    }
}

/// `check` output: the validated config and what a run would execute.
fn print_plan(cfg: &ConfigFile, generate_command: &CommandSpec) {
    println!("vodpublish check");
    println!("  schedule    = {}", cfg.publish.schedule);
    println!("  timeout     = {:?}", cfg.publish.run_timeout);
    println!("  work_dir    = {}", cfg.publish.work_dir.display());
    match &cfg.checkout {
        Some(c) => println!(
            "  checkout    = {} (depth {}, branch {})",
            c.remote,
            c.depth,
            c.branch.as_deref().unwrap_or("<default>")
        ),
        None => println!("  checkout    = <existing working tree>"),
    }
    println!();

    println!("steps:");
    for cmd in cfg.setup.iter() {
        println!("  - setup: {cmd}");
    }
    println!(
        "  - generate: {generate_command} > {}",
        cfg.generate.log_file.display()
    );
    if cfg.generate.command.is_none() {
        for source in cfg.generate.sources.iter() {
            println!(
                "      source: {} [{}]",
                source.url,
                source.group.as_deref().unwrap_or("Unknown")
            );
        }
    }
    println!(
        "  - upload artifact '{}' to {} (retained {:?})",
        cfg.artifact.name,
        cfg.artifact.dir.display(),
        cfg.artifact.retention
    );
    println!("  - delete {}", cfg.generate.log_file.display());
    let paths: Vec<String> = cfg.git.paths.iter().map(|p| p.display().to_string()).collect();
    println!("  - stage {}", paths.join(" "));
    println!("  - commit as {}: {:?}", cfg.git.identity, cfg.git.message);
    println!(
        "  - push ({} attempt(s), {:?} apart)",
        cfg.git.push_attempts, cfg.git.push_retry_delay
    );

    debug!("check complete (no execution)");
}
