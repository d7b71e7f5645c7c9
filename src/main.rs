mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tarry_config::{PlanDef, PollConfig, ProbeDef, WaitMode};
use tarry_core::Deadline;
use tarry_dsl::Await;
use tarry_probe::{CommandProbe, registry_from_plan};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::report::Report;

/// Tarry - wait for commands to succeed
#[derive(Parser)]
#[command(name = "tarry")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the defaults file (default: <config_dir>/tarry/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Retry a single command until it exits successfully
  Exec {
    #[command(flatten)]
    timing: TimingArgs,

    /// Also require stdout to contain this text
    #[arg(long)]
    expect_stdout: Option<String>,

    /// The program and its arguments, after `--`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    argv: Vec<String>,
  },

  /// Run a wait plan and print a JSON report
  Run {
    /// Path to the plan file (JSON)
    plan_file: PathBuf,

    #[command(flatten)]
    timing: TimingArgs,

    /// Maximum number of probes polling at once
    #[arg(long, env = "TARRY_MAX_WORKERS")]
    max_workers: Option<usize>,
  },
}

#[derive(Args)]
struct TimingArgs {
  /// Give up after this many milliseconds
  #[arg(long, env = "TARRY_TIMEOUT_MS")]
  timeout_ms: Option<u64>,

  /// Wait this many milliseconds between attempts
  #[arg(long, env = "TARRY_INTERVAL_MS")]
  interval_ms: Option<u64>,
}

impl TimingArgs {
  fn to_config(&self, max_workers: Option<usize>) -> PollConfig {
    PollConfig {
      interval_ms: self.interval_ms,
      timeout_ms: self.timeout_ms,
      max_workers,
    }
  }
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tarry=info,tarry_core=info,tarry_probe=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();
  let defaults = load_defaults(cli.config.as_deref())?;

  match cli.command {
    Some(Commands::Exec {
      timing,
      expect_stdout,
      argv,
    }) => {
      let config = defaults.merge(timing.to_config(None));
      config.validate()?;
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(exec(config, argv, expect_stdout))
    }
    Some(Commands::Run {
      plan_file,
      timing,
      max_workers,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_plan(
        &plan_file,
        defaults,
        timing.to_config(max_workers),
      ))
    }
    None => {
      println!("tarry - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

async fn exec(
  config: PollConfig,
  argv: Vec<String>,
  expect_stdout: Option<String>,
) -> Result<ExitCode> {
  let (program, args) = argv.split_first().context("no command given")?;
  let mut def = ProbeDef::new(program.clone(), program.clone()).with_args(args.iter().cloned());
  def.expect_stdout = expect_stdout;
  let probe = CommandProbe::new(def);

  let root = root_deadline();
  info!(command = %program, timeout = ?config.timeout(), interval = ?config.interval(), "waiting for command");

  let output = Await::with_deadline(&root)
    .with_config(&config)
    .until_ok(move |_| {
      let probe = probe.clone();
      async move { probe.run().await }
    })
    .await
    .with_context(|| format!("{program} never succeeded"))?;

  print!("{}", output.stdout);
  Ok(ExitCode::SUCCESS)
}

async fn run_plan(plan_file: &Path, defaults: PollConfig, flags: PollConfig) -> Result<ExitCode> {
  let content = tokio::fs::read_to_string(plan_file)
    .await
    .with_context(|| format!("failed to read plan file: {}", plan_file.display()))?;

  let plan = PlanDef::from_json(&content)
    .with_context(|| format!("invalid plan file: {}", plan_file.display()))?;

  let config = defaults.merge(plan.poll).merge(flags);
  config.validate()?;

  info!(
    probes = plan.probes.len(),
    mode = ?plan.mode,
    timeout = ?config.timeout(),
    interval = ?config.interval(),
    "loaded plan"
  );

  let root = root_deadline();
  let wait = Await::with_deadline(&root).with_config(&config);
  let workers = registry_from_plan(&plan);

  let report = match plan.mode {
    WaitMode::Once => {
      let probe = CommandProbe::new(plan.probes[0].clone());
      let result = wait
        .until_ok(move |_| {
          let probe = probe.clone();
          async move { probe.run().await }
        })
        .await;
      Report::single(WaitMode::Once, result)
    }
    WaitMode::All => Report::all(wait.all(&workers).await),
    WaitMode::First => Report::single(WaitMode::First, wait.first(&workers).await),
  };

  println!("{}", serde_json::to_string_pretty(&report)?);

  if report.ok {
    Ok(ExitCode::SUCCESS)
  } else {
    warn!(mode = ?plan.mode, "wait failed");
    Ok(ExitCode::FAILURE)
  }
}

/// A deadline that is cancelled on Ctrl-C.
fn root_deadline() -> Deadline {
  let root = Deadline::new();
  let trigger = root.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupted, cancelling");
      trigger.cancel();
    }
  });
  root
}

fn default_config_path() -> Option<PathBuf> {
  dirs::config_dir().map(|dir| dir.join("tarry").join("config.json"))
}

/// Load the defaults file. A missing file at the default location is not an
/// error; a missing file that was asked for explicitly is.
fn load_defaults(explicit: Option<&Path>) -> Result<PollConfig> {
  let path = match explicit {
    Some(path) => path.to_path_buf(),
    None => match default_config_path() {
      Some(path) if path.exists() => path,
      _ => return Ok(PollConfig::default()),
    },
  };

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;

  PollConfig::from_json(&content)
    .with_context(|| format!("invalid config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_explicit_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"interval_ms": 5, "timeout_ms": 100}"#).unwrap();

    let config = load_defaults(Some(&path)).unwrap();

    assert_eq!(config.interval_ms, Some(5));
    assert_eq!(config.timeout_ms, Some(100));
  }

  #[test]
  fn test_missing_explicit_defaults_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    assert!(load_defaults(Some(&path)).is_err());
  }

  #[test]
  fn test_layering() {
    let defaults = PollConfig {
      interval_ms: Some(50),
      timeout_ms: Some(1000),
      max_workers: Some(8),
    };
    let plan = PollConfig {
      timeout_ms: Some(2000),
      ..PollConfig::default()
    };
    let flags = TimingArgs {
      timeout_ms: None,
      interval_ms: Some(10),
    }
    .to_config(None);

    let config = defaults.merge(plan).merge(flags);

    assert_eq!(config.interval_ms, Some(10));
    assert_eq!(config.timeout_ms, Some(2000));
    assert_eq!(config.max_workers, Some(8));
  }

  #[test]
  fn test_cli_parses_exec() {
    let cli = Cli::try_parse_from([
      "tarry",
      "exec",
      "--timeout-ms",
      "500",
      "--",
      "pg_isready",
      "-h",
      "localhost",
    ])
    .unwrap();

    match cli.command {
      Some(Commands::Exec { timing, argv, .. }) => {
        assert_eq!(timing.timeout_ms, Some(500));
        assert_eq!(argv, vec!["pg_isready", "-h", "localhost"]);
      }
      _ => panic!("expected exec"),
    }
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_run_plan_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    std::fs::write(
      &path,
      r#"{"mode": "all", "timeout_ms": 50, "interval_ms": 10, "probes": [{"name": "never", "command": "false"}]}"#,
    )
    .unwrap();

    let code = run_plan(&path, PollConfig::default(), PollConfig::default())
      .await
      .unwrap();

    assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
  }
}
