mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{ConfigMerger, RunArgsView};
use fieldfix_core::adapters::TracingReporter;
use fieldfix_core::{RunError, run_remote};
use fieldfix_domain::Engine;
use fieldfix_render::render_summary_line;
use fieldfix_types::{ReplacementRule, RuleSet, ValidationRule};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fieldfix",
    version,
    about = "Rule-gated bulk find-and-replace for Jira issue fields."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Select issues by JQL and rewrite matching field text.
    Run(RunArgs),
    /// Validate rules without contacting the server.
    Check(CheckArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// JQL query selecting the issues to process.
    #[arg(long)]
    jql: String,

    /// Literal replacement: FIELD OLD NEW. Repeatable; applied in order.
    #[arg(
        long = "replace",
        num_args = 3,
        value_names = ["FIELD", "OLD", "NEW"],
        allow_hyphen_values = true
    )]
    replace: Vec<String>,

    /// Validation rule: FIELD PATTERN. Every rule must match before an issue changes.
    #[arg(
        long = "test",
        num_args = 2,
        value_names = ["FIELD", "PATTERN"],
        allow_hyphen_values = true
    )]
    test: Vec<String>,

    /// TOML file with [[replacements]] and [[tests]] tables.
    #[arg(long)]
    rules: Option<Utf8PathBuf>,

    /// Report would-be changes without updating any issue.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Tracker base URL.
    #[arg(long, env = "FIELDFIX_SERVER")]
    server: Option<String>,

    /// Username for basic auth. Without it the token is sent as a bearer token.
    #[arg(long = "user", env = "FIELDFIX_USER")]
    user: Option<String>,

    /// API token or password.
    #[arg(long, env = "FIELDFIX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Directory holding fieldfix.toml (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// TOML file with [[replacements]] and [[tests]] tables.
    #[arg(long)]
    rules: Option<Utf8PathBuf>,

    /// Validation rule: FIELD PATTERN. Repeatable.
    #[arg(
        long = "test",
        num_args = 2,
        value_names = ["FIELD", "PATTERN"],
        allow_hyphen_values = true
    )]
    test: Vec<String>,

    /// Directory holding fieldfix.toml (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let file_config =
        config::load_or_default(&args.repo_root).context("load fieldfix.toml config")?;
    let file_rules = load_optional_rules(args.rules.as_ref())?;

    let cli = RunArgsView {
        query: args.jql,
        rules: RuleSet {
            replacements: replacements_from_args(&args.replace),
            tests: tests_from_args(&args.test),
        },
        dry_run: args.dry_run,
        server: args.server,
        username: args.user,
        token: args.token,
    };
    let merged = ConfigMerger::new(file_config)
        .with_rules(file_rules)
        .merge_run_args(cli);

    debug!("merged config: {:?}", merged);

    if merged.run.replacements.is_empty() {
        anyhow::bail!(
            "no replacements given; pass --replace or list [[replacements]] in a rules file"
        );
    }

    match run_remote(&merged.run, &merged.store, &TracingReporter) {
        Ok(summary) => {
            println!("{}", render_summary_line(&summary));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_run_error(&e)),
    }
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let file_config =
        config::load_or_default(&args.repo_root).context("load fieldfix.toml config")?;
    let file_rules = load_optional_rules(args.rules.as_ref())?;

    let rules = ConfigMerger::new(file_config)
        .with_rules(file_rules)
        .merge_rules(RuleSet {
            replacements: Vec::new(),
            tests: tests_from_args(&args.test),
        });

    match Engine::new(&rules.tests, rules.replacements) {
        Ok(engine) => {
            info!("{} validation rule(s) compiled", engine.tests().len());
            println!(
                "ok - validation rules: {}, replacements: {}",
                engine.tests().len(),
                engine.replacements().len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_run_error(&RunError::from(e))),
    }
}

fn report_run_error(err: &RunError) -> ExitCode {
    error!("{}", err);
    ExitCode::from(err.exit_code())
}

fn load_optional_rules(path: Option<&Utf8PathBuf>) -> anyhow::Result<RuleSet> {
    match path {
        Some(path) => config::load_rules(path),
        None => Ok(RuleSet::default()),
    }
}

// clap guarantees whole groups because num_args is fixed.
fn replacements_from_args(values: &[String]) -> Vec<ReplacementRule> {
    values
        .chunks_exact(3)
        .map(|c| ReplacementRule::new(&c[0], &c[1], &c[2]))
        .collect()
}

fn tests_from_args(values: &[String]) -> Vec<ValidationRule> {
    values
        .chunks_exact(2)
        .map(|c| ValidationRule::new(&c[0], &c[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replace_args_group_in_threes() {
        let cli = Cli::try_parse_from([
            "fieldfix", "run", "--jql", "project = OPS", "--replace", "summary", "v1.2", "v1.3",
            "--replace", "description", "-old", "-new",
        ])
        .expect("parse");
        let Command::Run(args) = cli.cmd else {
            panic!("expected run");
        };
        assert_eq!(
            replacements_from_args(&args.replace),
            vec![
                ReplacementRule::new("summary", "v1.2", "v1.3"),
                ReplacementRule::new("description", "-old", "-new"),
            ]
        );
    }

    #[test]
    fn test_args_group_in_pairs() {
        let cli = Cli::try_parse_from([
            "fieldfix", "check", "--test", "status", "^Open$", "--test", "labels", "ops",
        ])
        .expect("parse");
        let Command::Check(args) = cli.cmd else {
            panic!("expected check");
        };
        assert_eq!(
            tests_from_args(&args.test),
            vec![
                ValidationRule::new("status", "^Open$"),
                ValidationRule::new("labels", "ops"),
            ]
        );
    }

    #[test]
    fn replace_with_two_values_is_rejected() {
        let err = Cli::try_parse_from([
            "fieldfix", "run", "--jql", "x", "--replace", "summary", "v1.2",
        ])
        .expect_err("needs three values");
        assert!(err.to_string().contains("--replace"));
    }

    #[test]
    fn run_requires_jql() {
        let err = Cli::try_parse_from(["fieldfix", "run", "--replace", "a", "b", "c"])
            .expect_err("missing jql");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
