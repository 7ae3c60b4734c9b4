use std::process;

use anyhow::Result;
use clap::{ArgMatches, Command};

const BIN_NAME: &str = "bulky";

/// A named `cargo` invocation run by `test all`.
struct Suite {
    name: &'static str,
    args: &'static [&'static str],
}

const SUITES: &[Suite] = &[
    Suite { name: "core", args: &["test", "--package", "bulky-core"] },
    Suite { name: "bin", args: &["test", "--package", "bulky-bin"] },
    Suite { name: "workspace", args: &["test", "--workspace"] },
    Suite { name: "doc", args: &["test", "--doc", "--package", "bulky-core"] },
];

// Smoke checks against the built binary.
const CLI_CHECKS: &[&[&str]] = &[
    &["--help"],
    &["--version"],
    &["replace", "--help"],
    &["remove", "--help"],
    &["insert", "--help"],
    &["case", "--help"],
];

fn main() -> Result<()> {
    let args = clap::command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("install").about("Install the bulky binary locally"))
        .subcommand(
            Command::new("run")
                .about("Build and run bulky with arguments")
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .arg(clap::Arg::new("args")
                    .help("Arguments to pass to bulky")
                    .action(clap::ArgAction::Append)
                    .num_args(0..))
        )
        .subcommand(
            Command::new("test")
                .about("Test Operations")
                .subcommand(Command::new("all").about("Run every test suite and the CLI smoke checks"))
                .subcommand(Command::new("core").about("Run tests for bulky-core"))
                .subcommand(Command::new("bin").about("Run tests for bulky-bin"))
                .subcommand(Command::new("integration").about("Build bulky and run the CLI smoke checks"))
        )
        .get_matches();

    match args.subcommand() {
        Some(("install", _args)) => cargo(&["install", "--path", "crates/bulky-bin"], "install bulky"),
        Some(("run", args)) => handle_run_command(args),
        Some(("test", args)) => handle_test_commands(args),
        Some((command, _)) => anyhow::bail!("Unexpected command: {command}"),
        None => anyhow::bail!("Expected subcommand"),
    }
}

fn cargo(args: &[&str], what: &str) -> Result<()> {
    let status = process::Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("Failed to {what}");
    }
    Ok(())
}

fn handle_run_command(args: &ArgMatches) -> Result<()> {
    let mut command = vec!["run", "--bin", BIN_NAME, "--"];
    if let Some(values) = args.get_many::<String>("args") {
        command.extend(values.map(String::as_str));
    }
    cargo(&command, "run bulky")
}

fn handle_test_commands(args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("all", _args)) => test_all(),
        Some(("integration", _args)) => test_cli(),
        Some((name, _args)) => run_suite(name),
        None => {
            println!("Available test commands:");
            println!("  all          - Run every test suite and the CLI smoke checks");
            println!("  core         - Run tests for bulky-core");
            println!("  bin          - Run tests for bulky-bin");
            println!("  integration  - Build bulky and run the CLI smoke checks");
            Ok(())
        }
    }
}

fn run_suite(name: &str) -> Result<()> {
    let suite = SUITES
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| anyhow::anyhow!("Unknown test suite: {name}"))?;
    println!("🧪 Running {} tests...", suite.name);
    cargo(suite.args, &format!("pass {} tests", suite.name))
}

fn test_cli() -> Result<()> {
    cargo(&["build", "--bin", BIN_NAME], "build bulky")?;
    for check in CLI_CHECKS {
        let mut command = vec!["run", "--quiet", "--bin", BIN_NAME, "--"];
        command.extend_from_slice(check);
        cargo(&command, &format!("run `bulky {}`", check.join(" ")))?;
    }
    Ok(())
}

fn test_all() -> Result<()> {
    let mut failed = Vec::new();

    for suite in SUITES {
        match run_suite(suite.name) {
            Ok(()) => println!("✅ {} tests passed\n", suite.name),
            Err(e) => {
                println!("❌ {e}\n");
                failed.push(suite.name);
            }
        }
    }

    println!("🔗 Running CLI smoke checks...");
    if let Err(e) = test_cli() {
        println!("❌ {e}\n");
        failed.push("cli");
    }

    if failed.is_empty() {
        println!("🎉 All tests passed successfully!");
        Ok(())
    } else {
        anyhow::bail!("Test suite failed: {}", failed.join(", "))
    }
}
