use std::process;

use anyhow::Result;
use clap::{ArgMatches, Command};

const BIN_NAME: &str = "f2";

fn main() -> Result<()> {
    let args = clap::command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("install").about("Install the f2 binary locally"))
        .subcommand(
            Command::new("run")
                .about("Build and run f2 with arguments")
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .arg(clap::Arg::new("args")
                    .help("Arguments to pass to f2")
                    .action(clap::ArgAction::Append)
                    .num_args(0..))
        )
        .subcommand(
            Command::new("test")
                .about("Test Operations")
                .subcommand(Command::new("all").about("Run every test suite in the workspace"))
                .subcommand(Command::new("core").about("Run tests for f2-core"))
                .subcommand(Command::new("bin").about("Run tests for f2-bin"))
                .subcommand(Command::new("smoke").about("Build f2 and check the CLI starts"))
        )
        .get_matches();

    match args.subcommand() {
        Some(("install", args)) => handle_install_command(args),
        Some(("run", args)) => handle_run_command(args),
        Some(("test", args)) => handle_test_commands(args),
        Some((command, _)) => anyhow::bail!("Unexpected command: {command}"),
        None => anyhow::bail!("Expected subcommand"),
    }
}

fn cargo(args: &[&str], failure: &str) -> Result<()> {
    let status = process::Command::new("cargo").args(args).status()?;

    if !status.success() {
        anyhow::bail!("{failure}");
    }

    Ok(())
}

fn handle_install_command(_args: &ArgMatches) -> Result<()> {
    println!("Installing {BIN_NAME}...");
    cargo(&["install", "--path", "crates/f2-bin"], "Failed to install f2")?;
    println!("✓ {BIN_NAME} installed successfully");
    Ok(())
}

fn handle_run_command(args: &ArgMatches) -> Result<()> {
    let run_args: Vec<String> = args.get_many::<String>("args")
        .map_or(Vec::new(), |vals| vals.cloned().collect());

    let mut command = process::Command::new("cargo");
    command.args(["run", "--bin", BIN_NAME, "--"]);
    command.args(&run_args);

    if !command.status()?.success() {
        anyhow::bail!("Failed to run {BIN_NAME}");
    }

    Ok(())
}

fn handle_test_commands(args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("all", _args)) => test_all(),
        Some(("core", _args)) => test_core(),
        Some(("bin", _args)) => test_bin(),
        Some(("smoke", _args)) => test_smoke(),
        _ => {
            println!("Available test commands:");
            println!("  all    - Run every test suite in the workspace");
            println!("  core   - Run tests for f2-core");
            println!("  bin    - Run tests for f2-bin");
            println!("  smoke  - Build f2 and check the CLI starts");
            Ok(())
        }
    }
}

fn test_all() -> Result<()> {
    let suites: [(&str, fn() -> Result<()>); 4] = [
        ("f2-core", test_core),
        ("f2-bin", test_bin),
        ("doc", test_docs),
        ("smoke", test_smoke),
    ];

    let mut failed = Vec::new();
    for (name, suite) in suites {
        println!("🧪 Running {name} tests...");
        match suite() {
            Ok(()) => println!("✅ {name} tests passed\n"),
            Err(err) => {
                println!("❌ {name} tests failed: {err}\n");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Test suites failed: {}", failed.join(", "));
    }

    println!("🎉 All tests passed successfully!");
    Ok(())
}

fn test_core() -> Result<()> {
    cargo(&["test", "--package", "f2-core"], "Core tests failed")
}

fn test_bin() -> Result<()> {
    cargo(&["test", "--package", "f2-bin"], "Binary tests failed")
}

fn test_docs() -> Result<()> {
    cargo(&["test", "--doc", "--package", "f2-core"], "Documentation tests failed")
}

fn test_smoke() -> Result<()> {
    cargo(&["build", "--bin", BIN_NAME], "Failed to build f2")?;
    cargo(&["run", "--bin", BIN_NAME, "--", "--help"], "CLI help command failed")?;
    cargo(&["run", "--bin", BIN_NAME, "--", "rename", "--help"], "CLI rename help command failed")?;
    cargo(&["run", "--bin", BIN_NAME, "--", "--version"], "CLI version command failed")
}
