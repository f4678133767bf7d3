//! Developer automation for the Courier workspace.
//!
//! Run with: `cargo xtask <task>`
//!
//! Output goes to the terminal with `println!`/`eprintln!`; this binary is
//! never linked into the SDK.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};

mod features;

/// A named cargo invocation plus the message shown when it fails.
struct Step {
    label: &'static str,
    args: &'static [&'static str],
    failure: &'static str,
}

const FMT: Step = Step {
    label: "format",
    args: &["fmt", "--all", "--", "--check"],
    failure: "formatting differs; run `cargo fmt --all`",
};

const CLIPPY: Step = Step {
    label: "clippy",
    args: &["clippy", "--workspace", "--all-targets", "--all-features", "--", "-D", "warnings"],
    failure: "clippy reported warnings",
};

const TEST: Step = Step {
    label: "tests",
    args: &["test", "--workspace", "--all-features"],
    failure: "test suite failed",
};

fn main() -> ExitCode {
    let outcome = match env::args().nth(1).as_deref() {
        Some("ci") => run_ci(),
        Some("fmt") => run_step(&FMT),
        Some("clippy") => run_step(&CLIPPY),
        Some("test") => run_step(&TEST),
        Some("test-features") => features::check_common_tiers(),
        Some("help") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("unknown task `{other}`\n");
            print_usage();
            Err(anyhow::anyhow!("unknown task"))
        }
    };

    if let Err(err) = outcome {
        eprintln!("xtask failed: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn print_usage() {
    println!("cargo xtask <task>\n");
    println!("  ci             fmt, clippy, test and test-features in order");
    println!("  fmt            check formatting");
    println!("  clippy         lint every target with warnings denied");
    println!("  test           run the workspace test suite");
    println!("  test-features  build each courier-common feature tier alone");
}

fn run_ci() -> Result<()> {
    for (index, step) in [&FMT, &CLIPPY, &TEST].into_iter().enumerate() {
        println!("==> [{}/4] {}", index + 1, step.label);
        run_step(step)?;
    }
    println!("==> [4/4] feature tiers");
    features::check_common_tiers()?;

    println!("\nCI checks passed");
    Ok(())
}

fn run_step(step: &Step) -> Result<()> {
    let status = Command::new("cargo")
        .args(step.args)
        .status()
        .with_context(|| format!("could not launch cargo for {}", step.label))?;

    if !status.success() {
        bail!("{}", step.failure);
    }
    Ok(())
}
