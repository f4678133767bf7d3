use std::process::Command;

use anyhow::{bail, Context, Result};

/// `courier-common` tiers in dependency order. The empty entry is the bare
/// crate with every optional dependency disabled.
const TIERS: &[&str] = &["", "foundation", "runtime", "test-utils"];

/// Build `courier-common` once per tier with default features off.
pub fn check_common_tiers() -> Result<()> {
    for tier in TIERS {
        let name = if tier.is_empty() { "none" } else { tier };
        println!("    courier-common tier: {name}");

        let mut cargo = Command::new("cargo");
        cargo.args(["check", "--quiet", "-p", "courier-common", "--no-default-features"]);
        if !tier.is_empty() {
            cargo.args(["--features", tier]);
        }

        let status = cargo.status().with_context(|| format!("could not run cargo check for tier {name}"))?;
        if !status.success() {
            bail!("courier-common does not build with tier {name}");
        }
    }

    println!("    all {} tiers build", TIERS.len());
    Ok(())
}
