//! Stop commands - kill tunnels by service prefix, or all of them.

use anyhow::Result;
use kfwd_core::{platform_manager, StopOutcome};

use super::Context;

pub async fn run(ctx: &Context, prefix: &str) -> Result<()> {
    let outcome = platform_manager(&ctx.settings).stop(prefix).await?;

    if outcome.nothing_matched() {
        println!("No port-forwards matching '{}'.", prefix);
    } else {
        report(&outcome);
    }
    Ok(())
}

pub async fn run_all(ctx: &Context) -> Result<()> {
    let outcome = platform_manager(&ctx.settings).stop_all().await?;

    if outcome.nothing_matched() {
        println!("No port-forwards running.");
    } else {
        report(&outcome);
    }
    Ok(())
}

fn report(outcome: &StopOutcome) {
    let noun = if outcome.tunnels == 1 { "port-forward" } else { "port-forwards" };
    println!("Stopped {} {}.", outcome.tunnels, noun);
}
