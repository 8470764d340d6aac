//! List command - show running port-forward tunnels.

use anyhow::Result;
use kfwd_core::platform_manager;

use super::Context;

pub async fn run(ctx: &Context, all: bool, json: bool) -> Result<()> {
    let manager = platform_manager(&ctx.settings);
    let forwards = if all {
        manager.scan().await?
    } else {
        manager.list().await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&forwards)?);
        return Ok(());
    }

    if forwards.is_empty() {
        println!("No port-forwards running.");
        return Ok(());
    }

    // Table header
    if all {
        println!("{:<8} {:<30} {:<12} {:<12}", "PID", "SERVICE", "LOCAL", "REMOTE");
        println!("{}", "-".repeat(64));
    } else {
        println!("{:<30} {:<12} {:<12}", "SERVICE", "LOCAL", "REMOTE");
        println!("{}", "-".repeat(56));
    }

    for forward in &forwards {
        let service = truncate(&forward.service_name, 30);
        if all {
            let pid = forward.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
            println!(
                "{:<8} {:<30} {:<12} {:<12}",
                pid, service, forward.local_port, forward.remote_port
            );
        } else {
            println!(
                "{:<30} {:<12} {:<12}",
                service, forward.local_port, forward.remote_port
            );
        }
    }

    let noun = if all { "processes" } else { "tunnels" };
    println!("\nTotal: {} {}", forwards.len(), noun);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("api", 30), "api");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
