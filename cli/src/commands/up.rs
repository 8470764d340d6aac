//! Up command - start every service of a group, or those matching a prefix.

use anyhow::Result;
use kfwd_core::{find_group, find_services_with_prefix, platform_manager, ForwardRequest};

use super::Context;

pub async fn run(ctx: &Context, group_name: &str, prefix: Option<&str>) -> Result<()> {
    // Resolve everything before the first spawn.
    let config = ctx.groups().await?;
    let group = find_group(&config, group_name)?;
    let requests: Vec<ForwardRequest> = find_services_with_prefix(group, prefix)?
        .into_iter()
        .map(|service| ForwardRequest::for_service(service, group.context.as_deref()))
        .collect();

    let outcome = platform_manager(&ctx.settings).start_batch(&requests).await?;

    for request in &outcome.started {
        println!(
            "Forwarding {} localhost:{} -> {}",
            request.service_name, request.local_port, request.remote_port
        );
    }

    if !outcome.failed.is_empty() {
        println!(
            "Started {} of {} port-forwards.",
            outcome.started.len(),
            outcome.attempted()
        );
    }
    Ok(())
}
