//! Groups command - show what the grouping file declares.

use anyhow::Result;

use super::Context;

pub async fn run(ctx: &Context, json: bool) -> Result<()> {
    let config = ctx.groups().await?;

    if json {
        let groups: Vec<_> = config.iter().collect();
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    for (i, group) in config.iter().enumerate() {
        if i > 0 {
            println!();
        }
        match &group.context {
            Some(context) => println!("{} (context: {})", group.name, context),
            None => println!("{}", group.name),
        }
        for service in &group.services {
            println!(
                "  {:<30} {:>5} -> {}",
                service.name, service.local_port, service.remote_port
            );
        }
    }
    Ok(())
}
