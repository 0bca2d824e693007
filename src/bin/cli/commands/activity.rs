use clap::Args;

use crate::client::EnzoLearnClient;
use crate::output::{self, OutputConfig};

/// Show recent activity
#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// How many entries to show (1 to 100)
    #[clap(long, short = 'n')]
    limit: Option<i64>,
}

pub async fn execute(
    client: &EnzoLearnClient,
    args: ActivityArgs,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let activities = client.list_activity(args.limit).await?;
    output::print_activities(&activities, config);
    Ok(())
}
