use clap::Subcommand;
use enzolearn::dto::CollectionDto;

use crate::client::EnzoLearnClient;
use crate::output::{self, OutputConfig};

/// Collection management commands
#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// List your collections
    List,
    /// Show one collection
    Show {
        /// The collection ID
        id: String,
    },
    /// Create a new collection
    Create {
        #[clap(long)]
        title: String,
        #[clap(long)]
        description: Option<String>,
        /// Accent color, e.g. "#3b82f6"
        #[clap(long)]
        color: Option<String>,
        #[clap(long)]
        icon: Option<String>,
    },
    /// Delete a collection and everything in it
    Delete {
        /// The collection ID
        id: String,
    },
    /// List the study items of a collection
    Items {
        /// The collection ID
        id: String,
    },
}

/// Executes a collection command
pub async fn execute(
    client: &EnzoLearnClient,
    cmd: CollectionCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CollectionCommands::List => {
            let collections = client.list_collections().await?;
            output::print_collections(&collections, config);
        }
        CollectionCommands::Show { id } => {
            let collection = client.get_collection(&id).await?;
            output::print_collection(&collection, config);
        }
        CollectionCommands::Create { title, description, color, icon } => {
            let dto = CollectionDto { title: Some(title), description, color, icon };
            let collection = client.create_collection(&dto).await?;
            output::print_collection(&collection, config);
        }
        CollectionCommands::Delete { id } => {
            let message = client.delete_collection(&id).await?;
            output::print_success(&message, config);
        }
        CollectionCommands::Items { id } => {
            let items = client.list_collection_items(&id).await?;
            output::print_study_items(&items, config);
        }
    }
    Ok(())
}
