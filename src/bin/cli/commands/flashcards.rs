use clap::Subcommand;

use crate::client::EnzoLearnClient;
use crate::output::{self, OutputConfig};

/// Flashcard set commands
#[derive(Subcommand, Debug)]
pub enum FlashcardCommands {
    /// List your flashcard sets
    List,
    /// Show a set with its cards
    Show {
        /// The set ID
        id: String,
    },
    /// Delete a set
    Delete {
        /// The set ID
        id: String,
    },
}

/// Executes a flashcard command
pub async fn execute(
    client: &EnzoLearnClient,
    cmd: FlashcardCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        FlashcardCommands::List => {
            let sets = client.list_flashcard_sets().await?;
            output::print_flashcard_sets(&sets, config);
        }
        FlashcardCommands::Show { id } => {
            let set = client.get_flashcard_set(&id).await?;
            output::print_flashcard_set(&set, config);
        }
        FlashcardCommands::Delete { id } => {
            let message = client.delete_flashcard_set(&id).await?;
            output::print_success(&message, config);
        }
    }
    Ok(())
}
