use clap::Subcommand;
use std::io::Read;
use std::path::PathBuf;

use crate::client::EnzoLearnClient;
use crate::output::{self, OutputConfig};

/// AI study helper commands
#[derive(Subcommand, Debug)]
pub enum AiCommands {
    /// Generate a flashcard set from text
    Flashcards {
        /// File to read the text from, or `-` for stdin
        file: PathBuf,
        /// Put the new set in this collection
        #[clap(long)]
        collection_id: Option<String>,
    },
    /// Summarize text
    Summarize {
        /// File to read the text from, or `-` for stdin
        file: PathBuf,
    },
    /// Ask the tutor a question
    Tutor {
        question: String,
        /// File with study material to answer from
        #[clap(long)]
        context: Option<PathBuf>,
    },
}

fn read_input(path: &PathBuf) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

/// Executes an AI command
pub async fn execute(
    client: &EnzoLearnClient,
    cmd: AiCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AiCommands::Flashcards { file, collection_id } => {
            let generated = client.generate_flashcards(read_input(&file)?, collection_id).await?;
            output::print_flashcard_set(&generated.flashcards, config);
        }
        AiCommands::Summarize { file } => {
            let summary = client.summarize(read_input(&file)?).await?;
            output::print_text(&summary.summary, &summary, config);
        }
        AiCommands::Tutor { question, context } => {
            let context = context.as_ref().map(read_input).transpose()?;
            let answer = client.tutor(question, context).await?;
            output::print_text(&answer.answer, &answer, config);
        }
    }
    Ok(())
}
