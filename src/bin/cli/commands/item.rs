use clap::{Subcommand, ValueEnum};
use enzolearn::dto::CreateStudyItemDto;
use enzolearn::text::ANSWER_SEPARATOR;

use crate::client::EnzoLearnClient;
use crate::output::{self, OutputConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ItemKind {
    Note,
    Flashcard,
    Quiz,
}

impl ItemKind {
    fn as_str(self) -> &'static str {
        match self {
            ItemKind::Note => "note",
            ItemKind::Flashcard => "flashcard",
            ItemKind::Quiz => "quiz",
        }
    }
}

/// Study item commands
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Show a study item
    Show {
        /// The item ID
        id: String,
    },
    /// Create a study item in a collection
    Create {
        #[clap(long)]
        collection_id: String,
        #[clap(long, value_enum, default_value_t = ItemKind::Note)]
        kind: ItemKind,
        #[clap(long)]
        title: String,
        /// Note text, or the question for flashcard and quiz items
        #[clap(long)]
        content: String,
        /// The answer for flashcard and quiz items
        #[clap(long)]
        answer: Option<String>,
        /// Comma-separated tags
        #[clap(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Delete a study item
    Delete {
        /// The item ID
        id: String,
    },
    /// Generate spoken audio for an item
    Audio {
        /// The item ID
        id: String,
    },
}

/// Executes a study item command
pub async fn execute(
    client: &EnzoLearnClient,
    cmd: ItemCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ItemCommands::Show { id } => {
            let item = client.get_study_item(&id).await?;
            output::print_study_item(&item, config);
        }
        ItemCommands::Create { collection_id, kind, title, content, answer, tags } => {
            let content = match answer {
                Some(answer) => format!("{content}{ANSWER_SEPARATOR}{answer}"),
                None => content,
            };
            let dto = CreateStudyItemDto {
                title: Some(title),
                content: Some(content),
                item_type: Some(kind.as_str().to_string()),
                tags: Some(tags),
                collection_id: Some(collection_id),
            };
            let item = client.create_study_item(&dto).await?;
            output::print_study_item(&item, config);
        }
        ItemCommands::Delete { id } => {
            let message = client.delete_study_item(&id).await?;
            output::print_success(&message, config);
        }
        ItemCommands::Audio { id } => {
            let audio = client.generate_audio(&id).await?;
            output::print_text(&audio.audio_url, &audio, config);
        }
    }
    Ok(())
}
