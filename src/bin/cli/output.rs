use clap::ValueEnum;
use enzolearn::models::{Activity, CollectionWithCount, FlashcardSetWithCards, StudyItem, User};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs)
    pub quiet: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Could not encode output: {e}"),
    }
}

/// Prints a table with left-aligned columns sized to their widest cell
fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| rows.iter().map(|r| r[i].chars().count()).max().unwrap_or(0).max(h.len()))
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<w$}", cell, w = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", line(headers.to_vec()));
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}

/// Prints a list, an empty-list notice, or just the IDs
fn print_list<T: Serialize>(
    values: &[T],
    config: &OutputConfig,
    empty: &str,
    id: impl Fn(&T) -> &str,
    headers: &[&str],
    row: impl Fn(&T) -> Vec<String>,
) {
    match config.format {
        OutputFormat::Json => print_json(values),
        OutputFormat::Human if config.quiet => values.iter().for_each(|v| println!("{}", id(v))),
        OutputFormat::Human if values.is_empty() => println!("{empty}"),
        OutputFormat::Human => print_table(headers, &values.iter().map(row).collect::<Vec<_>>()),
    }
}

pub fn print_user(user: &User, config: &OutputConfig) {
    match config.format {
        OutputFormat::Json => print_json(user),
        OutputFormat::Human if config.quiet => println!("{}", user.get_id()),
        OutputFormat::Human => {
            println!("ID:      {}", user.get_id());
            println!("Name:    {}", user.get_name());
            println!("Email:   {}", user.get_email());
            println!("Joined:  {}", user.get_created_at().format("%Y-%m-%d"));
        }
    }
}

pub fn print_collections(collections: &[CollectionWithCount], config: &OutputConfig) {
    print_list(
        collections,
        config,
        "No collections found.",
        |c| c.collection.get_id(),
        &["ID", "TITLE", "ITEMS"],
        |c| vec![c.collection.get_id().to_string(), c.collection.get_title().to_string(), c.item_count.to_string()],
    );
}

pub fn print_collection(collection: &CollectionWithCount, config: &OutputConfig) {
    match config.format {
        OutputFormat::Json => print_json(collection),
        OutputFormat::Human if config.quiet => println!("{}", collection.collection.get_id()),
        OutputFormat::Human => {
            println!("ID:          {}", collection.collection.get_id());
            println!("Title:       {}", collection.collection.get_title());
            if let Some(description) = collection.collection.get_description() {
                println!("Description: {description}");
            }
            println!("Items:       {}", collection.item_count);
        }
    }
}

pub fn print_study_items(items: &[StudyItem], config: &OutputConfig) {
    print_list(
        items,
        config,
        "No study items found.",
        |i| i.get_id(),
        &["ID", "TYPE", "TITLE", "STUDIED"],
        |i| {
            vec![
                i.get_id().to_string(),
                i.get_item_type().to_string(),
                i.get_title().to_string(),
                i.get_study_count().to_string(),
            ]
        },
    );
}

pub fn print_study_item(item: &StudyItem, config: &OutputConfig) {
    match config.format {
        OutputFormat::Json => print_json(item),
        OutputFormat::Human if config.quiet => println!("{}", item.get_id()),
        OutputFormat::Human => {
            println!("ID:         {}", item.get_id());
            println!("Collection: {}", item.get_collection_id());
            println!("Type:       {}", item.get_item_type());
            println!("Title:      {}", item.get_title());
            println!("Content:    {}", item.get_content());
            if !item.get_tags().is_empty() {
                println!("Tags:       {}", item.get_tags().join(", "));
            }
            if let Some(url) = item.get_audio_url() {
                println!("Audio:      {url}");
            }
        }
    }
}

pub fn print_flashcard_sets(sets: &[FlashcardSetWithCards], config: &OutputConfig) {
    print_list(
        sets,
        config,
        "No flashcard sets found.",
        |s| s.set.get_id(),
        &["ID", "TITLE", "CARDS"],
        |s| vec![s.set.get_id().to_string(), s.set.get_title().to_string(), s.cards.len().to_string()],
    );
}

pub fn print_flashcard_set(set: &FlashcardSetWithCards, config: &OutputConfig) {
    match config.format {
        OutputFormat::Json => print_json(set),
        OutputFormat::Human if config.quiet => println!("{}", set.set.get_id()),
        OutputFormat::Human => {
            println!("ID:    {}", set.set.get_id());
            println!("Title: {}", set.set.get_title());
            for (i, card) in set.cards.iter().enumerate() {
                println!();
                println!("{:>3}. Q: {}", i + 1, card.get_question());
                println!("     A: {}", card.get_answer());
            }
        }
    }
}

pub fn print_activities(activities: &[Activity], config: &OutputConfig) {
    print_list(
        activities,
        config,
        "No activity yet.",
        |a| a.get_id(),
        &["WHEN", "ACTION", "KIND", "TITLE"],
        |a| {
            vec![
                a.get_created_at().format("%Y-%m-%d %H:%M").to_string(),
                a.get_activity_type().to_string(),
                a.get_item_type().to_string(),
                a.get_item_title().to_string(),
            ]
        },
    );
}

/// Prints generated text (summaries, answers, URLs)
pub fn print_text<T: Serialize>(text: &str, raw: &T, config: &OutputConfig) {
    match config.format {
        OutputFormat::Json => print_json(raw),
        OutputFormat::Human => println!("{text}"),
    }
}

/// Prints a success message
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human if config.quiet => {}
        OutputFormat::Human => println!("{message}"),
        OutputFormat::Json => print_json(&serde_json::json!({ "success": true, "message": message })),
    }
}
