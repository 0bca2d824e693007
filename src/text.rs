//! Pure text helpers shared by the AI and audio endpoints.

use serde::{Deserialize, Serialize};

use crate::models::StudyItemType;

/// Separates question and answer in flashcard and quiz content
pub const ANSWER_SEPARATOR: &str = "|||";

pub const FLASHCARD_SYSTEM_PROMPT: &str = "You are a study assistant that writes flashcards. \
Reply with only a JSON array of objects, each with a \"question\" and an \"answer\" string. \
Keep answers short and factual.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a study assistant. \
Summarize the user's text into a concise study summary that keeps the key facts and terms.";

pub const TUTOR_SYSTEM_PROMPT: &str = "You are a patient tutor. \
Answer the student's question clearly, using the provided study material when it is relevant.";

/// Cuts `text` down to at most `max_chars` characters, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// The part of a study item that gets read aloud
///
/// Flashcard and quiz items only speak their answer when the content has one.
pub fn speech_text(item_type: StudyItemType, content: &str) -> &str {
    if item_type.has_answer_part() {
        if let Some((_, answer)) = content.split_once(ANSWER_SEPARATOR) {
            let answer = answer.split(ANSWER_SEPARATOR).next().unwrap_or(answer);
            return answer.trim();
        }
    }
    content
}

/// Builds the user prompt for the tutor, with optional study material
pub fn tutor_prompt(question: &str, context: Option<&str>) -> String {
    match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => format!("Study material:\n{context}\n\nQuestion: {question}"),
        None => question.to_string(),
    }
}

/// One question/answer pair proposed by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub question: String,
    pub answer: String,
}

/// Pulls flashcards out of a model reply
///
/// The reply should be a JSON array, but models like to wrap it in code
/// fences or prose, so parsing starts at the first `[` and ends at the last
/// `]`. Entries without a non-blank question and answer are dropped.
pub fn parse_generated_cards(reply: &str) -> Vec<GeneratedCard> {
    let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    let Ok(entries) = serde_json::from_str::<Vec<serde_json::Value>>(&reply[start..=end]) else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let question = entry.get("question")?.as_str()?.trim();
            let answer = entry.get("answer")?.as_str()?.trim();
            if question.is_empty() || answer.is_empty() {
                return None;
            }
            Some(GeneratedCard { question: question.to_string(), answer: answer.to_string() })
        })
        .collect()
}
