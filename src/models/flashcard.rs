use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Difficulty, StringList};

/// A named group of question/answer cards
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::flashcard_sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FlashcardSet {
    id: String,
    user_id: String,

    /// Sets may live outside any collection
    collection_id: Option<String>,

    title: String,
    description: Option<String>,
    study_count: i32,
    last_studied: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl FlashcardSet {
    pub fn new(user_id: &str, collection_id: Option<String>, title: String, description: Option<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            collection_id,
            title,
            description,
            study_count: 0,
            last_studied: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_user_id(&self) -> &str {
        &self.user_id
    }

    pub fn get_collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }

    pub fn get_title(&self) -> &str {
        &self.title
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn get_study_count(&self) -> i32 {
        self.study_count
    }
}

/// A single question/answer pair inside a set
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::flashcards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Flashcard {
    id: String,
    set_id: String,

    /// Order of the card within its set
    #[serde(skip_serializing, default)]
    position: i32,

    question: String,
    answer: String,
    tags: StringList,
    difficulty: Option<Difficulty>,
    created_at: NaiveDateTime,
}

impl Flashcard {
    pub fn new(
        set_id: &str,
        position: i32,
        question: String,
        answer: String,
        tags: Vec<String>,
        difficulty: Option<Difficulty>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            set_id: set_id.to_string(),
            position,
            question,
            answer,
            tags: StringList(tags),
            difficulty,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_set_id(&self) -> &str {
        &self.set_id
    }

    pub fn get_question(&self) -> &str {
        &self.question
    }

    pub fn get_answer(&self) -> &str {
        &self.answer
    }

    pub fn get_difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }
}

/// A flashcard set with its cards embedded, as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSetWithCards {
    #[serde(flatten)]
    pub set: FlashcardSet,
    pub cards: Vec<Flashcard>,
}
