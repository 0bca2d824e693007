use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StringList, StudyItemType};

/// A note, flashcard or quiz entry inside a collection
///
/// Flashcard and quiz items store their content as `question|||answer`.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::study_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StudyItem {
    /// Unique identifier for the item (UUID v4 as string)
    id: String,

    /// The collection this item belongs to
    collection_id: String,

    /// The owning user
    user_id: String,

    /// What kind of content this is
    #[serde(rename = "type")]
    item_type: StudyItemType,

    title: String,
    content: String,
    tags: StringList,

    /// Public URL of generated speech for this item, if any
    audio_url: Option<String>,

    /// How many study sessions included this item
    study_count: i32,
    last_studied: Option<NaiveDateTime>,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl StudyItem {
    /// Creates a new study item
    pub fn new(
        user_id: &str,
        collection_id: &str,
        item_type: StudyItemType,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            collection_id: collection_id.to_string(),
            user_id: user_id.to_string(),
            item_type,
            title,
            content,
            tags: StringList(tags),
            audio_url: None,
            study_count: 0,
            last_studied: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn get_user_id(&self) -> &str {
        &self.user_id
    }

    pub fn get_item_type(&self) -> StudyItemType {
        self.item_type
    }

    pub fn get_title(&self) -> &str {
        &self.title
    }

    pub fn get_content(&self) -> &str {
        &self.content
    }

    pub fn get_tags(&self) -> &[String] {
        &self.tags.0
    }

    pub fn get_audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    pub fn get_study_count(&self) -> i32 {
        self.study_count
    }

    pub fn get_last_studied(&self) -> Option<NaiveDateTime> {
        self.last_studied
    }
}
