use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ActivityType;

/// An audit-log entry of something a user did
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::activities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Activity {
    id: String,
    user_id: String,
    activity_type: ActivityType,

    /// What was acted on: `collection`, `note`, `flashcard`, `quiz`,
    /// `flashcard_set`, `summary`, `tutor` or `audio`
    item_type: String,

    item_id: String,

    /// Title at the time of the action, kept after the item is deleted
    item_title: String,

    collection_id: Option<String>,

    /// Study session length in milliseconds
    duration: Option<i64>,

    created_at: NaiveDateTime,
}

impl Activity {
    pub fn new(
        user_id: &str,
        activity_type: ActivityType,
        item_type: impl Into<String>,
        item_id: &str,
        item_title: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            activity_type,
            item_type: item_type.into(),
            item_id: item_id.to_string(),
            item_title: item_title.to_string(),
            collection_id: None,
            duration: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Attaches the collection the acted-on item lives in
    pub fn in_collection(mut self, collection_id: Option<&str>) -> Self {
        self.collection_id = collection_id.map(str::to_string);
        self
    }

    /// Attaches a study session duration
    pub fn with_duration(mut self, duration: Option<i64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_user_id(&self) -> &str {
        &self.user_id
    }

    pub fn get_activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub fn get_item_type(&self) -> &str {
        &self.item_type
    }

    pub fn get_item_id(&self) -> &str {
        &self.item_id
    }

    pub fn get_item_title(&self) -> &str {
        &self.item_title
    }

    pub fn get_collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }

    pub fn get_duration(&self) -> Option<i64> {
        self.duration
    }

    pub fn get_created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}
