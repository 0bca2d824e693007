use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-owned folder of study items
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::collections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Collection {
    /// Unique identifier for the collection (UUID v4 as string)
    id: String,

    /// The owning user
    user_id: String,

    title: String,
    description: Option<String>,

    /// UI accent color, e.g. `#3b82f6`
    color: Option<String>,

    /// UI icon name
    icon: Option<String>,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Collection {
    /// Creates a new collection owned by `user_id`
    pub fn new(
        user_id: &str,
        title: String,
        description: Option<String>,
        color: Option<String>,
        icon: Option<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            description,
            color,
            icon,
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

    pub fn get_title(&self) -> &str {
        &self.title
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn get_color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

/// A collection as returned by the API, with the number of study items it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionWithCount {
    #[serde(flatten)]
    pub collection: Collection,
    pub item_count: i64,
}
