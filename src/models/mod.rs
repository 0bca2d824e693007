/// Data models module
///
/// This module defines the core data structures used throughout the application.
/// It includes database models that map to database tables, as well as the
/// response shapes that embed derived data (item counts, cards).

// Re-export all model types
mod json_value;
pub use json_value::{JsonValue, StringList};

mod kinds;
pub use kinds::{ActivityType, Difficulty, StudyItemType};

mod user;
pub use user::{PasswordReset, User};

mod collection;
pub use collection::{Collection, CollectionWithCount};

mod study_item;
pub use study_item::StudyItem;

mod flashcard;
pub use flashcard::{Flashcard, FlashcardSet, FlashcardSetWithCards};

mod activity;
pub use activity::Activity;
