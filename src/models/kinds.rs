//! Closed vocabularies stored as TEXT columns

use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a unit-variant enum that round-trips through its lowercase name,
/// both in JSON and in a TEXT column.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Unknown {}: {}", stringify!($name), other)),
                }
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
                Ok(text.parse::<$name>()?)
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }
    };
}

text_enum! {
    /// The kind of content a study item holds
    StudyItemType {
        Note => "note",
        Flashcard => "flashcard",
        Quiz => "quiz",
    }
}

impl StudyItemType {
    /// Flashcard and quiz items keep their content as `question|||answer`
    pub fn has_answer_part(&self) -> bool {
        matches!(self, StudyItemType::Flashcard | StudyItemType::Quiz)
    }
}

text_enum! {
    /// What a user did, as recorded in the activity log
    ActivityType {
        Create => "create",
        Edit => "edit",
        Delete => "delete",
        Study => "study",
        AiGenerate => "ai_generate",
    }
}

text_enum! {
    /// Self-assessed flashcard difficulty
    Difficulty {
        Easy => "easy",
        Medium => "medium",
        Hard => "hard",
    }
}
