use crate::db::DbPool;
use crate::models::{Difficulty, Flashcard, FlashcardSet, FlashcardSetWithCards};
use crate::schema::{flashcard_sets, flashcards};
use anyhow::{Result, anyhow};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// The fields of a card supplied when creating or replacing cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlashcard {
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    pub difficulty: Option<Difficulty>,
}

/// Inserts `cards` into a set, numbering them in the given order
fn insert_cards(conn: &mut SqliteConnection, set_id: &str, cards: Vec<NewFlashcard>) -> Result<Vec<Flashcard>> {
    let mut inserted = Vec::with_capacity(cards.len());
    for (position, card) in cards.into_iter().enumerate() {
        let flashcard = Flashcard::new(
            set_id,
            i32::try_from(position)?,
            card.question,
            card.answer,
            card.tags,
            card.difficulty,
        );
        diesel::insert_into(flashcards::table)
            .values(&flashcard)
            .execute(conn)?;
        inserted.push(flashcard);
    }
    Ok(inserted)
}

fn load_cards(conn: &mut SqliteConnection, set_id: &str) -> Result<Vec<Flashcard>> {
    let cards = flashcards::table
        .filter(flashcards::set_id.eq(set_id))
        .order(flashcards::position.asc())
        .select(Flashcard::as_select())
        .load::<Flashcard>(conn)?;
    Ok(cards)
}

/// Attaches the cards of each set, preserving the order of `sets`
fn attach_cards(conn: &mut SqliteConnection, sets: Vec<FlashcardSet>) -> Result<Vec<FlashcardSetWithCards>> {
    let ids: Vec<&str> = sets.iter().map(|s| s.get_id()).collect();
    let mut by_set: HashMap<String, Vec<Flashcard>> = HashMap::new();
    let cards = flashcards::table
        .filter(flashcards::set_id.eq_any(ids))
        .order(flashcards::position.asc())
        .select(Flashcard::as_select())
        .load::<Flashcard>(conn)?;
    for card in cards {
        by_set.entry(card.get_set_id().to_string()).or_default().push(card);
    }

    Ok(sets
        .into_iter()
        .map(|set| {
            let cards = by_set.remove(set.get_id()).unwrap_or_default();
            FlashcardSetWithCards { set, cards }
        })
        .collect())
}

/// Creates a flashcard set and its cards in one transaction
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The owner of the set
/// * `collection_id` - Optional collection the set belongs to
/// * `title` - The title of the set
/// * `description` - Optional description
/// * `cards` - The cards to create, in display order
///
/// ### Errors
///
/// Returns an error if any insert fails; nothing is written in that case.
#[instrument(skip(pool, description, cards), fields(card_count = cards.len()))]
pub fn create_flashcard_set(
    pool: &DbPool,
    user_id: &str,
    collection_id: Option<String>,
    title: String,
    description: Option<String>,
    cards: Vec<NewFlashcard>,
) -> Result<FlashcardSetWithCards> {
    debug!("Creating flashcard set");

    let conn = &mut pool.get()?;
    let set = FlashcardSet::new(user_id, collection_id, title, description);

    let cards = conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::insert_into(flashcard_sets::table)
            .values(&set)
            .execute(conn)?;
        insert_cards(conn, set.get_id(), cards)
    })?;

    info!("Created flashcard set {} with {} cards", set.get_id(), cards.len());
    Ok(FlashcardSetWithCards { set, cards })
}

/// Retrieves a flashcard set by ID, scoped to its owner, without its cards
#[instrument(skip(pool))]
pub fn get_flashcard_set(pool: &DbPool, user_id: &str, set_id: &str) -> Result<Option<FlashcardSet>> {
    let conn = &mut pool.get()?;

    let set = flashcard_sets::table
        .filter(flashcard_sets::id.eq(set_id))
        .filter(flashcard_sets::user_id.eq(user_id))
        .select(FlashcardSet::as_select())
        .first::<FlashcardSet>(conn)
        .optional()?;

    Ok(set)
}

/// Retrieves a flashcard set with its cards, scoped to its owner
#[instrument(skip(pool))]
pub fn get_flashcard_set_with_cards(
    pool: &DbPool,
    user_id: &str,
    set_id: &str,
) -> Result<Option<FlashcardSetWithCards>> {
    let Some(set) = get_flashcard_set(pool, user_id, set_id)? else {
        return Ok(None);
    };

    let conn = &mut pool.get()?;
    let cards = load_cards(conn, set.get_id())?;
    Ok(Some(FlashcardSetWithCards { set, cards }))
}

/// Lists all of a user's flashcard sets with their cards, newest first
#[instrument(skip(pool))]
pub fn list_flashcard_sets(pool: &DbPool, user_id: &str) -> Result<Vec<FlashcardSetWithCards>> {
    let conn = &mut pool.get()?;

    let sets = flashcard_sets::table
        .filter(flashcard_sets::user_id.eq(user_id))
        .order(flashcard_sets::created_at.desc())
        .select(FlashcardSet::as_select())
        .load::<FlashcardSet>(conn)?;

    info!("Retrieved {} flashcard sets", sets.len());
    attach_cards(conn, sets)
}

/// Lists the flashcard sets filed under a collection, newest first
#[instrument(skip(pool))]
pub fn list_flashcard_sets_for_collection(pool: &DbPool, collection_id: &str) -> Result<Vec<FlashcardSetWithCards>> {
    let conn = &mut pool.get()?;

    let sets = flashcard_sets::table
        .filter(flashcard_sets::collection_id.eq(collection_id))
        .order(flashcard_sets::created_at.desc())
        .select(FlashcardSet::as_select())
        .load::<FlashcardSet>(conn)?;

    attach_cards(conn, sets)
}

/// Updates a flashcard set
///
/// When `cards` is `Some`, every existing card is replaced by the new list;
/// otherwise the cards are left alone. Runs in one transaction.
#[instrument(skip(pool, description, cards))]
pub fn update_flashcard_set(
    pool: &DbPool,
    set_id: &str,
    title: String,
    description: Option<String>,
    cards: Option<Vec<NewFlashcard>>,
) -> Result<FlashcardSetWithCards> {
    debug!("Updating flashcard set");

    #[derive(AsChangeset)]
    #[diesel(table_name = flashcard_sets)]
    struct FlashcardSetChangeset {
        title: String,
        description: Option<String>,
        updated_at: NaiveDateTime,
    }

    let changeset = FlashcardSetChangeset {
        title,
        description,
        updated_at: Utc::now().naive_utc(),
    };

    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::update(flashcard_sets::table.find(set_id))
            .set(changeset)
            .execute(conn)?;

        let set = flashcard_sets::table
            .find(set_id)
            .select(FlashcardSet::as_select())
            .first::<FlashcardSet>(conn)
            .map_err(|e| anyhow!("Flashcard set {} not found after update: {}", set_id, e))?;

        let cards = match cards {
            Some(cards) => {
                diesel::delete(flashcards::table.filter(flashcards::set_id.eq(set_id))).execute(conn)?;
                insert_cards(conn, set_id, cards)?
            }
            None => load_cards(conn, set_id)?,
        };

        Ok(FlashcardSetWithCards { set, cards })
    })
}

/// Deletes a flashcard set and its cards
#[instrument(skip(pool))]
pub fn delete_flashcard_set(pool: &DbPool, set_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::delete(flashcards::table.filter(flashcards::set_id.eq(set_id))).execute(conn)?;
        diesel::delete(flashcard_sets::table.find(set_id)).execute(conn)?;
        Ok(())
    })?;

    debug!("Deleted flashcard set with id: {}", set_id);
    Ok(())
}

/// Bumps the study counter of a set the user owns
///
/// ### Returns
///
/// `true` if a matching set was updated
#[instrument(skip(pool))]
pub fn record_flashcard_set_session(pool: &DbPool, user_id: &str, set_id: &str) -> Result<bool> {
    let conn = &mut pool.get()?;

    let updated = diesel::update(
        flashcard_sets::table
            .filter(flashcard_sets::id.eq(set_id))
            .filter(flashcard_sets::user_id.eq(user_id)),
    )
    .set((
        flashcard_sets::study_count.eq(flashcard_sets::study_count + 1),
        flashcard_sets::last_studied.eq(Some(Utc::now().naive_utc())),
    ))
    .execute(conn)?;

    Ok(updated > 0)
}
