use crate::db::DbPool;
use crate::models::{StringList, StudyItem, StudyItemType};
use crate::schema::study_items;
use anyhow::{Result, anyhow};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Inserts a new study item
///
/// The caller is responsible for checking that the target collection belongs
/// to the item's owner.
#[instrument(skip(pool, item), fields(item_id = %item.get_id(), collection_id = %item.get_collection_id()))]
pub fn create_study_item(pool: &DbPool, item: StudyItem) -> Result<StudyItem> {
    debug!("Creating new study item");

    let conn = &mut pool.get()?;

    diesel::insert_into(study_items::table)
        .values(&item)
        .execute(conn)?;

    info!("Successfully created study item with id: {}", item.get_id());
    Ok(item)
}

/// Retrieves a study item by ID, scoped to its owner
#[instrument(skip(pool))]
pub fn get_study_item(pool: &DbPool, user_id: &str, item_id: &str) -> Result<Option<StudyItem>> {
    let conn = &mut pool.get()?;

    let item = study_items::table
        .filter(study_items::id.eq(item_id))
        .filter(study_items::user_id.eq(user_id))
        .select(StudyItem::as_select())
        .first::<StudyItem>(conn)
        .optional()?;

    Ok(item)
}

/// Lists the study items of a collection, newest first
#[instrument(skip(pool))]
pub fn list_study_items_for_collection(pool: &DbPool, collection_id: &str) -> Result<Vec<StudyItem>> {
    let conn = &mut pool.get()?;

    let items = study_items::table
        .filter(study_items::collection_id.eq(collection_id))
        .order(study_items::created_at.desc())
        .select(StudyItem::as_select())
        .load::<StudyItem>(conn)?;

    info!("Retrieved {} study items", items.len());
    Ok(items)
}

/// Updates a study item's content
///
/// `tags` of `None` keeps the current tags.
#[instrument(skip(pool, content, tags))]
pub fn update_study_item(
    pool: &DbPool,
    item_id: &str,
    title: String,
    content: String,
    item_type: StudyItemType,
    tags: Option<Vec<String>>,
) -> Result<StudyItem> {
    debug!("Updating study item");

    #[derive(AsChangeset)]
    #[diesel(table_name = study_items)]
    struct StudyItemChangeset {
        title: String,
        content: String,
        item_type: StudyItemType,
        tags: Option<StringList>,
        updated_at: NaiveDateTime,
    }

    let changeset = StudyItemChangeset {
        title,
        content,
        item_type,
        tags: tags.map(StringList),
        updated_at: Utc::now().naive_utc(),
    };

    let conn = &mut pool.get()?;

    diesel::update(study_items::table.find(item_id))
        .set(changeset)
        .execute(conn)?;

    study_items::table
        .find(item_id)
        .select(StudyItem::as_select())
        .first::<StudyItem>(conn)
        .map_err(|e| anyhow!("Study item {} not found after update: {}", item_id, e))
}

/// Deletes a study item
#[instrument(skip(pool))]
pub fn delete_study_item(pool: &DbPool, item_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::delete(study_items::table.find(item_id)).execute(conn)?;

    debug!("Deleted study item with id: {}", item_id);
    Ok(())
}

/// Records the public URL of generated speech on a study item
#[instrument(skip(pool))]
pub fn set_study_item_audio_url(pool: &DbPool, item_id: &str, audio_url: &str) -> Result<StudyItem> {
    let conn = &mut pool.get()?;

    diesel::update(study_items::table.find(item_id))
        .set((
            study_items::audio_url.eq(Some(audio_url)),
            study_items::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    study_items::table
        .find(item_id)
        .select(StudyItem::as_select())
        .first::<StudyItem>(conn)
        .map_err(|e| anyhow!("Study item {} not found after audio update: {}", item_id, e))
}

/// Bumps the study counter of an item the user owns
///
/// ### Returns
///
/// `true` if a matching item was updated
#[instrument(skip(pool))]
pub fn record_study_item_session(pool: &DbPool, user_id: &str, item_id: &str) -> Result<bool> {
    let conn = &mut pool.get()?;

    let updated = diesel::update(
        study_items::table
            .filter(study_items::id.eq(item_id))
            .filter(study_items::user_id.eq(user_id)),
    )
    .set((
        study_items::study_count.eq(study_items::study_count + 1),
        study_items::last_studied.eq(Some(Utc::now().naive_utc())),
    ))
    .execute(conn)?;

    Ok(updated > 0)
}
