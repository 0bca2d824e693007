use crate::db::DbPool;
use crate::models::{Collection, CollectionWithCount};
use crate::schema::{collections, study_items};
use anyhow::{Result, anyhow};
use chrono::{NaiveDateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Creates a new collection for a user
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The owner of the collection
/// * `title` - The title of the collection
/// * `description`, `color`, `icon` - Optional presentation fields
///
/// ### Returns
///
/// A Result containing the newly created Collection if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool, description, color, icon), fields(title = %title))]
pub fn create_collection(
    pool: &DbPool,
    user_id: &str,
    title: String,
    description: Option<String>,
    color: Option<String>,
    icon: Option<String>,
) -> Result<Collection> {
    debug!("Creating new collection");

    let conn = &mut pool.get()?;
    let collection = Collection::new(user_id, title, description, color, icon);

    diesel::insert_into(collections::table)
        .values(&collection)
        .execute(conn)?;

    info!("Successfully created collection with id: {}", collection.get_id());
    Ok(collection)
}

/// Retrieves a collection by ID, scoped to its owner
///
/// ### Returns
///
/// `None` when the collection does not exist or belongs to someone else
#[instrument(skip(pool))]
pub fn get_collection(pool: &DbPool, user_id: &str, collection_id: &str) -> Result<Option<Collection>> {
    let conn = &mut pool.get()?;

    let collection = collections::table
        .filter(collections::id.eq(collection_id))
        .filter(collections::user_id.eq(user_id))
        .select(Collection::as_select())
        .first::<Collection>(conn)
        .optional()?;

    Ok(collection)
}

/// Retrieves a collection together with the number of study items in it
#[instrument(skip(pool))]
pub fn get_collection_with_count(
    pool: &DbPool,
    user_id: &str,
    collection_id: &str,
) -> Result<Option<CollectionWithCount>> {
    let Some(collection) = get_collection(pool, user_id, collection_id)? else {
        return Ok(None);
    };

    let conn = &mut pool.get()?;
    let item_count = study_items::table
        .filter(study_items::collection_id.eq(collection_id))
        .count()
        .get_result::<i64>(conn)?;

    Ok(Some(CollectionWithCount { collection, item_count }))
}

/// Lists a user's collections, newest first, with their item counts
#[instrument(skip(pool))]
pub fn list_collections(pool: &DbPool, user_id: &str) -> Result<Vec<CollectionWithCount>> {
    debug!("Listing collections");

    let conn = &mut pool.get()?;

    let collections = collections::table
        .filter(collections::user_id.eq(user_id))
        .order(collections::created_at.desc())
        .select(Collection::as_select())
        .load::<Collection>(conn)?;

    let ids: Vec<&str> = collections.iter().map(|c| c.get_id()).collect();
    let counts: HashMap<String, i64> = study_items::table
        .filter(study_items::collection_id.eq_any(ids))
        .group_by(study_items::collection_id)
        .select((study_items::collection_id, count_star()))
        .load::<(String, i64)>(conn)?
        .into_iter()
        .collect();

    let result: Vec<CollectionWithCount> = collections
        .into_iter()
        .map(|collection| {
            let item_count = counts.get(collection.get_id()).copied().unwrap_or(0);
            CollectionWithCount { collection, item_count }
        })
        .collect();

    info!("Retrieved {} collections", result.len());
    Ok(result)
}

/// Updates a collection's fields
///
/// `None` fields are left untouched; `updated_at` is always refreshed.
///
/// ### Errors
///
/// Returns an error if the collection does not exist or the update fails.
#[instrument(skip(pool, description, color, icon))]
pub fn update_collection(
    pool: &DbPool,
    collection_id: &str,
    title: Option<String>,
    description: Option<String>,
    color: Option<String>,
    icon: Option<String>,
) -> Result<Collection> {
    debug!("Updating collection");

    #[derive(AsChangeset)]
    #[diesel(table_name = collections)]
    struct CollectionChangeset {
        title: Option<String>,
        description: Option<String>,
        color: Option<String>,
        icon: Option<String>,
        updated_at: NaiveDateTime,
    }

    let changeset = CollectionChangeset {
        title,
        description,
        color,
        icon,
        updated_at: Utc::now().naive_utc(),
    };

    let conn = &mut pool.get()?;

    diesel::update(collections::table.find(collection_id))
        .set(changeset)
        .execute(conn)?;

    collections::table
        .find(collection_id)
        .select(Collection::as_select())
        .first::<Collection>(conn)
        .map_err(|e| anyhow!("Collection {} not found after update: {}", collection_id, e))
}

/// Deletes a collection; its study items go with it
#[instrument(skip(pool))]
pub fn delete_collection(pool: &DbPool, collection_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::delete(collections::table.find(collection_id)).execute(conn)?;

    debug!("Deleted collection with id: {}", collection_id);
    Ok(())
}
