use crate::db::DbPool;
use crate::models::Activity;
use crate::schema::activities;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, instrument};

/// Appends an entry to the activity log
#[instrument(skip(pool, activity), fields(activity_type = %activity.get_activity_type(), item_id = %activity.get_item_id()))]
pub fn record_activity(pool: &DbPool, activity: Activity) -> Result<Activity> {
    let conn = &mut pool.get()?;

    diesel::insert_into(activities::table)
        .values(&activity)
        .execute(conn)?;

    debug!("Recorded activity {}", activity.get_id());
    Ok(activity)
}

/// Lists a user's most recent activities, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - Whose activity to list
/// * `limit` - Maximum number of entries to return
#[instrument(skip(pool))]
pub fn list_recent_activities(pool: &DbPool, user_id: &str, limit: i64) -> Result<Vec<Activity>> {
    let conn = &mut pool.get()?;

    let result = activities::table
        .filter(activities::user_id.eq(user_id))
        .order(activities::created_at.desc())
        .limit(limit)
        .select(Activity::as_select())
        .load::<Activity>(conn)?;

    debug!("Retrieved {} activities", result.len());
    Ok(result)
}
