use crate::db::DbPool;
use crate::models::{JsonValue, PasswordReset, User};
use crate::schema::{password_resets, users};
use anyhow::{Result, anyhow};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new user in the database
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `name` - Display name of the user
/// * `email` - Login email, which must not be taken yet
/// * `password_hash` - An argon2 hash of the user's password
///
/// ### Returns
///
/// A Result containing the newly created User if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails (including a duplicate email)
#[instrument(skip(pool, password_hash), fields(email = %email))]
pub fn create_user(pool: &DbPool, name: String, email: String, password_hash: String) -> Result<User> {
    debug!("Creating new user");

    let conn = &mut pool.get()?;
    let user = User::new(name, email, password_hash);

    diesel::insert_into(users::table)
        .values(&user)
        .execute(conn)?;

    info!("Created user with id: {}", user.get_id());
    Ok(user)
}

/// Retrieves a user by ID
#[instrument(skip(pool))]
pub fn get_user(pool: &DbPool, user_id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first::<User>(conn)
        .optional()?;

    Ok(user)
}

/// Retrieves a user by their login email
#[instrument(skip(pool))]
pub fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let user = users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first::<User>(conn)
        .optional()?;

    Ok(user)
}

/// Stamps the user's last login time and returns the refreshed row
#[instrument(skip(pool))]
pub fn touch_last_login(pool: &DbPool, user_id: &str) -> Result<User> {
    let conn = &mut pool.get()?;

    diesel::update(users::table.find(user_id))
        .set(users::last_login.eq(Some(Utc::now().naive_utc())))
        .execute(conn)?;

    users::table
        .find(user_id)
        .select(User::as_select())
        .first::<User>(conn)
        .map_err(|e| anyhow!("User {} not found after login update: {}", user_id, e))
}

/// Updates a user's profile
///
/// Fields passed as `None` keep their current value.
///
/// ### Errors
///
/// Returns an error if the user does not exist or the update fails.
#[instrument(skip(pool, preferences))]
pub fn update_user_profile(
    pool: &DbPool,
    user_id: &str,
    name: Option<String>,
    preferences: Option<JsonValue>,
) -> Result<User> {
    debug!("Updating user profile");

    #[derive(AsChangeset)]
    #[diesel(table_name = users)]
    struct ProfileChangeset {
        name: Option<String>,
        preferences: Option<JsonValue>,
    }

    let conn = &mut pool.get()?;

    if name.is_some() || preferences.is_some() {
        diesel::update(users::table.find(user_id))
            .set(ProfileChangeset { name, preferences })
            .execute(conn)?;
    }

    users::table
        .find(user_id)
        .select(User::as_select())
        .first::<User>(conn)
        .map_err(|e| anyhow!("User {} not found: {}", user_id, e))
}

/// Stores a password reset token
#[instrument(skip(pool, reset))]
pub fn create_password_reset(pool: &DbPool, reset: &PasswordReset) -> Result<()> {
    let conn = &mut pool.get()?;

    diesel::insert_into(password_resets::table)
        .values(reset)
        .execute(conn)?;

    Ok(())
}

/// Looks up a stored password reset by its token
#[instrument(skip(pool, token))]
pub fn find_password_reset(pool: &DbPool, token: &str) -> Result<Option<PasswordReset>> {
    let conn = &mut pool.get()?;

    let reset = password_resets::table
        .filter(password_resets::token.eq(token))
        .select(PasswordReset::as_select())
        .first::<PasswordReset>(conn)
        .optional()?;

    Ok(reset)
}

/// Redeems a password reset token, setting the user's new password
///
/// The reset row is deleted and the password updated in one transaction.
/// Only the caller whose delete removes the row goes on to change the
/// password, so a token cannot be redeemed twice.
///
/// ### Returns
///
/// `Ok(false)` if the token was not on file (already used or never issued)
#[instrument(skip(pool, token, password_hash))]
pub fn redeem_password_reset(pool: &DbPool, token: &str, user_id: &str, password_hash: String) -> Result<bool> {
    let conn = &mut pool.get()?;

    let redeemed = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let deleted = diesel::delete(password_resets::table.filter(password_resets::token.eq(token)))
            .execute(conn)?;
        if deleted == 0 {
            return Ok(false);
        }

        let updated = diesel::update(users::table.find(user_id))
            .set(users::password.eq(password_hash))
            .execute(conn)?;
        if updated == 0 {
            return Err(anyhow!("User {} not found", user_id));
        }

        Ok(true)
    })?;

    if redeemed {
        info!("Password updated for user {}", user_id);
    }
    Ok(redeemed)
}
