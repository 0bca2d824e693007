/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for interacting with the database: users and
/// password resets, collections, study items, flashcard sets and the
/// activity log.
///
/// Lookups of user-owned rows take the owner's ID and return `None` for rows
/// that belong to someone else, so handlers cannot leak other users' data.

mod user_repo;
mod collection_repo;
mod study_item_repo;
mod flashcard_repo;
mod activity_repo;

// Re-export all repository functions
pub use user_repo::*;
pub use collection_repo::*;
pub use study_item_repo::*;
pub use flashcard_repo::*;
pub use activity_repo::*;

#[cfg(test)]
pub mod tests {
    use crate::db::{self, DbPool};
    use crate::models::User;

    /// Sets up a test database with migrations applied
    ///
    /// This function:
    /// 1. Creates an in-memory SQLite database
    /// 2. Enables foreign key constraints (via the pool's connection customizer)
    /// 3. Runs all migrations to set up the schema
    ///
    /// ### Returns
    ///
    /// A database connection pool connected to the in-memory database
    pub fn setup_test_db() -> DbPool {
        // Use a unique shared in-memory database for each test.
        // Plain ":memory:" gives each connection its own separate database,
        // so migrations run on one connection wouldn't be visible on others.
        let unique_id = uuid::Uuid::new_v4();
        let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
        let pool = db::init_pool(&database_url).expect("Failed to create pool");

        let mut conn = pool.get().expect("Failed to get connection");
        crate::run_migrations(&mut conn).expect("Failed to run migrations");

        pool
    }

    /// Inserts a user with a placeholder password hash
    pub fn create_test_user(pool: &DbPool, email: &str) -> User {
        super::create_user(pool, "Test User".to_string(), email.to_string(), "not-a-real-hash".to_string())
            .expect("Failed to create test user")
    }
}
