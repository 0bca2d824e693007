pub mod activity;
pub mod ai;
pub mod auth;
pub mod collection;
pub mod flashcards;
pub mod item;
