pub mod db;
pub mod models;
pub mod provider;

pub use rusqlite;
