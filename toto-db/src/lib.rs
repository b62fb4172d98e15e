pub mod db;

pub use rusqlite;
