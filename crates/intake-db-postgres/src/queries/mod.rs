//! SQL query modules for the PostgreSQL storage backend.

pub mod records;

pub use records::{escape_like, insert_record, search_by_name};
