//! Persistent storage engines

mod sqlite;

pub use sqlite::{cosine_similarity, SqliteVectorStore};
