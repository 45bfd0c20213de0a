//! Similarity retrieval over indexed chunks

mod index;

pub use index::VectorIndex;
