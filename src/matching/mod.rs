//! Three-phase entity matcher: identity, structural hash, fuzzy similarity.

pub mod engine;
pub mod similarity;

pub use engine::match_entities;
pub use similarity::{jaccard_token_similarity, SimilarityFn};
