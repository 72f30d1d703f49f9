// src/io/mod.rs
pub mod corpus;

pub use corpus::load_corpus;
