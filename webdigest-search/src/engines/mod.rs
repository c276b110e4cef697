//! Search provider implementations.
//!
//! Each module provides a struct implementing [`crate::engine::SearchProvider`]
//! for a specific search API.

pub mod brave;

pub use brave::BraveSearch;
