//! Core library for docuchat: chat message types, LLM clients, the datasource
//! retrieval boundary, and the retrieval-augmented chat engine.
//!
//! Document indexes are managed outside this service; this crate only resolves
//! datasource names to handles and streams model output for them.

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod llm;
pub mod models;

pub use config::CoreConfig;
pub use error::{Error, Result};
