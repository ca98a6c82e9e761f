//! Core types and trait definitions for the Dialectic debate knowledge base.
//!
//! This crate is deliberately free of database and I/O dependencies. It holds
//! the entity model, the text normaliser, fingerprinting and similarity
//! scoring, and the storage traits every backend implements.

pub mod catalog;
pub mod entity;
pub mod error;
pub mod fingerprint;
pub mod labels;
pub mod model;
pub mod similarity;
pub mod store;
pub mod text;

pub use entity::{Entity, EntityKind};
pub use error::{Error, Result};
