//! Data model shared by the pipeline stages.

pub mod events;
pub mod metadata;
pub mod transaction;
