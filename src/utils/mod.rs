//! Shared utilities: the error taxonomy and diagnostic logging.

pub mod error;
pub mod logging;
