//! Command handlers.

pub mod get;
pub mod info;
pub mod serve;
