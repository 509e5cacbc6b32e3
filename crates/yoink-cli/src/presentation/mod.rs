//! Terminal output.

pub mod media;
pub mod progress;

pub use media::{print_media, summary_line};
pub use progress::JobBoard;
