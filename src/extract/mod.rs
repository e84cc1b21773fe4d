//! Content extraction from fetched pages

mod email;

pub use email::{extract_emails, EmailExtractor};
