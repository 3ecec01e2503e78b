//! Build helpers - turning a fetched release into files on disk
//!
//! ## Functions
//!
//! - **extract_release_zip**: Extract a zipball without its synthetic root
//! - **strip_root**: The root-stripping and hidden-entry rule on its own

pub mod extract;

// Re-export commonly used items
pub use extract::{extract_release_zip, strip_root};
