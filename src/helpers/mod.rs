//! Helper functions used by the resolvers and the materializer
//!
//! All helpers take explicit paths and return explicit results; none of them
//! read or change the process's working directory.
//!
//! ## Categories
//!
//! - **acquire**: GitHub release API, archive download, git clone/describe
//! - **build**: root-stripping zip extraction
//! - **internal**: filesystem utilities and progress bars

pub mod acquire;
pub mod build;
pub mod internal;
