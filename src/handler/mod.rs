//! Request handler module
//!
//! Responsible for request routing dispatch, the index page and file serving.

pub mod files;
pub mod index;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
