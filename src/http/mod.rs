//! HTTP protocol layer module
//!
//! Protocol helpers decoupled from the file-sharing logic: range parsing,
//! URI escaping, content-type detection and response builders.

pub mod escape;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use escape::{decode_uri_path, encode_uri_component, escape_html};
pub use range::{parse_range_header, ByteWindow, RangeError};
pub use response::{
    build_405_response, build_416_response, build_error_response, build_file_response,
    build_html_response, build_redirect_response, ResponseBody,
};
