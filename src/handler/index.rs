//! Index page module
//!
//! Renders the list of shared files, or redirects to the only one.

use crate::config::ServedFiles;
use crate::http::{self, ResponseBody};
use hyper::Response;
use std::fmt::Write;

const HEAD: &str = "<!DOCTYPE html>\n\
<html>\
<head>\
<meta charset='utf-8'/>\
<style type='text/css'>\
address {\
font-size: 6em;\
color: #eee;\
position: fixed;\
right: 2cm;\
bottom: 1cm;\
z-index: -1000;\
}\
</style>\
</head>\
<body>\
<ol>";

const TAIL: &str = "</ol>\
<address>pshs</address>\
</body>\
</html>";

/// HTML list of the shared files
///
/// Links are relative, so the page works unchanged below a prefix.
pub fn render_index(files: &ServedFiles) -> String {
    let mut html = String::from(HEAD);
    for name in files.iter() {
        let _ = write!(
            html,
            "<li><a href='{}'>{}</a></li>",
            http::encode_uri_component(name),
            http::escape_html(name)
        );
    }
    html.push_str(TAIL);
    html
}

/// Index response: the rendered list, or a 302 to the single shared file
pub fn index_response(
    files: &ServedFiles,
    redirect: bool,
    content_type: &str,
    is_head: bool,
) -> Response<ResponseBody> {
    if redirect {
        if let Some(only) = files.single() {
            return http::build_redirect_response(&http::encode_uri_component(only));
        }
    }

    http::build_html_response(render_index(files), content_type, is_head)
}
