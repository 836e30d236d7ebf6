//! MIME type detection module
//!
//! Content types are guessed from the file contents first (magic numbers),
//! then from the file name extension, and finally fall back to a generic
//! binary type.

use std::fs::File;
use std::io::Read;

/// Content type used when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Bytes inspected from the start of a file (tar needs offset 257)
const SNIFF_LEN: u64 = 512;

/// Guesses the content type of an open file
///
/// The file cursor position after the call is unspecified; callers seek
/// to the window they want to transmit.
pub trait MimeResolver: Send + Sync {
    fn guess(&self, name: &str, file: &mut File) -> String;
}

/// Magic number sniffer with an extension-based fallback
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicResolver;

impl MimeResolver for MagicResolver {
    fn guess(&self, name: &str, file: &mut File) -> String {
        let mut head = Vec::with_capacity(512);
        if let Err(e) = file.by_ref().take(SNIFF_LEN).read_to_end(&mut head) {
            crate::logger::log_warning(&format!("Unable to read {name} for type detection: {e}"));
            return guess_from_name(name).unwrap_or(OCTET_STREAM).to_string();
        }

        guess_content_type(name, &head).to_string()
    }
}

/// Combine content sniffing and the extension guess
pub fn guess_content_type(name: &str, head: &[u8]) -> &'static str {
    if let Some(content_type) = sniff_signature(head) {
        return content_type;
    }

    if head.is_empty() {
        return guess_from_name(name).unwrap_or(OCTET_STREAM);
    }

    match sniff_text(head) {
        // A generic text sniff says less than a known extension (.css, .js, ...)
        Some(TEXT_PLAIN) => guess_from_name(name).unwrap_or(TEXT_PLAIN),
        Some(content_type) => content_type,
        None => guess_from_name(name).unwrap_or(OCTET_STREAM),
    }
}

/// Get MIME Content-Type from the file name extension
fn guess_from_name(name: &str) -> Option<&'static str> {
    mime_guess::from_path(name).first_raw()
}

/// Match well-known binary signatures
fn sniff_signature(head: &[u8]) -> Option<&'static str> {
    let content_type = match head {
        // Images
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",

        // Audio
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => "audio/wav",
        [b'I', b'D', b'3', ..] => "audio/mpeg",
        [b'O', b'g', b'g', b'S', ..] => "audio/ogg",
        [b'f', b'L', b'a', b'C', ..] => "audio/flac",

        // Video
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => "video/mp4",
        [0x1A, 0x45, 0xDF, 0xA3, ..] => "video/x-matroska",

        // Documents and archives
        [b'%', b'P', b'D', b'F', b'-', ..] => "application/pdf",
        [b'P', b'K', 0x03, 0x04, ..] => "application/zip",
        [0x1F, 0x8B, ..] => "application/gzip",
        [b'B', b'Z', b'h', ..] => "application/x-bzip2",
        [0xFD, b'7', b'z', b'X', b'Z', 0x00, ..] => "application/x-xz",
        [b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C, ..] => "application/x-7z-compressed",
        [0x7F, b'E', b'L', b'F', ..] => "application/x-executable",
        _ if head.get(257..262) == Some(&b"ustar"[..]) => "application/x-tar",

        _ => return None,
    };

    Some(content_type)
}

/// Recognise markup preambles and plain UTF-8 text
fn sniff_text(head: &[u8]) -> Option<&'static str> {
    if head.contains(&0) {
        return None;
    }

    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // A multi-byte character cut off by the sniff window is still text
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok()?,
        Err(_) => return None,
    };

    let start = text.trim_start().get(..14).unwrap_or_else(|| text.trim_start());
    let start = start.to_ascii_lowercase();
    if start.starts_with("<!doctype html") || start.starts_with("<html") {
        Some(TEXT_HTML)
    } else if start.starts_with("<?xml") {
        Some("application/xml")
    } else {
        Some(TEXT_PLAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_signatures() {
        assert_eq!(guess_content_type("x", b"\x89PNG\r\n\x1a\n...."), "image/png");
        assert_eq!(guess_content_type("x", b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(guess_content_type("x", b"PK\x03\x04rest"), "application/zip");
        assert_eq!(guess_content_type("x", b"\x00\x00\x00\x18ftypmp42"), "video/mp4");
    }

    #[test]
    fn test_signature_beats_extension() {
        assert_eq!(guess_content_type("photo.txt", b"\xFF\xD8\xFF\xE0"), "image/jpeg");
    }

    #[test]
    fn test_text_detection() {
        assert_eq!(guess_content_type("notes", b"hello world\n"), TEXT_PLAIN);
        assert_eq!(
            guess_content_type("page", b"  <!DOCTYPE html><html></html>"),
            TEXT_HTML
        );
        assert_eq!(guess_content_type("data", b"<?xml version='1.0'?>"), "application/xml");
    }

    #[test]
    fn test_text_defers_to_known_extension() {
        assert_eq!(guess_content_type("style.css", b"body { color: red }"), "text/css");
    }

    #[test]
    fn test_unknown_binary() {
        assert_eq!(guess_content_type("blob", b"\x00\x01\x02\x03"), OCTET_STREAM);
        assert_eq!(guess_content_type("empty", b""), OCTET_STREAM);
    }

    #[test]
    fn test_truncated_utf8_is_text() {
        let mut head = b"caf".to_vec();
        head.push(0xC3);
        assert_eq!(guess_content_type("menu", &head), TEXT_PLAIN);
    }

    #[test]
    fn test_resolver_reads_open_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"GIF89a....").unwrap();
        let mut file = File::open(tmp.path()).unwrap();

        assert_eq!(MagicResolver.guess("anim", &mut file), "image/gif");
    }
}
