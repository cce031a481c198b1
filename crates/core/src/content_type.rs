//! Content type resolution for stored media.

use crate::resource::AssetKind;

/// Number of leading bytes [`sniff`] needs to recognize every format it knows.
pub const SNIFF_LEN: usize = 16;

/// Map a file extension to a content type.
pub fn from_extension(path: &str) -> Option<&'static str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = name.rsplit_once('.')?;
    let ct = match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "ts" => "video/mp2t",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(ct)
}

/// Guess a content type from the leading bytes of a file.
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if head.len() >= 12 && &head[..4] == b"RIFF" {
        match &head[8..12] {
            b"WEBP" => return Some("image/webp"),
            b"AVI " => return Some("video/x-msvideo"),
            _ => {}
        }
    }
    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("video/webm");
    }
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return Some(match &head[8..12] {
            b"qt  " => "video/quicktime",
            _ => "video/mp4",
        });
    }
    None
}

/// Pick the content type for a stored asset.
///
/// Precedence: file extension, leading bytes, catalog hint, per-kind default.
pub fn resolve(path: &str, head: &[u8], hint: Option<&str>, kind: AssetKind) -> String {
    if let Some(ct) = from_extension(path) {
        return ct.to_string();
    }
    if let Some(ct) = sniff(head) {
        return ct.to_string();
    }
    match hint.map(str::trim) {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => kind.default_content_type().to_string(),
    }
}
