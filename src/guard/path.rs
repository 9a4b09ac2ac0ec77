//! Canonical request paths.
//!
//! Rules are matched against the canonical form, and anything forwarded to
//! the page origin must be that same form. Otherwise `//admin` or
//! `/%61dmin` would reach a guarded page without matching its rule.
//!
//! Canonicalization:
//! - percent-encoded unreserved characters (`A-Z a-z 0-9 - . _ ~`) are decoded
//! - runs of `/` collapse to one
//! - `.` and `..` segments are resolved, never climbing above the root
//!
//! Other escapes (`%2F`, `%C3%A9`, ...) are left untouched.

use std::borrow::Cow;

/// Canonical form of `path`. Borrows when `path` is already canonical.
pub fn canonical_path(path: &str) -> Cow<'_, str> {
    let decoded = decode_unreserved(path);
    let trailing_slash = decoded.len() > 1 && decoded.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut canonical = String::with_capacity(decoded.len());
    for segment in &segments {
        canonical.push('/');
        canonical.push_str(segment);
    }
    if canonical.is_empty() || trailing_slash {
        canonical.push('/');
    }

    if canonical == path {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(canonical)
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn decode_unreserved(path: &str) -> Cow<'_, str> {
    if !path.contains('%') {
        return Cow::Borrowed(path);
    }

    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                let decoded = hi * 16 + lo;
                if is_unreserved(decoded) {
                    out.push(decoded as char);
                    i += 3;
                    continue;
                }
            }
        }
        // `%` and ASCII are one byte; other chars are copied whole
        let ch_len = path[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&path[i..i + ch_len]);
        i += ch_len;
    }
    Cow::Owned(out)
}
