//! Path validation and normalization.
//!
//! Every rule is applied before any mutation: relative paths only, no
//! parent-directory traversal in any spelling (literal, percent-encoded,
//! or Unicode look-alike dots), no null bytes, `/` as the only separator,
//! and the result must stay inside the configured root.

use agrama_core::config::StorageConfig;
use agrama_core::constants::{MAX_PATH_BYTES, MAX_PATH_SEGMENT_BYTES};
use agrama_core::errors::ValidationError;

/// Reserved prefix for engine-internal keys; agent writes here are denied
/// at the store layer.
pub const RESERVED_PREFIX: &str = ".agrama/";

/// Validate and normalize a content path.
///
/// Returns the normalized path (root-joined, `.` segments removed, no
/// duplicate separators). The normalized form is what the store keys on.
///
/// # Errors
/// One of the `ValidationError` path variants; the first violated rule wins.
pub fn validate_path(raw: &str, config: &StorageConfig) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    if raw.len() > MAX_PATH_BYTES {
        return Err(ValidationError::PathTooLong {
            length: raw.len(),
            max: MAX_PATH_BYTES,
        });
    }
    if raw.contains('\0') {
        return Err(ValidationError::NullByte);
    }
    if raw.contains('\\') {
        return Err(ValidationError::InvalidSeparator { separator: '\\' });
    }
    if raw.starts_with('/') || is_windows_absolute(raw) {
        return Err(ValidationError::AbsolutePath {
            path: raw.to_string(),
        });
    }

    // Decode percent-encodings once so "%2e%2e" cannot smuggle a traversal
    // past the segment check, then fold Unicode dot look-alikes to '.'.
    let decoded = percent_decode(raw)?;
    if decoded.contains('\0') {
        return Err(ValidationError::NullByte);
    }
    let folded = fold_dot_variants(&decoded);

    let mut segments: Vec<&str> = Vec::new();
    for segment in folded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return Err(ValidationError::PathTraversal {
                path: raw.to_string(),
            });
        }
        if segment.len() > MAX_PATH_SEGMENT_BYTES {
            return Err(ValidationError::PathTooLong {
                length: segment.len(),
                max: MAX_PATH_SEGMENT_BYTES,
            });
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err(ValidationError::EmptyPath);
    }

    let mut normalized = String::with_capacity(folded.len() + config.root.len() + 1);
    if !config.root.is_empty() {
        normalized.push_str(config.root.trim_end_matches('/'));
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));

    // With `..` rejected outright the joined path cannot step above the
    // root, but the invariant is cheap to assert on the final form.
    if !config.root.is_empty() && !normalized.starts_with(config.root.trim_end_matches('/')) {
        return Err(ValidationError::OutsideRoot {
            path: normalized,
        });
    }

    Ok(normalized)
}

fn is_windows_absolute(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Decode `%XX` escapes. Malformed escapes are rejected rather than passed
/// through, since they are only ever seen in hostile inputs.
fn percent_decode(raw: &str) -> Result<String, ValidationError> {
    if !raw.contains('%') {
        return Ok(raw.to_string());
    }
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
            let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                }
                _ => {
                    return Err(ValidationError::MalformedArgument {
                        name: "path".to_string(),
                        reason: format!("truncated percent escape at byte {i}"),
                    })
                }
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| ValidationError::MalformedArgument {
        name: "path".to_string(),
        reason: "percent escapes decode to invalid UTF-8".to_string(),
    })
}

/// Fold Unicode characters that normalize to '.' so "․." and "。." spellings
/// of a traversal are caught by the segment check.
fn fold_dot_variants(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2024}' | '\u{FE52}' | '\u{FF0E}' | '\u{3002}' => '.',
            other => other,
        })
        .collect()
}
