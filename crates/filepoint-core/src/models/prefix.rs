//! Prefix algebra (spec.md §3, §8 invariant 5).
//!
//! A prefix is a `/`-delimited object-store key path. A *folder prefix* has
//! no file extension on its last segment; an *object prefix* does. The first
//! segment is always the owner.

/// Splits `p` into non-empty segments, ignoring a trailing slash.
fn segments(p: &str) -> Vec<&str> {
    p.trim_end_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

/// True if `p`'s last segment carries no file extension.
pub fn is_folder(p: &str) -> bool {
    match segments(p).last() {
        Some(seg) => !seg.contains('.'),
        None => true,
    }
}

/// Drops the last segment. `folder_of("a/b/c.x") == "a/b"`; `folder_of("a/") == ""`.
pub fn folder_of(p: &str) -> String {
    let segs = segments(p);
    if segs.is_empty() {
        return String::new();
    }
    segs[..segs.len() - 1].join("/")
}

/// Number of path segments retained by treating `p` as a directory: the full
/// segment count for a folder prefix, one less for an object prefix (the
/// filename itself isn't counted). `depth("a/b/c.x") == 2`, `depth("a/") == 1`.
pub fn depth(p: &str) -> usize {
    let len = segments(p).len();
    if is_folder(p) {
        len
    } else {
        len.saturating_sub(1)
    }
}

/// The first segment, which is always the owner.
pub fn owner_of(p: &str) -> Option<String> {
    segments(p).first().map(|s| s.to_string())
}

/// Validates that `prefix` is a folder at `depth == 1` — the shape required
/// for every partition-level mutation (`GET/DELETE /upload`, `DELETE /upload/all`).
pub fn require_depth_one(prefix: &str) -> Result<(), crate::AppError> {
    if !is_folder(prefix) {
        return Err(crate::AppError::InvalidInput(format!(
            "prefix '{prefix}' is not a folder prefix"
        )));
    }
    if depth(prefix) != 1 {
        return Err(crate::AppError::InvalidInput(format!(
            "prefix '{prefix}' must have depth == 1"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_and_folder_of_match_spec_examples() {
        assert_eq!(depth("a/b/c.x"), 2);
        assert_eq!(folder_of("a/b/c.x"), "a/b");
        assert_eq!(depth("a/"), 1);
        assert_eq!(folder_of("a/"), "");
    }

    #[test]
    fn owner_is_first_segment() {
        assert_eq!(owner_of("owner/uid/low-def.webp").as_deref(), Some("owner"));
        assert_eq!(owner_of("owner/").as_deref(), Some("owner"));
    }

    #[test]
    fn depth_one_enforcement() {
        assert!(require_depth_one("owner/").is_ok());
        assert!(require_depth_one("owner/uid/").is_err());
        assert!(require_depth_one("owner/uid.x").is_err());
    }
}
