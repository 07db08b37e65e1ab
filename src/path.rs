//! Virtual path sanitation and mount-point prefix tests.
//!
//! Every caller-supplied path passes through [`sanitize`] exactly once at the
//! public boundary; archive back-ends trust the canonical form they receive.

use crate::error::{ErrorCode, Result};

/// Canonicalize a caller-supplied virtual path.
///
/// Leading and trailing `/` are stripped, runs of `/` collapse to one
/// boundary, and the empty string is the canonical root. The segments `.`
/// and `..` and the bytes `:` and `\` are rejected with
/// [`ErrorCode::BadFilename`]. Idempotent over its own output.
pub fn sanitize(input: &str) -> Result<String> {
    if input.bytes().any(|b| b == b':' || b == b'\\') {
        return Err(ErrorCode::BadFilename);
    }

    let mut out = String::with_capacity(input.len());
    for segment in input.split('/') {
        match segment {
            "" => continue,
            "." | ".." => return Err(ErrorCode::BadFilename),
            _ => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(segment);
            }
        }
    }
    Ok(out)
}

/// If the sanitized path `fname` lies under `mount_point`, return the
/// archive-relative suffix.
///
/// A `None` mount point is the root mount and matches every path. A concrete
/// mount point always carries a trailing `/`; a path equal to the mount
/// point without that slash maps to the archive root (empty suffix).
pub fn mount_suffix<'a>(mount_point: Option<&str>, fname: &'a str) -> Option<&'a str> {
    match mount_point {
        None => Some(fname),
        Some(point) => {
            if fname.len() + 1 == point.len() && point.as_bytes()[..fname.len()] == *fname.as_bytes()
            {
                return Some("");
            }
            fname.strip_prefix(point)
        }
    }
}

/// Is `fname` an interior segment of `mount_point`?
///
/// True when the path names a directory that exists only because a mount
/// point is nested beneath it. The canonical root counts as interior of
/// every mount point, so enumerating `/` surfaces the first segment of a
/// deep mount point as a synthetic directory.
pub fn interior_of_mount_point(mount_point: Option<&str>, fname: &str) -> bool {
    let Some(point) = mount_point else {
        return false;
    };
    if fname.is_empty() {
        return true;
    }
    // A complete match (modulo the trailing slash) is the archive root, not
    // an interior segment.
    if fname.len() + 1 >= point.len() {
        return false;
    }
    point.starts_with(fname) && point.as_bytes()[fname.len()] == b'/'
}

/// The next mount-point segment to synthesize when `fname` is interior of
/// `mount_point` (see [`interior_of_mount_point`]).
pub fn next_mount_segment<'a>(mount_point: &'a str, fname: &str) -> &'a str {
    let rest = if fname.is_empty() { mount_point } else { &mount_point[fname.len() + 1..] };
    match rest.find('/') {
        Some(cut) => &rest[..cut],
        None => rest,
    }
}

/// Iterate the `/`-separated prefixes of a sanitized path, shortest first.
/// The final item is the whole path.
pub(crate) fn prefixes(fname: &str) -> impl Iterator<Item = &str> + '_ {
    fname
        .char_indices()
        .filter_map(move |(i, c)| if c == '/' { Some(&fname[..i]) } else { None })
        .chain(if fname.is_empty() { None } else { Some(fname) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_normalizes_slashes() {
        assert_eq!(sanitize("/a//b/").unwrap(), "a/b");
        assert_eq!(sanitize("/").unwrap(), "");
        assert_eq!(sanitize("").unwrap(), "");
        assert_eq!(sanitize("foo/").unwrap(), "foo");
        assert_eq!(sanitize("///foo///bar").unwrap(), "foo/bar");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["/a//b/", "x/y/z", "", "/", "deep/nested/path/"] {
            let once = sanitize(input).unwrap();
            assert_eq!(sanitize(&once).unwrap(), once);
        }
    }

    #[test]
    fn sanitize_rejects_escapes() {
        assert_eq!(sanitize(".."), Err(ErrorCode::BadFilename));
        assert_eq!(sanitize("."), Err(ErrorCode::BadFilename));
        assert_eq!(sanitize("a/../b"), Err(ErrorCode::BadFilename));
        assert_eq!(sanitize("a/./b"), Err(ErrorCode::BadFilename));
        assert_eq!(sanitize("a:b"), Err(ErrorCode::BadFilename));
        assert_eq!(sanitize("a\\b"), Err(ErrorCode::BadFilename));
        assert_eq!(sanitize("/.."), Err(ErrorCode::BadFilename));
    }

    #[test]
    fn suffix_honors_root_and_prefix_mounts() {
        assert_eq!(mount_suffix(None, "a/b"), Some("a/b"));
        assert_eq!(mount_suffix(Some("assets/"), "assets/x"), Some("x"));
        assert_eq!(mount_suffix(Some("assets/"), "assets"), Some(""));
        assert_eq!(mount_suffix(Some("assets/"), "other/x"), None);
        assert_eq!(mount_suffix(Some("assets/"), "assetsx"), None);
    }

    #[test]
    fn interior_segments_detected() {
        assert!(interior_of_mount_point(Some("a/b/c/"), ""));
        assert!(interior_of_mount_point(Some("a/b/c/"), "a"));
        assert!(interior_of_mount_point(Some("a/b/c/"), "a/b"));
        assert!(!interior_of_mount_point(Some("a/b/c/"), "a/b/c"));
        assert!(!interior_of_mount_point(Some("a/b/c/"), "a/bx"));
        assert!(!interior_of_mount_point(None, "a"));
    }

    #[test]
    fn next_segment_synthesis() {
        assert_eq!(next_mount_segment("a/b/c/", ""), "a");
        assert_eq!(next_mount_segment("a/b/c/", "a"), "b");
        assert_eq!(next_mount_segment("a/b/c/", "a/b"), "c");
    }

    #[test]
    fn prefix_walk_includes_whole_path() {
        let all: Vec<&str> = prefixes("a/b/c").collect();
        assert_eq!(all, ["a", "a/b", "a/b/c"]);
        assert_eq!(prefixes("").count(), 0);
        let single: Vec<&str> = prefixes("solo").collect();
        assert_eq!(single, ["solo"]);
    }
}
