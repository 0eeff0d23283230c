//! File name sanitization and URL-tail derivation for saved assets.

use url::Url;

use super::DownloadItem;

/// Name used when neither the item nor its URL yields anything usable.
const FALLBACK_FILE_NAME: &str = "download.bin";

/// Picks the on-disk name for an item: its suggested name when present,
/// otherwise the final path segment of its URL.
pub(crate) fn resolve_file_name(item: &DownloadItem) -> String {
    let raw = if item.file_name.is_empty() {
        match tail_segment(&item.url) {
            Some(tail) => tail,
            None => return FALLBACK_FILE_NAME.to_string(),
        }
    } else {
        item.file_name.clone()
    };

    let sanitized = sanitize_file_name(&raw);
    if sanitized.trim_matches('_').is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        sanitized
    }
}

/// Final non-empty path segment of `url`, if any.
fn tail_segment(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url)
        && let Some(segments) = parsed.path_segments()
    {
        return segments
            .filter(|s| !s.is_empty())
            .next_back()
            .map(ToString::to_string);
    }
    // Unparsable input still gets the text after the last slash.
    url.rsplit('/').next().filter(|s| !s.is_empty()).map(ToString::to_string)
}

/// Replaces characters that are invalid on common filesystems and neutralizes
/// dot segments so a hostile name cannot escape the output directory.
fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    // "." and ".." are directory references, not names.
    if sanitized.chars().all(|c| c == '.') {
        return sanitized.chars().map(|_| '_').collect();
    }

    sanitized
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn named(name: &str) -> DownloadItem {
        DownloadItem::new(name, "https://example.com/data/asset.bin")
    }

    fn unnamed(url: &str) -> DownloadItem {
        DownloadItem::from_url(url)
    }

    #[test]
    fn test_resolve_prefers_suggested_name() {
        assert_eq!(resolve_file_name(&named("art.png")), "art.png");
    }

    #[test]
    fn test_resolve_derives_from_url_tail_when_unnamed() {
        assert_eq!(
            resolve_file_name(&unnamed("https://img.example.com/full/photo.jpg")),
            "photo.jpg"
        );
    }

    #[test]
    fn test_resolve_skips_trailing_slash_segment() {
        assert_eq!(
            resolve_file_name(&unnamed("https://img.example.com/full/photo.jpg/")),
            "photo.jpg"
        );
    }

    #[test]
    fn test_resolve_falls_back_when_url_has_no_path() {
        assert_eq!(
            resolve_file_name(&unnamed("https://img.example.com/")),
            "download.bin"
        );
    }

    #[test]
    fn test_sanitize_replaces_invalid_chars() {
        assert_eq!(resolve_file_name(&named("a/b:c.png")), "a_b_c.png");
        assert_eq!(resolve_file_name(&named("a\\b|c.png")), "a_b_c.png");
    }

    #[test]
    fn test_sanitize_preserves_valid_chars() {
        assert_eq!(resolve_file_name(&named("valid-file_name (1).png")), "valid-file_name (1).png");
        assert_eq!(resolve_file_name(&named("日本語.png")), "日本語.png");
    }

    #[test]
    fn test_sanitize_neutralizes_dot_segments() {
        assert_eq!(resolve_file_name(&named("..")), "download.bin");
        assert_eq!(resolve_file_name(&named(".")), "download.bin");
    }

    #[test]
    fn test_sanitize_blocks_traversal_names() {
        use std::path::{Component, Path};

        let resolved = resolve_file_name(&named("../../etc/passwd"));
        assert!(!resolved.contains('/'), "no separators in: {resolved}");
        assert!(!resolved.contains('\\'), "no separators in: {resolved}");
        let has_parent_dir = Path::new(&resolved)
            .components()
            .any(|c| c == Component::ParentDir);
        assert!(!has_parent_dir, "no .. component in: {resolved}");
    }

    #[test]
    fn test_resolve_handles_unparsable_url() {
        assert_eq!(
            resolve_file_name(&unnamed("not-a-url/with/tail.gif")),
            "tail.gif"
        );
    }
}
