//! Gallery URL parsing.
//!
//! A gallery URL such as `https://hitomi.la/doujinshi/some-title-english-123456.html#1`
//! carries everything needed to name the output: its last path segment, split on
//! `-`, becomes `Some Title English 123456`, whose last token is the gallery id.

use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};
use crate::types::GalleryRef;

const PAGE_SUFFIX: &str = ".html";
const SEGMENT_SEPARATOR: char = '-';

/// Percent-decodes the URL and drops its fragment.
pub fn decode_url(url: &str) -> String {
    let mut decoded = percent_decode_str(url).decode_utf8_lossy().into_owned();
    if let Some(fragment_start) = decoded.find('#') {
        decoded.truncate(fragment_start);
    }
    decoded
}

/// Turns the last path segment of a decoded URL into a spaced, capitalized string.
///
/// `a/b/some-title-123.html` becomes `Some Title 123`. Empty segments are kept,
/// so consecutive separators produce consecutive spaces.
pub fn format_basename(decoded_url: &str) -> String {
    let basename = decoded_url.rsplit('/').next().unwrap_or_default();
    let basename = basename.strip_suffix(PAGE_SUFFIX).unwrap_or(basename);

    basename
        .split(SEGMENT_SEPARATOR)
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a formatted basename into title and id at the last space.
///
/// A blank input yields an empty title and id.
pub fn split_title_id(formatted: &str) -> GalleryRef {
    if formatted.trim().is_empty() {
        return GalleryRef::default();
    }

    match formatted.rsplit_once(' ') {
        Some((title, id)) => GalleryRef::new(title, id),
        None => GalleryRef::new("", formatted),
    }
}

/// Derives the gallery title and id from a raw URL.
///
/// # Returns
///
/// * `Ok(GalleryRef)` - The parsed title and id
/// * `Err(Error::InvalidGalleryUrl)` - The URL yields no id to download
pub fn parse_gallery_url(url: &str) -> Result<GalleryRef> {
    let gallery = split_title_id(&format_basename(&decode_url(url)));
    if gallery.id.is_empty() {
        return Err(Error::InvalidGalleryUrl(url.to_string()));
    }
    log::debug!("Parsed '{}' as id '{}', title '{}'", url, gallery.id, gallery.title);
    Ok(gallery)
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_url_drops_fragment() {
        assert_eq!(
            decode_url("https://hitomi.la/doujinshi/a-b-1.html#2"),
            "https://hitomi.la/doujinshi/a-b-1.html"
        );
        assert_eq!(decode_url("a%20b-1.html"), "a b-1.html");
    }

    #[test]
    fn test_decode_before_fragment_split() {
        // An encoded '#' is decoded first, so it still starts the fragment.
        assert_eq!(decode_url("x/title-12%2334"), "x/title-12");
    }

    #[test]
    fn test_format_basename() {
        assert_eq!(
            format_basename("https://hitomi.la/doujinshi/some-title-english-123456.html"),
            "Some Title English 123456"
        );
        assert_eq!(format_basename("a--b"), "A  B");
        assert_eq!(format_basename("https://hitomi.la/"), "");
    }

    #[test]
    fn test_format_basename_is_idempotent() {
        for input in ["word-word-123", "x/über-alles-9.html", "a--b-7"] {
            let once = format_basename(input);
            assert_eq!(format_basename(&once), once);
        }
    }

    #[test]
    fn test_split_title_id() {
        let gallery = split_title_id(&format_basename("Word-Word-123"));
        assert_eq!(gallery.title, "Word Word");
        assert_eq!(gallery.id, "123");

        let only_id = split_title_id("123");
        assert_eq!(only_id.title, "");
        assert_eq!(only_id.id, "123");

        assert_eq!(split_title_id("   "), GalleryRef::default());
    }

    #[test]
    fn test_parse_gallery_url() {
        let gallery =
            parse_gallery_url("https://hitomi.la/doujinshi/my%20story-japanese-987.html#3")
                .unwrap();
        assert_eq!(gallery.title, "My story Japanese");
        assert_eq!(gallery.id, "987");
    }

    #[test]
    fn test_parse_gallery_url_without_id_fails() {
        assert!(matches!(
            parse_gallery_url("https://hitomi.la/"),
            Err(Error::InvalidGalleryUrl(_))
        ));
        assert!(parse_gallery_url("---").is_err());
        assert!(parse_gallery_url("title-.html").is_err());
    }
}
