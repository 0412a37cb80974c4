use std::path::Path;

use chrono::NaiveDate;

/// Marker inserted before the extension of a file staged during a merge.
pub const STAGE_MARKER: &str = "~merge";

/// Characters that cannot appear in an entity directory name.
const FORBIDDEN_KEY_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Strip characters that are not allowed in a folder name.
pub fn sanitize_key(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN_KEY_CHARS.contains(c)).collect()
}

/// Catalog key convention: trimmed, sanitized, upper-case.
pub fn normalize_key(name: &str) -> String {
    sanitize_key(name.trim()).trim().to_uppercase()
}

/// True for a real calendar date written as `YYYY-MM-DD`.
pub fn is_valid_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_date_shape(bytes: &[u8]) -> bool {
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// First `YYYY-MM-DD` shaped substring anywhere in `name`.
pub fn find_date_token(name: &str) -> Option<&str> {
    let bytes = name.as_bytes();
    (0..bytes.len().saturating_sub(9))
        .find(|&i| is_date_shape(&bytes[i..i + 10]))
        .map(|i| &name[i..i + 10])
}

/// First `YYYY-MM-DD` token that directly follows an underscore, as produced
/// by the `<key>_<date>_<NN>.<ext>` convention.
pub fn date_after_underscore(name: &str) -> Option<&str> {
    let bytes = name.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'_')
        .map(|(i, _)| i + 1)
        .find(|&start| start + 10 <= bytes.len() && is_date_shape(&bytes[start..start + 10]))
        .map(|start| &name[start..start + 10])
}

/// Split a filename into stem and extension (without the dot).
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    let path = Path::new(name);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Canonical item filename: `<key>_<date>_<NN>.<ext>`, extension lower-cased.
pub fn canonical_name(key: &str, date: &str, counter: u32, ext: &str) -> String {
    format!("{}_{}_{:02}.{}", key, date, counter, ext.to_ascii_lowercase())
}

/// Staged filename used while renumbering. The marker goes before the
/// extension so a staged file still counts as an item if a merge is interrupted.
pub fn staged_name(original: &str, disambiguator: Option<&str>) -> String {
    let (stem, ext) = split_name(original);
    let marker = match disambiguator {
        Some(tag) => format!("{STAGE_MARKER}-{tag}"),
        None => STAGE_MARKER.to_string(),
    };
    match ext {
        Some(ext) => format!("{stem}{marker}.{ext}"),
        None => format!("{stem}{marker}"),
    }
}

/// Name used when `name` is taken: `stem_1.ext`, `stem_2.ext`, ...
pub fn numbered_variant(name: &str, n: u32) -> String {
    let (stem, ext) = split_name(name);
    match ext {
        Some(ext) => format!("{stem}_{n}.{ext}"),
        None => format!("{stem}_{n}"),
    }
}

/// Parse an EXIF date string into `YYYY-MM-DD`.
/// Handles both "2024-01-15 12:00:00" (display_value) and "2024:01:15 12:00:00" (raw EXIF).
pub fn parse_exif_date(date_str: &str) -> Option<String> {
    let date_part = date_str.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split([':', '-']).collect();
    if parts.len() < 3 {
        return None;
    }
    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;

    if !(1970..=2100).contains(&year) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── keys ────────────────────────────────────────────────────

    #[test]
    fn test_normalize_key_trims_and_uppercases() {
        assert_eq!(normalize_key("  kka-1234 "), "KKA-1234");
        assert_eq!(normalize_key("ab/c:d"), "ABCD");
        assert_eq!(normalize_key(" / "), "");
    }

    #[test]
    fn test_sanitize_key_keeps_case() {
        assert_eq!(sanitize_key("a<b>c?"), "abc");
        assert_eq!(sanitize_key("Bus 12"), "Bus 12");
    }

    // ── dates ───────────────────────────────────────────────────

    #[test]
    fn test_find_date_token_anywhere() {
        assert_eq!(find_date_token("2023-05-01_x.jpg"), Some("2023-05-01"));
        assert_eq!(find_date_token("KKA_2023-05-01_02.jpg"), Some("2023-05-01"));
        assert_eq!(find_date_token("IMG0001.jpg"), None);
        assert_eq!(find_date_token("2023-5-01.jpg"), None);
        assert_eq!(find_date_token(""), None);
    }

    #[test]
    fn test_find_date_token_at_end() {
        assert_eq!(find_date_token("x2023-05-01"), Some("2023-05-01"));
    }

    #[test]
    fn test_date_after_underscore_requires_underscore() {
        assert_eq!(date_after_underscore("KKA_2023-01-01_01.jpg"), Some("2023-01-01"));
        assert_eq!(date_after_underscore("2023-01-01_KKA.jpg"), None);
        assert_eq!(date_after_underscore("a_b_2020-02-29.png"), Some("2020-02-29"));
        assert_eq!(date_after_underscore("a_"), None);
    }

    #[test]
    fn test_is_valid_date() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("YYYY-MM-DD"));
        assert!(!is_valid_date("2024-1-01"));
    }

    #[test]
    fn test_parse_exif_date_variants() {
        assert_eq!(parse_exif_date("2024:01:15 12:00:00"), Some("2024-01-15".into()));
        assert_eq!(parse_exif_date("2024-06-15 12:30:00"), Some("2024-06-15".into()));
        assert_eq!(parse_exif_date("2024:13:01 00:00:00"), None);
        assert_eq!(parse_exif_date("1969:01:01 00:00:00"), None);
        assert_eq!(parse_exif_date("garbage"), None);
    }

    // ── filenames ───────────────────────────────────────────────

    #[test]
    fn test_canonical_name_lowercases_extension() {
        assert_eq!(canonical_name("B", "2023-01-01", 3, "JPG"), "B_2023-01-01_03.jpg");
        assert_eq!(canonical_name("B", "2023-01-01", 120, "png"), "B_2023-01-01_120.png");
    }

    #[test]
    fn test_staged_name_keeps_extension() {
        assert_eq!(staged_name("a1.jpg", None), "a1~merge.jpg");
        assert_eq!(staged_name("a1.jpg", Some("3f2a")), "a1~merge-3f2a.jpg");
        assert_eq!(staged_name("noext", None), "noext~merge");
    }

    #[test]
    fn test_numbered_variant() {
        assert_eq!(numbered_variant("photo.jpg", 1), "photo_1.jpg");
        assert_eq!(numbered_variant("photo", 2), "photo_2");
    }
}
