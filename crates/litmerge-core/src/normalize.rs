//! Comparison keys for DOIs and titles.

/// Number of characters of a title quoted in a duplicate-title reason.
pub const TITLE_PREVIEW_CHARS: usize = 50;

/// Cell values that spreadsheet and dataframe exports use for "no value".
/// Matched exactly, case and surrounding whitespace included.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell reads as absent.
pub fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Canonicalize a raw field into a comparison key.
///
/// Absent or blank input yields the empty string, which means "no key".
/// Otherwise the value is trimmed and lower-cased; two keys match only on
/// exact string equality.
pub fn normalize_key(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_lowercase(),
        _ => String::new(),
    }
}

/// First [`TITLE_PREVIEW_CHARS`] characters of a key, on a char boundary.
pub fn preview(key: &str) -> &str {
    match key.char_indices().nth(TITLE_PREVIEW_CHARS) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
