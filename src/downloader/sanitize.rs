// Filename sanitizer: separator normalization, translate-if-needed, char filter

use super::errors::DownloadError;
use super::traits::Translator;

/// Replacement for every character that may not appear in a file name
pub const PLACEHOLDER: char = '_';

/// Name used when nothing survives sanitization
pub const FALLBACK_NAME: &str = "untitled";

/// Path-breaking characters, always replaced
const DISALLOWED: [char; 6] = ['/', '\\', ':', '"', '?', '|'];

/// True when every character is an ASCII letter or whitespace.
/// Digits and punctuation count as "not English" and trigger translation.
pub fn contains_only_english(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

/// Pass English text through, otherwise ask the translator
pub async fn translate_to_english(
    text: &str,
    translator: &dyn Translator,
    target_language: &str,
) -> Result<String, DownloadError> {
    if contains_only_english(text) {
        return Ok(text.to_string());
    }

    tracing::debug!(text, "translating title");
    translator.translate(text, target_language).await
}

/// `&` → "and", `"` → `'`, and each of `| \ /` → `-`
pub fn normalize_separators(title: &str) -> String {
    title
        .replace('&', "and")
        .replace('"', "'")
        .replace(['|', '\\', '/'], "-")
}

fn is_allowed(c: char) -> bool {
    (c.is_ascii_graphic() || c == ' ') && !DISALLOWED.contains(&c)
}

/// Keep printable ASCII (minus the disallowed set), map the rest to the
/// placeholder, then trim placeholders and spaces from both ends.
/// Empty and dot-only results (`.`, `..`) become the fallback name.
pub fn filter_chars(text: &str) -> String {
    let filtered: String = text
        .chars()
        .map(|c| if is_allowed(c) { c } else { PLACEHOLDER })
        .collect();

    let trimmed = filtered.trim_matches(|c: char| c == PLACEHOLDER || c == ' ');
    if trimmed.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turn an arbitrary title into a filesystem-safe, English file name.
/// Translation errors propagate.
pub async fn sanitize_filename(
    title: &str,
    translator: &dyn Translator,
    target_language: &str,
) -> Result<String, DownloadError> {
    let normalized = normalize_separators(title);
    let translated = translate_to_english(&normalized, translator, target_language).await?;
    Ok(filter_chars(&translated))
}
