//! Language predicates used to pick which rows go out for translation.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Letters that only appear in Vietnamese among Latin-script languages.
static VIETNAMESE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "(?i)[àáảãạăằắẳẵặâầấẩẫậèéẻẽẹêềếểễệ",
        "ìíỉĩịòóỏõọôồốổỗộơờớởỡợ",
        "ùúủũụưừứửữựỳýỷỹỵđ]"
    ))
    .expect("valid Vietnamese letter regex")
});

/// Return true if the text contains at least one Vietnamese-specific letter.
///
/// The text is NFC-normalized first, so letters typed as a base character
/// followed by combining marks are recognised as well.
pub fn contains_vietnamese(text: &str) -> bool {
    if text.is_ascii() {
        return false;
    }
    let composed: String = text.nfc().collect();
    VIETNAMESE_REGEX.is_match(&composed)
}
