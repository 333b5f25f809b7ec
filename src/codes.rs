// 🔤 Course Code Normalizer
// Pulls canonical course codes ("COMP.1010") out of free-form text

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical course code: 2-5 uppercase letters, a dot, 3-4 digits.
/// Not anchored, so codes embedded in longer text are found.
static COURSE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Z]{2,5}\.\d{3,4}").expect("course code pattern is valid")
});

/// Normalize a raw course number to its canonical code.
///
/// Combined or cross-listed numbers ("ENGL.1010 / HONR.1100") collapse to
/// the first code in left-to-right order. Returns `None` when no code is
/// present; that is not an error.
///
/// # Examples:
/// ```
/// use catalog_ingest::codes::normalize_course_code;
///
/// assert_eq!(normalize_course_code(Some("ENGL.1010 / HONR.1100")), Some("ENGL.1010".to_string()));
/// assert_eq!(normalize_course_code(Some("no code here")), None);
/// assert_eq!(normalize_course_code(None), None);
/// ```
pub fn normalize_course_code(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    COURSE_CODE.find(raw).map(|m| m.as_str().to_string())
}

/// Extract every canonical code in the text, in order of appearance.
///
/// Used for prerequisite text, where "MATH.1010 and COMP.1020" names
/// two separate requirements.
pub fn extract_course_codes(text: &str) -> Vec<String> {
    COURSE_CODE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
