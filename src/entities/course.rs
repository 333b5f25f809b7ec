// 📚 Course Entity
// One merged record per canonical course code

use serde::{Deserialize, Deserializer};

// ============================================================================
// COURSE RECORD
// ============================================================================

/// Course attributes keyed by canonical code.
///
/// Built while scanning source files, persisted once through the upsert
/// layer. The raw prerequisite text is kept verbatim so the linker can
/// extract every referenced code after all courses have identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRecord {
    /// Canonical code, e.g. "COMP.1010"
    pub code: String,

    /// Title, may be empty
    pub title: String,

    /// Credit hours, never negative
    pub credits: f64,

    /// Free-form prerequisite text, may be empty
    pub prerequisites: String,
}

impl CourseRecord {
    pub fn new(code: String, title: String, credits: f64, prerequisites: String) -> Self {
        CourseRecord {
            code,
            title,
            credits: sanitize_credits(credits),
            prerequisites,
        }
    }

    pub fn has_prerequisites(&self) -> bool {
        !self.prerequisites.trim().is_empty()
    }
}

/// Negative or non-finite credit values become 0
fn sanitize_credits(credits: f64) -> f64 {
    if credits.is_finite() && credits > 0.0 {
        credits
    } else {
        0.0
    }
}

// ============================================================================
// LENIENT FIELD DECODERS
// Scraped exports disagree on field types; these accept every form seen.
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum CreditsField {
    Number(f64),
    Text(String),
}

/// Credits as a number, a numeric string, or null. Anything else is 0.
pub(crate) fn deserialize_credits<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let field: Option<CreditsField> = Option::deserialize(deserializer)?;
    Ok(match field {
        Some(CreditsField::Number(n)) => n,
        Some(CreditsField::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrerequisitesField {
    Text(String),
    List(Vec<String>),
}

/// Prerequisites as text, a list of strings (joined), or null.
pub(crate) fn deserialize_prerequisites<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let field: Option<PrerequisitesField> = Option::deserialize(deserializer)?;
    Ok(match field {
        Some(PrerequisitesField::Text(s)) => s,
        Some(PrerequisitesField::List(items)) => items.join(", "),
        None => String::new(),
    })
}

/// String field that tolerates null
pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
