// 🏗️ Source Readers
// Classifies each JSON export into a pathway or flat document, then
// extracts uniform course records from it

use crate::codes::normalize_course_code;
use crate::entities::course::{
    deserialize_credits, deserialize_prerequisites, deserialize_text, CourseRecord,
};
use crate::error::{IngestError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceShape - which of the two export layouts a file uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// Degree plan: years → semesters → courses. Authoritative.
    Pathway,
    /// Top-level list of courses (electives and similar). Fills gaps only.
    Flat,
}

impl SourceShape {
    pub fn name(&self) -> &str {
        match self {
            SourceShape::Pathway => "pathway",
            SourceShape::Flat => "flat",
        }
    }
}

/// Course entry inside a pathway semester
#[derive(Debug, Clone, Deserialize)]
pub struct PathwayCourse {
    #[serde(default)]
    pub course_number: Option<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,

    #[serde(default, deserialize_with = "deserialize_credits")]
    pub credits: f64,

    #[serde(default, deserialize_with = "deserialize_prerequisites")]
    pub prerequisites: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemesterBlock {
    /// Label taken verbatim, e.g. "Fall"
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,

    #[serde(default)]
    pub courses: Vec<PathwayCourse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YearBlock {
    #[serde(default)]
    pub semesters: Vec<SemesterBlock>,
}

/// Pathway-shaped export: `{ "name": ..., "years": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct PathwayDocument {
    /// Outer `None`: key absent. `Some(None)`: explicit `null`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub name: Option<Option<String>>,

    pub years: Vec<YearBlock>,
}

/// Course entry in a flat export. Note `course_name`, not `title`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatCourse {
    #[serde(default)]
    pub course_number: Option<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub course_name: String,

    #[serde(default, deserialize_with = "deserialize_credits")]
    pub credits: f64,

    #[serde(default, deserialize_with = "deserialize_prerequisites")]
    pub prerequisites: String,
}

/// Flat-shaped export: `[ {...}, {...} ]`
#[derive(Debug, Clone, Default)]
pub struct FlatDocument {
    pub courses: Vec<FlatCourse>,
}

/// One course placement within a pathway, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<'a> {
    /// 1-based, incremented per year block
    pub year: u32,
    pub semester: &'a str,
    /// 1-based position within the semester, counting every entry
    pub sort_order: u32,
    pub course_number: Option<&'a str>,
}

impl PathwayDocument {
    /// Name used for the pathway lookup: the document's `name`, or the
    /// file name when the key is absent. An explicit `null` name gives
    /// `None` and the roadmap cannot be matched to a pathway.
    pub fn pathway_name(&self, path: &Path) -> Option<String> {
        match &self.name {
            Some(name) => name.clone(),
            None => Some(
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
        }
    }

    /// Walk every course slot in year/semester/course order
    pub fn placements(&self) -> Vec<Placement<'_>> {
        let mut placements = Vec::new();

        for (year_idx, year) in self.years.iter().enumerate() {
            for semester in &year.semesters {
                for (course_idx, course) in semester.courses.iter().enumerate() {
                    placements.push(Placement {
                        year: year_idx as u32 + 1,
                        semester: &semester.name,
                        sort_order: course_idx as u32 + 1,
                        course_number: course.course_number.as_deref(),
                    });
                }
            }
        }

        placements
    }
}

/// Distinguishes a present-but-null field from an absent one
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

// ============================================================================
// COURSE SOURCE TRAIT
// ============================================================================

/// CourseSource - anything that yields course records
///
/// Records whose number does not normalize to a canonical code are
/// dropped here; that is a skip, not an error.
pub trait CourseSource {
    fn shape(&self) -> SourceShape;

    fn course_records(&self) -> Vec<CourseRecord>;
}

impl CourseSource for PathwayDocument {
    fn shape(&self) -> SourceShape {
        SourceShape::Pathway
    }

    fn course_records(&self) -> Vec<CourseRecord> {
        self.years
            .iter()
            .flat_map(|year| &year.semesters)
            .flat_map(|semester| &semester.courses)
            .filter_map(|course| {
                let code = normalize_course_code(course.course_number.as_deref())?;
                Some(CourseRecord::new(
                    code,
                    course.title.clone(),
                    course.credits,
                    course.prerequisites.clone(),
                ))
            })
            .collect()
    }
}

impl CourseSource for FlatDocument {
    fn shape(&self) -> SourceShape {
        SourceShape::Flat
    }

    fn course_records(&self) -> Vec<CourseRecord> {
        self.courses
            .iter()
            .filter_map(|course| {
                let code = normalize_course_code(course.course_number.as_deref())?;
                Some(CourseRecord::new(
                    code,
                    course.course_name.clone(),
                    course.credits,
                    course.prerequisites.clone(),
                ))
            })
            .collect()
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// A parsed export, classified before any field extraction
#[derive(Debug, Clone)]
pub enum SourceDocument {
    Pathway(PathwayDocument),
    Flat(FlatDocument),
    /// Neither layout; skipped by every pass
    Unrecognized,
}

impl SourceDocument {
    /// Classify by top-level structure:
    /// - object with a `years` key → Pathway
    /// - array → Flat (non-object elements are ignored)
    /// - anything else → Unrecognized
    pub fn classify(value: Value) -> serde_json::Result<Self> {
        let has_years = value
            .as_object()
            .map(|map| map.contains_key("years"))
            .unwrap_or(false);
        if has_years {
            return Ok(SourceDocument::Pathway(serde_json::from_value(value)?));
        }

        match value {
            Value::Array(items) => {
                let courses = items
                    .into_iter()
                    .filter(Value::is_object)
                    .map(serde_json::from_value)
                    .collect::<serde_json::Result<Vec<FlatCourse>>>()?;
                Ok(SourceDocument::Flat(FlatDocument { courses }))
            }
            _ => Ok(SourceDocument::Unrecognized),
        }
    }

    pub fn shape(&self) -> Option<SourceShape> {
        match self {
            SourceDocument::Pathway(doc) => Some(doc.shape()),
            SourceDocument::Flat(doc) => Some(doc.shape()),
            SourceDocument::Unrecognized => None,
        }
    }

    pub fn as_pathway(&self) -> Option<&PathwayDocument> {
        match self {
            SourceDocument::Pathway(doc) => Some(doc),
            _ => None,
        }
    }
}

/// A source file together with its classified content
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub document: SourceDocument,
}

// ============================================================================
// FILE ACCESS
// ============================================================================

/// Read and parse a JSON file. Unreadable or invalid files are fatal and
/// carry the offending path.
pub fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| IngestError::json(path, e))
}

/// Read a file and classify it into a SourceDocument
pub fn read_source_file(path: &Path) -> Result<SourceFile> {
    let value = read_json(path)?;
    let document = SourceDocument::classify(value).map_err(|e| IngestError::json(path, e))?;

    match document.shape() {
        Some(shape) => debug!(file = %path.display(), shape = shape.name(), "classified source file"),
        None => warn!(file = %path.display(), "unrecognized JSON layout, skipping"),
    }

    Ok(SourceFile {
        path: path.to_path_buf(),
        document,
    })
}

/// List the `.json` files directly inside `dir`, in directory-listing order.
///
/// Symlinks are followed. A dangling link is still listed so that reading
/// it fails with its path. Hidden files (leading `.`) are not listed.
///
/// The order is left as the filesystem returns it; when two pathway files
/// define the same code, whichever is listed last wins.
pub fn discover_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::io(dir, e))?;
        let path = entry.path();

        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(true);
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");

        if !hidden && is_json && !path.is_dir() {
            files.push(path);
        }
    }

    Ok(files)
}

/// Roadmap files are the source files whose name starts with `prefix`
pub fn is_roadmap_file(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with(prefix))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn pathway_value() -> Value {
        json!({
            "name": "Computer Science - AI",
            "years": [
                {
                    "semesters": [
                        {
                            "name": "Fall",
                            "courses": [
                                {"course_number": "COMP.1010", "title": "Computing I", "credits": 3, "prerequisites": ""},
                                {"course_number": "ENGL.1010 / HONR.1100", "title": "College Writing I", "credits": 3},
                                {"course_number": "Gen Ed Elective", "title": "Elective", "credits": 3}
                            ]
                        },
                        {
                            "name": "Spring",
                            "courses": [
                                {"course_number": "COMP.1020", "title": "Computing II", "credits": 3, "prerequisites": "Prerequisite: COMP.1010"}
                            ]
                        }
                    ]
                },
                {
                    "semesters": [
                        {"name": "Fall", "courses": [
                            {"course_number": "COMP.2010", "title": "Computing III", "credits": 4}
                        ]}
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_classify_pathway() {
        let doc = SourceDocument::classify(pathway_value()).unwrap();
        assert_eq!(doc.shape(), Some(SourceShape::Pathway));

        let records = match &doc {
            SourceDocument::Pathway(p) => p.course_records(),
            _ => panic!("expected pathway"),
        };

        // "Gen Ed Elective" has no code and is skipped
        let codes: Vec<&str> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["COMP.1010", "ENGL.1010", "COMP.1020", "COMP.2010"]);
        assert_eq!(records[2].prerequisites, "Prerequisite: COMP.1010");
        assert_eq!(records[3].credits, 4.0);
        assert_eq!(records[1].prerequisites, "");
    }

    #[test]
    fn test_classify_flat_uses_course_name() {
        let value = json!([
            {"course_number": "MATH.1010", "course_name": "College Algebra", "credits": 3, "prerequisites": ""},
            {"course_number": null, "course_name": "Mystery"},
            "stray string"
        ]);

        let doc = SourceDocument::classify(value).unwrap();
        assert_eq!(doc.shape(), Some(SourceShape::Flat));

        let records = match &doc {
            SourceDocument::Flat(f) => f.course_records(),
            _ => panic!("expected flat"),
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "MATH.1010");
        assert_eq!(records[0].title, "College Algebra");
    }

    #[test]
    fn test_classify_unrecognized() {
        let doc = SourceDocument::classify(json!({"majors": []})).unwrap();
        assert!(doc.shape().is_none());
        let doc = SourceDocument::classify(json!("just text")).unwrap();
        assert!(doc.shape().is_none());
    }

    #[test]
    fn test_malformed_pathway_is_error() {
        let result = SourceDocument::classify(json!({"years": "not a list"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_placements_are_one_based() {
        let doc = match SourceDocument::classify(pathway_value()).unwrap() {
            SourceDocument::Pathway(p) => p,
            _ => panic!("expected pathway"),
        };
        let placements = doc.placements();

        assert_eq!(placements.len(), 5);
        assert_eq!(placements[0].year, 1);
        assert_eq!(placements[0].semester, "Fall");
        assert_eq!(placements[0].sort_order, 1);
        // Unresolvable entries still take a slot
        assert_eq!(placements[2].sort_order, 3);
        assert_eq!(placements[3].semester, "Spring");
        assert_eq!(placements[3].sort_order, 1);
        assert_eq!(placements[4].year, 2);
        assert_eq!(placements[4].course_number, Some("COMP.2010"));
    }

    #[test]
    fn test_pathway_name_falls_back_to_file_name() {
        let doc: PathwayDocument = serde_json::from_value(json!({"years": []})).unwrap();
        assert_eq!(
            doc.pathway_name(Path::new("data/cs-systems.json")).as_deref(),
            Some("cs-systems.json")
        );

        let named: PathwayDocument =
            serde_json::from_value(json!({"name": "Computer Science", "years": []})).unwrap();
        assert_eq!(
            named.pathway_name(Path::new("data/cs-x.json")).as_deref(),
            Some("Computer Science")
        );
    }

    #[test]
    fn test_null_pathway_name_has_no_fallback() {
        let doc: PathwayDocument =
            serde_json::from_value(json!({"name": null, "years": []})).unwrap();
        assert_eq!(doc.pathway_name(Path::new("data/cs-systems.json")), None);
    }

    #[test]
    fn test_read_source_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_source_file(&path).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("broken.json"));

        let missing = read_source_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, IngestError::Io { .. }));
    }

    #[test]
    fn test_discover_only_json_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cs-ai.json"), "{}").unwrap();
        std::fs::write(dir.path().join("electives.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let mut files = discover_source_files(dir.path()).unwrap();
        files.sort();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["cs-ai.json", "electives.json"]);

        assert!(is_roadmap_file(&files[0], "cs-"));
        assert!(!is_roadmap_file(&files[1], "cs-"));
    }

    #[test]
    fn test_discover_skips_hidden_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("electives.json"), "[]").unwrap();
        std::fs::write(dir.path().join(".draft.json"), "[]").unwrap();

        let files = discover_source_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("electives.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let exports = TempDir::new().unwrap();
        let target = exports.path().join("electives-2024.json");
        std::fs::write(
            &target,
            r#"[{"course_number": "MATH.1010", "course_name": "College Algebra"}]"#,
        )
        .unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("electives.json")).unwrap();

        let files = discover_source_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("electives.json")]);

        let source = read_source_file(&files[0]).unwrap();
        assert_eq!(source.document.shape(), Some(SourceShape::Flat));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_listed_and_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("broken.json");
        std::os::unix::fs::symlink(dir.path().join("gone.json"), &link).unwrap();

        let files = discover_source_files(dir.path()).unwrap();
        assert_eq!(files, vec![link.clone()]);

        let err = read_source_file(&files[0]).unwrap_err();
        assert!(matches!(err, IngestError::Io { ref path, .. } if path == &link));
        assert!(err.to_string().contains("broken.json"));
    }
}
