// 🚚 Loader - one sequential reconciliation pass
//
//   read + classify files → merge → upsert courses → upsert professors
//   → link roadmaps → link prerequisites
//
// Each phase runs to completion before the next starts. The connection is
// borrowed for the whole run and never shared.

use crate::db::{upsert_course, upsert_professor, RowId};
use crate::entities::ProfessorRecord;
use crate::error::{IngestError, Result};
use crate::linker::{link_prerequisites, link_roadmap, CourseIdMap};
use crate::merge::MergeStore;
use crate::parser::{
    discover_source_files, is_roadmap_file, read_json, read_source_file, SourceDocument,
    SourceFile, SourceShape,
};
use crate::LoaderConfig;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Professor name → ProfessorID
pub type ProfessorIdMap = HashMap<String, RowId>;

/// Counts gathered over one run
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub files_scanned: usize,
    pub pathway_files: usize,
    pub flat_files: usize,
    pub unrecognized_files: usize,
    pub merged_courses: usize,
    pub courses_upserted: usize,
    pub professors_upserted: usize,
    pub pathways_linked: usize,
    pub pathways_missing: usize,
    pub roadmap_rows_inserted: usize,
    pub roadmap_entries_unresolved: usize,
    pub prerequisites_inserted: usize,
}

impl LoadReport {
    fn new() -> Self {
        LoadReport {
            started_at: Utc::now(),
            finished_at: None,
            files_scanned: 0,
            pathway_files: 0,
            flat_files: 0,
            unrecognized_files: 0,
            merged_courses: 0,
            courses_upserted: 0,
            professors_upserted: 0,
            pathways_linked: 0,
            pathways_missing: 0,
            roadmap_rows_inserted: 0,
            roadmap_entries_unresolved: 0,
            prerequisites_inserted: 0,
        }
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

/// Run the whole load against an already opened, already initialized store
pub fn run_load(conn: &Connection, config: &LoaderConfig) -> Result<LoadReport> {
    config.validate()?;
    let mut report = LoadReport::new();

    // 1. Read and classify every export
    info!(data_dir = %config.data_dir.display(), "reading source files");
    let sources = read_sources(&config.data_dir)?;
    report.files_scanned = sources.len();
    for source in &sources {
        match source.document.shape() {
            Some(SourceShape::Pathway) => report.pathway_files += 1,
            Some(SourceShape::Flat) => report.flat_files += 1,
            None => report.unrecognized_files += 1,
        }
    }

    // 2. Merge
    let merged = merge_sources(&sources);
    report.merged_courses = merged.len();
    info!(courses = merged.len(), "merged course records");

    // 3. Courses
    let course_ids = upsert_courses(conn, &merged)?;
    report.courses_upserted = course_ids.len();
    info!(courses = course_ids.len(), "upserted courses");

    // 4. Professors
    let professor_ids = load_professors(conn, &config.professors_path())?;
    report.professors_upserted = professor_ids.len();

    // 5. Roadmaps
    for source in sources
        .iter()
        .filter(|s| is_roadmap_file(&s.path, &config.roadmap_prefix))
    {
        let Some(roadmap) = source.document.as_pathway() else {
            warn!(file = %source.path.display(), "roadmap file is not pathway-shaped, skipping");
            continue;
        };

        let stats = link_roadmap(conn, &source.path, roadmap, &course_ids)?;
        if stats.pathway_found {
            report.pathways_linked += 1;
        } else {
            report.pathways_missing += 1;
        }
        report.roadmap_rows_inserted += stats.inserted;
        report.roadmap_entries_unresolved += stats.unresolved;
    }

    // 6. Prerequisites
    let prereq_stats = link_prerequisites(conn, &merged, &course_ids)?;
    report.prerequisites_inserted = prereq_stats.inserted;
    info!(
        inserted = prereq_stats.inserted,
        unresolved = prereq_stats.unresolved,
        "linked prerequisites"
    );

    report.finished_at = Some(Utc::now());
    Ok(report)
}

/// Read every `.json` export in the directory. The first unreadable or
/// malformed file aborts the run.
pub fn read_sources(data_dir: &Path) -> Result<Vec<SourceFile>> {
    discover_source_files(data_dir)?
        .iter()
        .map(|path| read_source_file(path))
        .collect()
}

/// Build the merge store from sources in the order given
pub fn merge_sources(sources: &[SourceFile]) -> MergeStore {
    let mut merged = MergeStore::new();

    for source in sources {
        let stats = match &source.document {
            SourceDocument::Pathway(doc) => merged.merge_source(doc),
            SourceDocument::Flat(doc) => merged.merge_source(doc),
            SourceDocument::Unrecognized => continue,
        };
        tracing::debug!(
            file = %source.path.display(),
            inserted = stats.inserted,
            replaced = stats.replaced,
            ignored = stats.ignored,
            "merged file"
        );
    }

    merged
}

/// Persist every merged course, one committed upsert per course
pub fn upsert_courses(conn: &Connection, merged: &MergeStore) -> Result<CourseIdMap> {
    let mut course_ids = CourseIdMap::with_capacity(merged.len());
    for course in merged.iter() {
        let id = upsert_course(conn, course)?;
        course_ids.insert(course.code.clone(), id);
    }
    Ok(course_ids)
}

/// Upsert every professor in the ratings file. A missing file is not an
/// error; the phase is skipped.
pub fn load_professors(conn: &Connection, path: &Path) -> Result<ProfessorIdMap> {
    let mut professor_ids = ProfessorIdMap::new();

    if !path.exists() {
        info!(file = %path.display(), "no professors file, skipping");
        return Ok(professor_ids);
    }

    let professors: Vec<ProfessorRecord> =
        serde_json::from_value(read_json(path)?).map_err(|e| IngestError::json(path, e))?;

    for professor in &professors {
        let id = upsert_professor(conn, professor)?;
        professor_ids.insert(professor.name.clone(), id);
    }

    info!(professors = professor_ids.len(), "upserted professors");
    Ok(professor_ids)
}
