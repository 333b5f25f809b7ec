// 🔗 Relationship Linker
// Roadmap placements and prerequisite edges, resolved against the
// identifiers issued by the upsert pass

use crate::codes::{extract_course_codes, normalize_course_code};
use crate::db::{find_pathway_id, insert_prerequisite, insert_roadmap_course, RoadmapEntry, RowId};
use crate::error::Result;
use crate::merge::MergeStore;
use crate::parser::PathwayDocument;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Canonical course code → CourseID
pub type CourseIdMap = HashMap<String, RowId>;

/// Outcome of linking one roadmap document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoadmapLinkStats {
    /// False when the pathway name was not found and the file was skipped
    pub pathway_found: bool,
    pub inserted: usize,
    pub already_present: usize,
    /// Entries with no canonical code or no known CourseID
    pub unresolved: usize,
}

/// Place every resolvable course of a roadmap into its pathway.
///
/// The pathway must already exist; an unknown name skips the whole file.
/// Year numbers count year blocks from 1, sort order counts every entry of
/// a semester from 1, including entries that end up unresolved.
pub fn link_roadmap(
    conn: &Connection,
    path: &Path,
    roadmap: &PathwayDocument,
    course_ids: &CourseIdMap,
) -> Result<RoadmapLinkStats> {
    let mut stats = RoadmapLinkStats::default();

    let Some(pathway_name) = roadmap.pathway_name(path) else {
        warn!(file = %path.display(), "roadmap name is null, skipping roadmap");
        return Ok(stats);
    };

    let pathway_id = match find_pathway_id(conn, &pathway_name)? {
        Some(id) => id,
        None => {
            warn!(file = %path.display(), pathway = %pathway_name, "pathway not found, skipping roadmap");
            return Ok(stats);
        }
    };
    stats.pathway_found = true;

    for placement in roadmap.placements() {
        let course_id = normalize_course_code(placement.course_number)
            .and_then(|code| course_ids.get(&code).copied());

        let course_id = match course_id {
            Some(id) => id,
            None => {
                debug!(
                    file = %path.display(),
                    course_number = placement.course_number.unwrap_or(""),
                    year = placement.year,
                    semester = placement.semester,
                    "roadmap entry does not resolve to a known course"
                );
                stats.unresolved += 1;
                continue;
            }
        };

        let entry = RoadmapEntry {
            pathway_id,
            course_id,
            year: placement.year,
            semester: placement.semester,
            sort_order: placement.sort_order,
        };

        if insert_roadmap_course(conn, &entry)? {
            stats.inserted += 1;
        } else {
            stats.already_present += 1;
        }
    }

    info!(
        file = %path.display(),
        pathway = %pathway_name,
        inserted = stats.inserted,
        unresolved = stats.unresolved,
        "linked roadmap"
    );

    Ok(stats)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrerequisiteLinkStats {
    pub inserted: usize,
    pub already_present: usize,
    /// Referenced codes with no known CourseID
    pub unresolved: usize,
    /// Courses listing themselves as a prerequisite
    pub self_references: usize,
}

/// Assert an edge for every known code mentioned in each course's
/// prerequisite text. Unlike the course's own number, all codes count.
/// A course never becomes its own prerequisite.
pub fn link_prerequisites(
    conn: &Connection,
    merged: &MergeStore,
    course_ids: &CourseIdMap,
) -> Result<PrerequisiteLinkStats> {
    let mut stats = PrerequisiteLinkStats::default();

    for course in merged.iter().filter(|c| c.has_prerequisites()) {
        let Some(&course_id) = course_ids.get(&course.code) else {
            continue;
        };

        for prereq_code in extract_course_codes(&course.prerequisites) {
            if prereq_code == course.code {
                debug!(code = %course.code, "course lists itself as a prerequisite, skipping");
                stats.self_references += 1;
                continue;
            }

            let Some(&prereq_id) = course_ids.get(&prereq_code) else {
                debug!(code = %course.code, prerequisite = %prereq_code, "prerequisite is not a known course");
                stats.unresolved += 1;
                continue;
            };

            if insert_prerequisite(conn, course_id, prereq_id)? {
                stats.inserted += 1;
            } else {
                stats.already_present += 1;
            }
        }
    }

    Ok(stats)
}
