// Catalog Ingest - Core Library
// Course, professor and roadmap exports → normalized relational store

pub mod codes;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod linker;
pub mod loader;
pub mod merge;
pub mod parser;

// Re-export commonly used types
pub use codes::{extract_course_codes, normalize_course_code};
pub use config::LoaderConfig;
pub use db::{
    count_rows, find_course_id, find_pathway_id, find_professor_id, insert_prerequisite,
    insert_roadmap_course, register_pathway, setup_database, upsert_course, upsert_professor,
    RoadmapEntry, RowId, Table,
};
pub use entities::{CourseRecord, ProfessorRecord};
pub use error::{IngestError, Result};
pub use linker::{link_prerequisites, link_roadmap, CourseIdMap};
pub use loader::{load_professors, run_load, LoadReport, ProfessorIdMap};
pub use merge::{MergeOutcome, MergePolicy, MergeStore};
pub use parser::{
    CourseSource, FlatDocument, PathwayDocument, SourceDocument, SourceFile, SourceShape,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
