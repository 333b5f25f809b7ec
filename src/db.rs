// 🗄️ Store Layer - schema bootstrap, idempotent upserts, junction inserts
//
// Every statement runs in autocommit mode, so each upsert or link is
// committed on its own and partial progress survives a later failure.
//
// The insert-then-select upsert below relies on there being exactly one
// writer. With concurrent writers another connection could insert between
// the failed INSERT and the SELECT; that would need the pair wrapped in one
// transaction or replaced by a native upsert.

use crate::entities::{CourseRecord, ProfessorRecord};
use crate::error::{Result, StoreContext};
use rusqlite::{params, Connection, OptionalExtension};

/// Store-issued identifier
pub type RowId = i64;

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .store_context(|| "enable WAL journal")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS DegreePathways (
            PathwayID INTEGER PRIMARY KEY AUTOINCREMENT,
            Name TEXT UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS Courses (
            CourseID INTEGER PRIMARY KEY AUTOINCREMENT,
            CourseCode TEXT UNIQUE NOT NULL,
            Title TEXT NOT NULL,
            Credits REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS Professors (
            ProfessorID INTEGER PRIMARY KEY AUTOINCREMENT,
            Name TEXT UNIQUE NOT NULL,
            Rating REAL
        );

        CREATE TABLE IF NOT EXISTS RoadmapCourses (
            PathwayID INTEGER NOT NULL REFERENCES DegreePathways(PathwayID),
            CourseID INTEGER NOT NULL REFERENCES Courses(CourseID),
            YearNum INTEGER NOT NULL,
            Semester TEXT NOT NULL,
            SortOrder INTEGER NOT NULL,
            UNIQUE (PathwayID, CourseID, YearNum, Semester, SortOrder)
        );

        CREATE TABLE IF NOT EXISTS Prerequisites (
            CourseID INTEGER NOT NULL REFERENCES Courses(CourseID),
            PrereqID INTEGER NOT NULL REFERENCES Courses(CourseID),
            PRIMARY KEY (CourseID, PrereqID)
        );

        CREATE INDEX IF NOT EXISTS idx_roadmap_pathway ON RoadmapCourses(PathwayID);",
    )
    .store_context(|| "create schema")?;

    Ok(())
}

/// True only for UNIQUE violations. NOT NULL, CHECK and foreign key
/// failures share the same primary code and must still propagate.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ============================================================================
// UPSERTS
// ============================================================================

/// Insert a course or fetch the existing one by code. Returns CourseID.
///
/// An existing row keeps its stored title and credits.
pub fn upsert_course(conn: &Connection, course: &CourseRecord) -> Result<RowId> {
    let result = conn.execute(
        "INSERT INTO Courses (CourseCode, Title, Credits) VALUES (?1, ?2, ?3)",
        params![course.code, course.title, course.credits],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => conn
            .query_row(
                "SELECT CourseID FROM Courses WHERE CourseCode = ?1",
                [&course.code],
                |row| row.get(0),
            )
            .store_context(|| format!("look up course {}", course.code)),
        Err(e) => Err(e).store_context(|| format!("upsert course {}", course.code)),
    }
}

/// Insert a professor or fetch the existing one by name. Returns ProfessorID.
pub fn upsert_professor(conn: &Connection, professor: &ProfessorRecord) -> Result<RowId> {
    let result = conn.execute(
        "INSERT INTO Professors (Name, Rating) VALUES (?1, ?2)",
        params![professor.name, professor.rating],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => conn
            .query_row(
                "SELECT ProfessorID FROM Professors WHERE Name = ?1",
                [&professor.name],
                |row| row.get(0),
            )
            .store_context(|| format!("look up professor {}", professor.name)),
        Err(e) => Err(e).store_context(|| format!("upsert professor {}", professor.name)),
    }
}

/// Insert-or-fetch a pathway by name.
///
/// The loader only ever looks pathways up; this is for seeding a store.
pub fn register_pathway(conn: &Connection, name: &str) -> Result<RowId> {
    match conn.execute("INSERT INTO DegreePathways (Name) VALUES (?1)", [name]) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => {
            let existing = find_pathway_id(conn, name)?;
            existing.ok_or_else(|| crate::IngestError::store(format!("register pathway {}", name), e))
        }
        Err(e) => Err(e).store_context(|| format!("register pathway {}", name)),
    }
}

// ============================================================================
// JUNCTION INSERTS (insert-if-absent)
// ============================================================================

/// Roadmap placement: exact tuple of pathway/course/year/semester/order
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapEntry<'a> {
    pub pathway_id: RowId,
    pub course_id: RowId,
    pub year: u32,
    pub semester: &'a str,
    pub sort_order: u32,
}

/// Insert the placement unless the identical tuple exists.
/// Returns true when a row was written.
pub fn insert_roadmap_course(conn: &Connection, entry: &RoadmapEntry<'_>) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT INTO RoadmapCourses (PathwayID, CourseID, YearNum, Semester, SortOrder)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE NOT EXISTS (
                SELECT 1 FROM RoadmapCourses
                WHERE PathwayID = ?1 AND CourseID = ?2 AND YearNum = ?3
                  AND Semester = ?4 AND SortOrder = ?5
             )",
            params![
                entry.pathway_id,
                entry.course_id,
                entry.year,
                entry.semester,
                entry.sort_order
            ],
        )
        .store_context(|| {
            format!(
                "insert roadmap course {} into pathway {} (year {}, {}, #{})",
                entry.course_id, entry.pathway_id, entry.year, entry.semester, entry.sort_order
            )
        })?;

    Ok(changed > 0)
}

/// Insert the edge course → prerequisite unless it exists.
/// Returns true when a row was written.
pub fn insert_prerequisite(conn: &Connection, course_id: RowId, prereq_id: RowId) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT INTO Prerequisites (CourseID, PrereqID)
             SELECT ?1, ?2
             WHERE NOT EXISTS (
                SELECT 1 FROM Prerequisites WHERE CourseID = ?1 AND PrereqID = ?2
             )",
            params![course_id, prereq_id],
        )
        .store_context(|| format!("insert prerequisite {} -> {}", course_id, prereq_id))?;

    Ok(changed > 0)
}

// ============================================================================
// LOOKUPS
// ============================================================================

pub fn find_pathway_id(conn: &Connection, name: &str) -> Result<Option<RowId>> {
    conn.query_row(
        "SELECT PathwayID FROM DegreePathways WHERE Name = ?1",
        [name],
        |row| row.get(0),
    )
    .optional()
    .store_context(|| format!("look up pathway {}", name))
}

pub fn find_course_id(conn: &Connection, code: &str) -> Result<Option<RowId>> {
    conn.query_row(
        "SELECT CourseID FROM Courses WHERE CourseCode = ?1",
        [code],
        |row| row.get(0),
    )
    .optional()
    .store_context(|| format!("look up course {}", code))
}

pub fn find_professor_id(conn: &Connection, name: &str) -> Result<Option<RowId>> {
    conn.query_row(
        "SELECT ProfessorID FROM Professors WHERE Name = ?1",
        [name],
        |row| row.get(0),
    )
    .optional()
    .store_context(|| format!("look up professor {}", name))
}

/// Tables the loader writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Courses,
    Professors,
    RoadmapCourses,
    Prerequisites,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Courses => "Courses",
            Table::Professors => "Professors",
            Table::RoadmapCourses => "RoadmapCourses",
            Table::Prerequisites => "Prerequisites",
        }
    }
}

pub fn count_rows(conn: &Connection, table: Table) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.name());
    conn.query_row(&sql, [], |row| row.get(0))
        .store_context(|| format!("count {}", table.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn course(code: &str, title: &str) -> CourseRecord {
        CourseRecord::new(code.to_string(), title.to_string(), 3.0, String::new())
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = test_db();
        setup_database(&conn).unwrap();
        assert_eq!(count_rows(&conn, Table::Courses).unwrap(), 0);
    }

    #[test]
    fn test_upsert_course_twice_same_id() {
        let conn = test_db();
        let c = course("COMP.1010", "Computing I");

        let id1 = upsert_course(&conn, &c).unwrap();
        let id2 = upsert_course(&conn, &c).unwrap();

        assert_eq!(id1, id2);
        assert_eq!(count_rows(&conn, Table::Courses).unwrap(), 1);
        assert_eq!(find_course_id(&conn, "COMP.1010").unwrap(), Some(id1));
    }

    #[test]
    fn test_upsert_course_keeps_existing_attributes() {
        let conn = test_db();
        let id1 = upsert_course(&conn, &course("COMP.1010", "Computing I")).unwrap();
        let id2 = upsert_course(&conn, &course("COMP.1010", "Renamed")).unwrap();
        assert_eq!(id1, id2);

        let title: String = conn
            .query_row("SELECT Title FROM Courses WHERE CourseID = ?1", [id1], |r| r.get(0))
            .unwrap();
        assert_eq!(title, "Computing I");
    }

    #[test]
    fn test_upsert_distinct_courses() {
        let conn = test_db();
        let a = upsert_course(&conn, &course("COMP.1010", "Computing I")).unwrap();
        let b = upsert_course(&conn, &course("MATH.1010", "Algebra")).unwrap();
        assert_ne!(a, b);
        assert_eq!(count_rows(&conn, Table::Courses).unwrap(), 2);
    }

    #[test]
    fn test_upsert_professor_twice_same_id() {
        let conn = test_db();
        let p = ProfessorRecord::new("Ada Lovelace".to_string(), Some(4.8));

        let id1 = upsert_professor(&conn, &p).unwrap();
        let id2 = upsert_professor(&conn, &p).unwrap();

        assert_eq!(id1, id2);
        assert_eq!(count_rows(&conn, Table::Professors).unwrap(), 1);

        let unrated = ProfessorRecord::new("Alan Turing".to_string(), None);
        let id3 = upsert_professor(&conn, &unrated).unwrap();
        assert_ne!(id1, id3);
        let rating: Option<f64> = conn
            .query_row("SELECT Rating FROM Professors WHERE ProfessorID = ?1", [id3], |r| r.get(0))
            .unwrap();
        assert_eq!(rating, None);
    }

    #[test]
    fn test_non_unique_failure_propagates() {
        let conn = Connection::open_in_memory().unwrap();
        // No schema: the insert fails with something other than a unique violation
        let err = upsert_course(&conn, &course("COMP.1010", "Computing I")).unwrap_err();
        assert!(!err.is_input_error());
        assert!(err.to_string().contains("upsert course COMP.1010"));
    }

    #[test]
    fn test_roadmap_tuple_inserted_once() {
        let conn = test_db();
        let pathway_id = register_pathway(&conn, "Computer Science").unwrap();
        let course_id = upsert_course(&conn, &course("COMP.1010", "Computing I")).unwrap();

        let entry = RoadmapEntry {
            pathway_id,
            course_id,
            year: 1,
            semester: "Fall",
            sort_order: 1,
        };

        assert!(insert_roadmap_course(&conn, &entry).unwrap());
        assert!(!insert_roadmap_course(&conn, &entry).unwrap());
        assert_eq!(count_rows(&conn, Table::RoadmapCourses).unwrap(), 1);

        // Same course in another year is a separate placement
        let repeat = RoadmapEntry { year: 2, ..entry };
        assert!(insert_roadmap_course(&conn, &repeat).unwrap());
        assert_eq!(count_rows(&conn, Table::RoadmapCourses).unwrap(), 2);
    }

    #[test]
    fn test_prerequisite_edge_inserted_once() {
        let conn = test_db();
        let comp = upsert_course(&conn, &course("COMP.1020", "Computing II")).unwrap();
        let math = upsert_course(&conn, &course("MATH.1010", "Algebra")).unwrap();

        assert!(insert_prerequisite(&conn, comp, math).unwrap());
        assert!(!insert_prerequisite(&conn, comp, math).unwrap());
        // Direction matters
        assert!(insert_prerequisite(&conn, math, comp).unwrap());
        assert_eq!(count_rows(&conn, Table::Prerequisites).unwrap(), 2);
    }

    #[test]
    fn test_register_pathway_is_idempotent() {
        let conn = test_db();
        let id1 = register_pathway(&conn, "Computer Science").unwrap();
        let id2 = register_pathway(&conn, "Computer Science").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(find_pathway_id(&conn, "Computer Science").unwrap(), Some(id1));
        assert_eq!(find_pathway_id(&conn, "Unknown").unwrap(), None);
        assert_eq!(find_professor_id(&conn, "Nobody").unwrap(), None);
    }
}
