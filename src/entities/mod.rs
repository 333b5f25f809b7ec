// Entity Models
// Course and Professor records as they exist before persistence.
//
// Identity is the natural key (course code, professor name) until the
// store issues an integer identifier during upsert.

pub mod course;
pub mod professor;

pub use course::CourseRecord;
pub use professor::ProfessorRecord;
