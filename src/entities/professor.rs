// 👩‍🏫 Professor Entity
// Name + rating pairs from the ratings export

use serde::{Deserialize, Serialize};

/// A professor as listed in the ratings file.
///
/// Identity is the name; the rating may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorRecord {
    pub name: String,

    #[serde(default)]
    pub rating: Option<f64>,
}

impl ProfessorRecord {
    pub fn new(name: String, rating: Option<f64>) -> Self {
        ProfessorRecord { name, rating }
    }
}
