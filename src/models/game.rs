use serde::{Deserialize, Serialize};

/// Display data for a single title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub title: String,
    #[serde(default, alias = "img")]
    pub image: Option<String>,
}

impl GameMetadata {
    /// Metadata for a title the database does not know: the id doubles as the title.
    pub fn unknown(title_id: &str) -> Self {
        Self {
            title: title_id.to_string(),
            image: None,
        }
    }
}
