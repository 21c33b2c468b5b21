use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: &str, display_name: &str) -> Self {
        User {
            id: id.to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        }
    }
}
