use serde::{Deserialize, Serialize};

pub const SUBJECTS: &[&str] = &["Mathematics", "Physics", "Chemistry", "Biology", "General"];
pub const CONTENT_TYPES: &[&str] = &["video", "notes", "pdf", "quiz"];
pub const LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

pub fn is_valid_subject(subject: &str) -> bool {
    SUBJECTS.contains(&subject)
}

pub fn is_valid_content_type(content_type: &str) -> bool {
    CONTENT_TYPES.contains(&content_type)
}

pub fn is_valid_level(level: &str) -> bool {
    LEVELS.contains(&level)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLectureRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub subject: String,
    pub topic: String,
    pub content_type: String,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLectureRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub level: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LectureListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub subject: Option<String>,
    pub published: Option<bool>,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_and_level_allow_lists() {
        assert!(is_valid_content_type("video"));
        assert!(is_valid_content_type("quiz"));
        assert!(!is_valid_content_type("livestream"));
        assert!(is_valid_level("beginner"));
        assert!(!is_valid_level("expert"));
    }

    #[test]
    fn update_request_defaults_to_no_changes() {
        let req: UpdateLectureRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
        assert!(req.is_published.is_none());
    }
}
