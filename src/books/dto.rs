use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Book;

pub const SUBJECTS: &[&str] = &["Mathematics", "Physics", "Chemistry", "Biology", "General"];

pub fn is_valid_subject(subject: &str) -> bool {
    SUBJECTS.contains(&subject)
}

#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub subject: Option<String>,
    #[serde(default = "default_true")]
    pub approved: bool,
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    10
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub books: Vec<Book>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct UploadBookResponse {
    pub message: String,
    pub book: Uuid,
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBookRequest {
    pub approved: bool,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_allow_list() {
        assert!(is_valid_subject("Mathematics"));
        assert!(is_valid_subject("General"));
        assert!(!is_valid_subject("mathematics"));
        assert!(!is_valid_subject("History"));
    }

    #[test]
    fn list_query_defaults() {
        let q: BookListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert!(q.approved);
        assert!(q.subject.is_none());
        assert!(q.search.is_none());
    }
}
