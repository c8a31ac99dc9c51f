use serde::{Deserialize, Serialize};

use super::repo::Group;

pub const SUBJECTS: &[&str] = &[
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "General",
    "Exam Prep",
];
pub const KINDS: &[&str] = &["study", "discussion", "project"];

pub fn is_valid_subject(subject: &str) -> bool {
    SUBJECTS.contains(&subject)
}

pub fn is_valid_kind(kind: &str) -> bool {
    KINDS.contains(&kind)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub max_members: Option<i32>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub kind: Option<String>,
    pub max_members: Option<i32>,
    pub is_private: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    #[serde(default)]
    pub join_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub subject: Option<String>,
    pub kind: Option<String>,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

/// Creation response carries the join code once; it is never serialized on
/// the group itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGroupResponse {
    pub message: String,
    pub group: Group,
    pub join_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_subject_list_includes_exam_prep() {
        assert!(is_valid_subject("Exam Prep"));
        assert!(!is_valid_subject("exam prep"));
    }

    #[test]
    fn kind_allow_list() {
        assert!(is_valid_kind("study"));
        assert!(is_valid_kind("project"));
        assert!(!is_valid_kind("club"));
    }
}
