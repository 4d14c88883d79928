use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Actors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// The identity performing an operation. Every service call takes one
/// explicitly; nothing reads it from ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn student(id: i64) -> Self {
        Self {
            id,
            role: Role::Student,
        }
    }

    pub fn admin(id: i64) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ── Proposals ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Draft,
    Submitted,
    ChangesRequested,
    Approved,
    Rejected,
    Withdrawn,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 6] = [
        Self::Draft,
        Self::Submitted,
        Self::ChangesRequested,
        Self::Approved,
        Self::Rejected,
        Self::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::ChangesRequested => "changes_requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "changes_requested" => Ok(Self::ChangesRequested),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "withdrawn" => Ok(Self::Withdrawn),
            _ => Err(format!("Invalid proposal status: {}", s)),
        }
    }
}

/// A review lifecycle action requested against a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalAction {
    Submit,
    Approve,
    Reject,
    RequestChanges,
    Withdraw,
}

impl ProposalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::RequestChanges => "request-changes",
            Self::Withdraw => "withdraw",
        }
    }

    /// Actions reserved for reviewers. Only these record review notes.
    pub fn is_review(&self) -> bool {
        matches!(self, Self::Approve | Self::Reject | Self::RequestChanges)
    }

    /// Maps the target status used by the legacy `/status` endpoint onto the
    /// action that reaches it.
    pub fn for_target_status(status: &str) -> Option<Self> {
        match status {
            "submitted" => Some(Self::Submit),
            "approved" => Some(Self::Approve),
            "rejected" => Some(Self::Reject),
            "changes_requested" => Some(Self::RequestChanges),
            "withdrawn" => Some(Self::Withdraw),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProposalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submit" => Ok(Self::Submit),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "request-changes" => Ok(Self::RequestChanges),
            "withdraw" => Ok(Self::Withdraw),
            _ => Err(format!("Invalid proposal action: {}", s)),
        }
    }
}

/// Author-editable content of a proposal.
///
/// Missing fields deserialize as empty strings, so an update always replaces
/// the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalFields {
    pub title: String,
    pub summary: String,
    pub target_audience: String,
    pub learning_objectives: String,
    pub outline: String,
    pub assumed_prerequisites: String,
    pub qualifications: String,
}

impl ProposalFields {
    /// Returns a copy with surrounding whitespace stripped from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            target_audience: self.target_audience.trim().to_string(),
            learning_objectives: self.learning_objectives.trim().to_string(),
            outline: self.outline.trim().to_string(),
            assumed_prerequisites: self.assumed_prerequisites.trim().to_string(),
            qualifications: self.qualifications.trim().to_string(),
        }
    }

    /// `(name, value)` pairs in a stable order, for validation messages.
    pub fn named(&self) -> [(&'static str, &str); 7] {
        [
            ("title", self.title.as_str()),
            ("summary", self.summary.as_str()),
            ("target_audience", self.target_audience.as_str()),
            ("learning_objectives", self.learning_objectives.as_str()),
            ("outline", self.outline.as_str()),
            ("assumed_prerequisites", self.assumed_prerequisites.as_str()),
            ("qualifications", self.qualifications.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i64,
    pub author_id: i64,
    #[serde(flatten)]
    pub fields: ProposalFields,
    pub status: ProposalStatus,
    pub review_notes: String,
    /// Admin behind the latest review decision.
    pub reviewer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Written together with the status by approve, reject and request-changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewStamp {
    pub reviewer_id: i64,
    pub notes: String,
}

// ── Courses ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Published,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(format!("Invalid course status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseContent {
    pub title: String,
    pub summary: String,
    pub target_audience: String,
    pub learning_objectives: String,
    pub assumed_prerequisites: String,
}

impl CourseContent {
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            target_audience: self.target_audience.trim().to_string(),
            learning_objectives: self.learning_objectives.trim().to_string(),
            assumed_prerequisites: self.assumed_prerequisites.trim().to_string(),
        }
    }

    pub fn named(&self) -> [(&'static str, &str); 5] {
        [
            ("title", self.title.as_str()),
            ("summary", self.summary.as_str()),
            ("target_audience", self.target_audience.as_str()),
            ("learning_objectives", self.learning_objectives.as_str()),
            ("assumed_prerequisites", self.assumed_prerequisites.as_str()),
        ]
    }
}

impl From<&ProposalFields> for CourseContent {
    /// Copies the fields a course inherits from its proposal, verbatim.
    fn from(fields: &ProposalFields) -> Self {
        Self {
            title: fields.title.clone(),
            summary: fields.summary.clone(),
            target_audience: fields.target_audience.clone(),
            learning_objectives: fields.learning_objectives.clone(),
            assumed_prerequisites: fields.assumed_prerequisites.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub proposal_id: Option<i64>,
    pub instructor_id: i64,
    #[serde(flatten)]
    pub content: CourseContent,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_status_roundtrip() {
        for status in ProposalStatus::ALL {
            let parsed: ProposalStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("pending".parse::<ProposalStatus>().is_err());
    }

    #[test]
    fn test_proposal_action_parse() {
        for s in &["submit", "approve", "reject", "request-changes", "withdraw"] {
            let parsed: ProposalAction = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("request_changes".parse::<ProposalAction>().is_err());
        assert!("create-course".parse::<ProposalAction>().is_err());
    }

    #[test]
    fn test_action_for_target_status() {
        assert_eq!(
            ProposalAction::for_target_status("changes_requested"),
            Some(ProposalAction::RequestChanges)
        );
        assert_eq!(
            ProposalAction::for_target_status("withdrawn"),
            Some(ProposalAction::Withdraw)
        );
        assert_eq!(ProposalAction::for_target_status("draft"), None);
        assert_eq!(ProposalAction::for_target_status("unknown"), None);
    }

    #[test]
    fn test_review_actions() {
        assert!(ProposalAction::Approve.is_review());
        assert!(ProposalAction::RequestChanges.is_review());
        assert!(!ProposalAction::Submit.is_review());
        assert!(!ProposalAction::Withdraw.is_review());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_fields_trimmed() {
        let fields = ProposalFields {
            title: "  Rust 101 ".into(),
            outline: "\n- one\n- two\n".into(),
            ..Default::default()
        };
        let trimmed = fields.trimmed();
        assert_eq!(trimmed.title, "Rust 101");
        assert_eq!(trimmed.outline, "- one\n- two");
        assert_eq!(trimmed.summary, "");
    }

    #[test]
    fn test_missing_fields_deserialize_empty() {
        let fields: ProposalFields =
            serde_json::from_str(r#"{"title": "T", "summary": "S"}"#).unwrap();
        assert_eq!(fields.title, "T");
        assert_eq!(fields.outline, "");
        assert_eq!(fields.qualifications, "");
    }

    #[test]
    fn test_course_content_from_proposal_fields() {
        let fields = ProposalFields {
            title: "T".into(),
            summary: "S".into(),
            target_audience: "A".into(),
            learning_objectives: "L".into(),
            outline: "O".into(),
            assumed_prerequisites: "P".into(),
            qualifications: "Q".into(),
        };
        let content = CourseContent::from(&fields);
        assert_eq!(content.title, "T");
        assert_eq!(content.target_audience, "A");
        assert_eq!(content.assumed_prerequisites, "P");
    }

    #[test]
    fn test_proposal_serializes_flat() {
        let now = Utc::now();
        let proposal = Proposal {
            id: 3,
            author_id: 9,
            fields: ProposalFields {
                title: "T".into(),
                ..Default::default()
            },
            status: ProposalStatus::ChangesRequested,
            review_notes: String::new(),
            reviewer_id: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(value["title"], "T");
        assert_eq!(value["author_id"], 9);
        assert_eq!(value["status"], "changes_requested");
        assert!(value["reviewer_id"].is_null());
    }
}
