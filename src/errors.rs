//! Typed error hierarchy for the course catalog.
//!
//! `CatalogError` is returned by every service operation. Callers that need to
//! translate it into a transport outcome (HTTP status, CLI exit code) go
//! through [`CatalogError::kind`] rather than matching variants directly.

use thiserror::Error;

use crate::catalog::models::{ProposalAction, ProposalStatus};

/// Coarse classification of a [`CatalogError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-bounds input.
    Validation,
    /// Absent, or present but invisible to the caller.
    NotFound,
    /// Structurally valid but inapplicable to the current state.
    Conflict,
    /// Authenticated but lacking ownership of a non-sensitive resource.
    Forbidden,
    Internal,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("Cannot {action} a proposal that is {current}")]
    InvalidTransition {
        current: ProposalStatus,
        action: ProposalAction,
    },

    #[error("Proposal {id} cannot be edited while {current}")]
    NotEditable { id: i64, current: ProposalStatus },

    #[error("Proposal {id} cannot be deleted while {current}")]
    NotDeletable { id: i64, current: ProposalStatus },

    #[error("Proposal {id} is {current}, not approved")]
    NotApproved { id: i64, current: ProposalStatus },

    #[error("Course {course_id} already exists for proposal {proposal_id}")]
    CourseAlreadyExists { proposal_id: i64, course_id: i64 },

    #[error("Course {id} is already published")]
    AlreadyPublished { id: i64 },

    #[error("Actor {actor_id} may not modify course {course_id}")]
    Forbidden { actor_id: i64, course_id: i64 },

    #[error("Actor {actor_id} may not review proposal {proposal_id}")]
    NotReviewer { actor_id: i64, proposal_id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn proposal_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: "Proposal",
            id,
        }
    }

    pub fn course_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: "Course",
            id,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::UnknownAction(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. }
            | Self::NotEditable { .. }
            | Self::NotDeletable { .. }
            | Self::NotApproved { .. }
            | Self::CourseAlreadyExists { .. }
            | Self::AlreadyPublished { .. } => ErrorKind::Conflict,
            Self::Forbidden { .. } | Self::NotReviewer { .. } => ErrorKind::Forbidden,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// The proposal status a conflict was evaluated against, if any.
    pub fn current_status(&self) -> Option<ProposalStatus> {
        match self {
            Self::InvalidTransition { current, .. }
            | Self::NotEditable { current, .. }
            | Self::NotDeletable { current, .. }
            | Self::NotApproved { current, .. } => Some(*current),
            _ => None,
        }
    }

    /// The already-materialized course, for callers recovering from a
    /// duplicate `create-course`.
    pub fn existing_course_id(&self) -> Option<i64> {
        match self {
            Self::CourseAlreadyExists { course_id, .. } => Some(*course_id),
            _ => None,
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
