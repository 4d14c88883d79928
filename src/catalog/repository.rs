//! Storage contracts for proposals and courses.
//!
//! Every mutating method is a compare-and-set: it names the status it expects
//! the record to be in and reports what it found when that expectation does
//! not hold. Implementations must apply each call atomically.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::models::{
    Course, CourseContent, Proposal, ProposalFields, ProposalStatus, ReviewStamp,
};

/// Outcome of a compare-and-set against a stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cas<T> {
    /// The expectation held; carries the record after the write.
    Applied(T),
    /// The record exists but was not in the expected state; carries it as
    /// found, unchanged.
    Stale(T),
    Missing,
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Stores a new `draft` proposal and returns it with its assigned id.
    async fn insert_proposal(&self, author_id: i64, fields: ProposalFields) -> Result<Proposal>;

    async fn get_proposal(&self, id: i64) -> Result<Option<Proposal>>;

    async fn list_proposals_by_author(&self, author_id: i64) -> Result<Vec<Proposal>>;

    async fn list_proposals_by_status(&self, statuses: &[ProposalStatus]) -> Result<Vec<Proposal>>;

    /// Moves `id` from `expected` to `next`. A `review` overwrites the stored
    /// reviewer and notes in the same write; `None` leaves both untouched.
    async fn set_proposal_status(
        &self,
        id: i64,
        expected: ProposalStatus,
        next: ProposalStatus,
        review: Option<ReviewStamp>,
    ) -> Result<Cas<Proposal>>;

    /// Replaces all content fields of `id` if it is still in `expected`.
    async fn replace_proposal_fields(
        &self,
        id: i64,
        expected: ProposalStatus,
        fields: ProposalFields,
    ) -> Result<Cas<Proposal>>;

    /// Hard-deletes `id` if it is still in `expected`. `Applied` carries the
    /// deleted record.
    async fn delete_proposal(&self, id: i64, expected: ProposalStatus) -> Result<Cas<Proposal>>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Stores a `draft` course that did not come from a proposal.
    async fn insert_course(&self, instructor_id: i64, content: CourseContent) -> Result<Course>;

    /// Atomically creates the single course for `proposal_id`, or returns the
    /// one that already exists. The flag is `true` when the course existed.
    async fn create_course_if_absent(
        &self,
        proposal_id: i64,
        instructor_id: i64,
        content: CourseContent,
    ) -> Result<(Course, bool)>;

    async fn get_course(&self, id: i64) -> Result<Option<Course>>;

    async fn find_course_by_proposal(&self, proposal_id: i64) -> Result<Option<Course>>;

    async fn list_published_courses(&self) -> Result<Vec<Course>>;

    async fn list_courses_by_instructor(&self, instructor_id: i64) -> Result<Vec<Course>>;

    async fn replace_course_content(&self, id: i64, content: CourseContent)
    -> Result<Option<Course>>;

    /// Moves `id` from `draft` to `published`.
    async fn publish_course(&self, id: i64) -> Result<Cas<Course>>;
}

/// Both repositories, usually backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub proposals: Arc<dyn ProposalRepository>,
    pub courses: Arc<dyn CourseRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ProposalRepository + CourseRepository + 'static,
    {
        Self {
            proposals: store.clone(),
            courses: store,
        }
    }
}
