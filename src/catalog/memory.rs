use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use super::models::*;
use super::repository::{Cas, CourseRepository, ProposalRepository};

/// Process-local store. One mutex guards all records, which makes every
/// repository call atomic with respect to every other.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_proposal_id: i64,
    proposals: BTreeMap<i64, Proposal>,
    last_course_id: i64,
    courses: BTreeMap<i64, Course>,
    course_by_proposal: HashMap<i64, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> Result<R> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("Store lock poisoned: {}", e))?;
        Ok(f(&mut guard))
    }
}

impl MemoryState {
    fn new_course(
        &mut self,
        proposal_id: Option<i64>,
        instructor_id: i64,
        content: CourseContent,
    ) -> Course {
        self.last_course_id += 1;
        let now = Utc::now();
        let course = Course {
            id: self.last_course_id,
            proposal_id,
            instructor_id,
            content,
            status: CourseStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        if let Some(pid) = proposal_id {
            self.course_by_proposal.insert(pid, course.id);
        }
        self.courses.insert(course.id, course.clone());
        course
    }

    /// Runs `apply` on proposal `id` only if it is in `expected`.
    fn cas_proposal(
        &mut self,
        id: i64,
        expected: ProposalStatus,
        apply: impl FnOnce(&mut Proposal),
    ) -> Cas<Proposal> {
        match self.proposals.get_mut(&id) {
            None => Cas::Missing,
            Some(p) if p.status != expected => Cas::Stale(p.clone()),
            Some(p) => {
                apply(p);
                p.updated_at = Utc::now();
                Cas::Applied(p.clone())
            }
        }
    }
}

#[async_trait]
impl ProposalRepository for MemoryStore {
    async fn insert_proposal(&self, author_id: i64, fields: ProposalFields) -> Result<Proposal> {
        self.with_state(|state| {
            state.last_proposal_id += 1;
            let now = Utc::now();
            let proposal = Proposal {
                id: state.last_proposal_id,
                author_id,
                fields,
                status: ProposalStatus::Draft,
                review_notes: String::new(),
                reviewer_id: None,
                created_at: now,
                updated_at: now,
            };
            state.proposals.insert(proposal.id, proposal.clone());
            proposal
        })
    }

    async fn get_proposal(&self, id: i64) -> Result<Option<Proposal>> {
        self.with_state(|state| state.proposals.get(&id).cloned())
    }

    async fn list_proposals_by_author(&self, author_id: i64) -> Result<Vec<Proposal>> {
        self.with_state(|state| {
            state
                .proposals
                .values()
                .filter(|p| p.author_id == author_id)
                .cloned()
                .collect()
        })
    }

    async fn list_proposals_by_status(&self, statuses: &[ProposalStatus]) -> Result<Vec<Proposal>> {
        self.with_state(|state| {
            state
                .proposals
                .values()
                .filter(|p| statuses.contains(&p.status))
                .cloned()
                .collect()
        })
    }

    async fn set_proposal_status(
        &self,
        id: i64,
        expected: ProposalStatus,
        next: ProposalStatus,
        review: Option<ReviewStamp>,
    ) -> Result<Cas<Proposal>> {
        self.with_state(|state| {
            state.cas_proposal(id, expected, |p| {
                p.status = next;
                if let Some(review) = review {
                    p.reviewer_id = Some(review.reviewer_id);
                    p.review_notes = review.notes;
                }
            })
        })
    }

    async fn replace_proposal_fields(
        &self,
        id: i64,
        expected: ProposalStatus,
        fields: ProposalFields,
    ) -> Result<Cas<Proposal>> {
        self.with_state(|state| state.cas_proposal(id, expected, |p| p.fields = fields))
    }

    async fn delete_proposal(&self, id: i64, expected: ProposalStatus) -> Result<Cas<Proposal>> {
        self.with_state(|state| {
            let found = state.proposals.get(&id).map(|p| p.status);
            match found {
                Some(status) if status == expected => match state.proposals.remove(&id) {
                    Some(removed) => Cas::Applied(removed),
                    None => Cas::Missing,
                },
                Some(_) => match state.proposals.get(&id) {
                    Some(p) => Cas::Stale(p.clone()),
                    None => Cas::Missing,
                },
                None => Cas::Missing,
            }
        })
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn insert_course(&self, instructor_id: i64, content: CourseContent) -> Result<Course> {
        self.with_state(|state| state.new_course(None, instructor_id, content))
    }

    async fn create_course_if_absent(
        &self,
        proposal_id: i64,
        instructor_id: i64,
        content: CourseContent,
    ) -> Result<(Course, bool)> {
        self.with_state(|state| {
            let existing = state
                .course_by_proposal
                .get(&proposal_id)
                .and_then(|id| state.courses.get(id))
                .cloned();
            match existing {
                Some(course) => (course, true),
                None => (
                    state.new_course(Some(proposal_id), instructor_id, content),
                    false,
                ),
            }
        })
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>> {
        self.with_state(|state| state.courses.get(&id).cloned())
    }

    async fn find_course_by_proposal(&self, proposal_id: i64) -> Result<Option<Course>> {
        self.with_state(|state| {
            state
                .course_by_proposal
                .get(&proposal_id)
                .and_then(|id| state.courses.get(id))
                .cloned()
        })
    }

    async fn list_published_courses(&self) -> Result<Vec<Course>> {
        self.with_state(|state| {
            state
                .courses
                .values()
                .filter(|c| c.status == CourseStatus::Published)
                .cloned()
                .collect()
        })
    }

    async fn list_courses_by_instructor(&self, instructor_id: i64) -> Result<Vec<Course>> {
        self.with_state(|state| {
            state
                .courses
                .values()
                .filter(|c| c.instructor_id == instructor_id)
                .cloned()
                .collect()
        })
    }

    async fn replace_course_content(
        &self,
        id: i64,
        content: CourseContent,
    ) -> Result<Option<Course>> {
        self.with_state(|state| {
            state.courses.get_mut(&id).map(|c| {
                c.content = content;
                c.updated_at = Utc::now();
                c.clone()
            })
        })
    }

    async fn publish_course(&self, id: i64) -> Result<Cas<Course>> {
        self.with_state(|state| match state.courses.get_mut(&id) {
            None => Cas::Missing,
            Some(c) if c.status != CourseStatus::Draft => Cas::Stale(c.clone()),
            Some(c) => {
                c.status = CourseStatus::Published;
                c.updated_at = Utc::now();
                Cas::Applied(c.clone())
            }
        })
    }
}
