use std::sync::Arc;

use tracing::{info, warn};

use super::models::{Actor, Course, CourseContent, ProposalStatus};
use super::repository::{CourseRepository, ProposalRepository};
use super::visibility;
use crate::errors::{CatalogError, CatalogResult};

/// Turns an approved proposal into its one and only course.
///
/// The uniqueness guard lives in the course repository
/// ([`CourseRepository::create_course_if_absent`]); this type only decides
/// whether the caller may ask for it.
#[derive(Clone)]
pub struct CourseMaterializer {
    proposals: Arc<dyn ProposalRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl CourseMaterializer {
    pub fn new(proposals: Arc<dyn ProposalRepository>, courses: Arc<dyn CourseRepository>) -> Self {
        Self { proposals, courses }
    }

    /// Creates the draft course for `proposal_id`.
    ///
    /// Only the author may materialize; everyone else gets not-found. A
    /// second call, concurrent or not, fails with
    /// [`CatalogError::CourseAlreadyExists`] naming the first course.
    pub async fn materialize(&self, proposal_id: i64, actor: &Actor) -> CatalogResult<Course> {
        let proposal = self
            .proposals
            .get_proposal(proposal_id)
            .await?
            .filter(|p| visibility::is_author(actor, p))
            .ok_or_else(|| CatalogError::proposal_not_found(proposal_id))?;

        if proposal.status != ProposalStatus::Approved {
            return Err(CatalogError::NotApproved {
                id: proposal_id,
                current: proposal.status,
            });
        }

        let content = CourseContent::from(&proposal.fields);
        let (course, existed) = self
            .courses
            .create_course_if_absent(proposal_id, proposal.author_id, content)
            .await?;

        if existed {
            warn!(
                proposal_id,
                course_id = course.id,
                actor_id = actor.id,
                "Course already materialized"
            );
            return Err(CatalogError::CourseAlreadyExists {
                proposal_id,
                course_id: course.id,
            });
        }

        info!(
            proposal_id,
            course_id = course.id,
            instructor_id = course.instructor_id,
            "Materialized course from proposal"
        );
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryStore;
    use crate::catalog::models::{CourseStatus, ProposalFields};

    async fn setup(status: ProposalStatus) -> (Arc<MemoryStore>, CourseMaterializer, i64) {
        let store = Arc::new(MemoryStore::new());
        let fields = ProposalFields {
            title: "Rust for Analysts".into(),
            summary: "Ownership without tears".into(),
            target_audience: "Data people".into(),
            learning_objectives: "Borrow checker".into(),
            outline: "1. Basics".into(),
            assumed_prerequisites: "Python".into(),
            qualifications: "Shipped things".into(),
        };
        let p = store.insert_proposal(1, fields).await.unwrap();
        if status != ProposalStatus::Draft {
            store
                .set_proposal_status(p.id, ProposalStatus::Draft, status, None)
                .await
                .unwrap();
        }
        let materializer = CourseMaterializer::new(store.clone(), store.clone());
        (store, materializer, p.id)
    }

    #[tokio::test]
    async fn test_materialize_copies_content() {
        let (_store, materializer, pid) = setup(ProposalStatus::Approved).await;
        let course = materializer
            .materialize(pid, &Actor::student(1))
            .await
            .unwrap();
        assert_eq!(course.proposal_id, Some(pid));
        assert_eq!(course.instructor_id, 1);
        assert_eq!(course.status, CourseStatus::Draft);
        assert_eq!(course.content.title, "Rust for Analysts");
        assert_eq!(course.content.assumed_prerequisites, "Python");
    }

    #[tokio::test]
    async fn test_second_call_reports_existing_course() {
        let (_store, materializer, pid) = setup(ProposalStatus::Approved).await;
        let author = Actor::student(1);
        let first = materializer.materialize(pid, &author).await.unwrap();
        let err = materializer.materialize(pid, &author).await.unwrap_err();
        assert_eq!(err.existing_course_id(), Some(first.id));
    }

    #[tokio::test]
    async fn test_requires_approved_status() {
        let (_store, materializer, pid) = setup(ProposalStatus::Submitted).await;
        let err = materializer
            .materialize(pid, &Actor::student(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::NotApproved {
                current: ProposalStatus::Submitted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_non_author_gets_not_found() {
        let (store, materializer, pid) = setup(ProposalStatus::Approved).await;
        for actor in [Actor::student(2), Actor::admin(99)] {
            let err = materializer.materialize(pid, &actor).await.unwrap_err();
            assert!(matches!(err, CatalogError::NotFound { .. }));
        }
        assert!(store.find_course_by_proposal(pid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_proposal() {
        let (_store, materializer, _) = setup(ProposalStatus::Approved).await;
        let err = materializer
            .materialize(404, &Actor::student(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { id: 404, .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_materialize_creates_one_course() {
        let (store, materializer, pid) = setup(ProposalStatus::Approved).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = materializer.clone();
                tokio::spawn(async move { m.materialize(pid, &Actor::student(1)).await })
            })
            .collect();
        let results: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        let course_id = winners[0].id;
        for loser in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(loser.existing_course_id(), Some(course_id));
        }
        assert_eq!(store.list_courses_by_instructor(1).await.unwrap().len(), 1);
    }
}
