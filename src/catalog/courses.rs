use std::sync::Arc;

use tracing::info;

use super::models::{Actor, Course, CourseContent};
use super::repository::{Cas, CourseRepository};
use super::visibility;
use crate::errors::{CatalogError, CatalogResult};

/// Course reads and instructor-side edits.
///
/// Course existence is not sensitive the way proposal existence is: a draft
/// course is hidden from strangers, but modifying one you can see without
/// owning it is forbidden rather than not-found.
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// Creates a draft course with no originating proposal.
    pub async fn create_direct(&self, actor: &Actor, content: CourseContent) -> CatalogResult<Course> {
        let course = self.courses.insert_course(actor.id, content.trimmed()).await?;
        info!(course_id = course.id, instructor_id = actor.id, "Course created");
        Ok(course)
    }

    pub async fn get(&self, viewer: Option<&Actor>, id: i64) -> CatalogResult<Course> {
        self.courses
            .get_course(id)
            .await?
            .filter(|c| visibility::can_view_course(viewer, c))
            .ok_or_else(|| CatalogError::course_not_found(id))
    }

    pub async fn list_published(&self) -> CatalogResult<Vec<Course>> {
        Ok(self.courses.list_published_courses().await?)
    }

    pub async fn list_mine(&self, actor: &Actor) -> CatalogResult<Vec<Course>> {
        Ok(self.courses.list_courses_by_instructor(actor.id).await?)
    }

    pub async fn update_content(
        &self,
        actor: &Actor,
        id: i64,
        content: CourseContent,
    ) -> CatalogResult<Course> {
        self.load_modifiable(actor, id).await?;
        let course = self
            .courses
            .replace_course_content(id, content.trimmed())
            .await?
            .ok_or_else(|| CatalogError::course_not_found(id))?;
        info!(course_id = id, instructor_id = actor.id, "Course updated");
        Ok(course)
    }

    /// `draft → published`, exactly once.
    pub async fn publish(&self, actor: &Actor, id: i64) -> CatalogResult<Course> {
        self.load_modifiable(actor, id).await?;
        match self.courses.publish_course(id).await? {
            Cas::Applied(course) => {
                info!(course_id = id, instructor_id = actor.id, "Course published");
                Ok(course)
            }
            Cas::Stale(_) => Err(CatalogError::AlreadyPublished { id }),
            Cas::Missing => Err(CatalogError::course_not_found(id)),
        }
    }

    async fn load_modifiable(&self, actor: &Actor, id: i64) -> CatalogResult<Course> {
        let course = self
            .courses
            .get_course(id)
            .await?
            .ok_or_else(|| CatalogError::course_not_found(id))?;
        if !visibility::can_modify_course(actor, &course) {
            return Err(CatalogError::Forbidden {
                actor_id: actor.id,
                course_id: id,
            });
        }
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryStore;
    use crate::catalog::models::CourseStatus;
    use crate::errors::ErrorKind;

    fn service() -> CourseService {
        CourseService::new(Arc::new(MemoryStore::new()))
    }

    fn content(title: &str) -> CourseContent {
        CourseContent {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_direct_is_draft_without_proposal() {
        let svc = service();
        let c = svc
            .create_direct(&Actor::student(4), content(" Hands-on SQL "))
            .await
            .unwrap();
        assert_eq!(c.status, CourseStatus::Draft);
        assert_eq!(c.proposal_id, None);
        assert_eq!(c.instructor_id, 4);
        assert_eq!(c.content.title, "Hands-on SQL");
    }

    #[tokio::test]
    async fn test_publish_once() {
        let svc = service();
        let owner = Actor::student(4);
        let c = svc.create_direct(&owner, content("C")).await.unwrap();

        let published = svc.publish(&owner, c.id).await.unwrap();
        assert_eq!(published.status, CourseStatus::Published);
        assert!(matches!(
            svc.publish(&owner, c.id).await.unwrap_err(),
            CatalogError::AlreadyPublished { .. }
        ));
    }

    #[tokio::test]
    async fn test_publish_by_non_instructor_is_forbidden() {
        let svc = service();
        let c = svc
            .create_direct(&Actor::student(4), content("C"))
            .await
            .unwrap();
        for actor in [Actor::student(5), Actor::admin(6)] {
            assert_eq!(
                svc.publish(&actor, c.id).await.unwrap_err().kind(),
                ErrorKind::Forbidden
            );
        }
        assert_eq!(
            svc.publish(&Actor::student(4), 999).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_draft_visibility() {
        let svc = service();
        let owner = Actor::student(4);
        let c = svc.create_direct(&owner, content("C")).await.unwrap();

        assert!(svc.get(Some(&owner), c.id).await.is_ok());
        assert!(svc.get(Some(&Actor::admin(1)), c.id).await.is_ok());
        assert!(svc.get(Some(&Actor::student(5)), c.id).await.is_err());
        assert!(svc.get(None, c.id).await.is_err());
        assert!(svc.list_published().await.unwrap().is_empty());

        svc.publish(&owner, c.id).await.unwrap();
        assert!(svc.get(None, c.id).await.is_ok());
        assert_eq!(svc.list_published().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_content() {
        let svc = service();
        let owner = Actor::student(4);
        let c = svc.create_direct(&owner, content("Old")).await.unwrap();

        let updated = svc
            .update_content(&owner, c.id, content("New"))
            .await
            .unwrap();
        assert_eq!(updated.content.title, "New");
        assert_eq!(
            svc.update_content(&Actor::student(5), c.id, content("x"))
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(svc.list_mine(&owner).await.unwrap().len(), 1);
    }
}
