use std::sync::Arc;

use tracing::{debug, info, warn};

use super::lifecycle::{self, ActionParty, TransitionError};
use super::materializer::CourseMaterializer;
use super::models::{Actor, Course, Proposal, ProposalAction, ProposalFields, ReviewStamp};
use super::repository::{Cas, ProposalRepository, Repositories};
use super::visibility;
use crate::errors::{CatalogError, CatalogResult};

/// Upper bound on compare-and-set re-evaluations for one request. Each retry
/// means another writer changed the proposal in between, so this is only hit
/// under sustained contention on a single record.
const MAX_CAS_ATTEMPTS: usize = 8;

/// Orchestrates every proposal operation.
///
/// Each call resolves visibility first, then decides with the lifecycle
/// rules, then commits through a compare-and-set keyed on the status that was
/// decided against. When that status moved underneath us the fresh record is
/// re-evaluated from the top, so a losing racer fails against the state the
/// winner produced.
#[derive(Clone)]
pub struct ProposalService {
    proposals: Arc<dyn ProposalRepository>,
    materializer: CourseMaterializer,
}

impl ProposalService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            proposals: repos.proposals.clone(),
            materializer: CourseMaterializer::new(repos.proposals.clone(), repos.courses.clone()),
        }
    }

    pub async fn create(&self, actor: &Actor, fields: ProposalFields) -> CatalogResult<Proposal> {
        let proposal = self
            .proposals
            .insert_proposal(actor.id, fields.trimmed())
            .await?;
        info!(
            proposal_id = proposal.id,
            author_id = actor.id,
            title = %proposal.fields.title,
            "Proposal created"
        );
        Ok(proposal)
    }

    pub async fn get(&self, actor: &Actor, id: i64) -> CatalogResult<Proposal> {
        self.load_visible(actor, id).await
    }

    pub async fn list_mine(&self, actor: &Actor) -> CatalogResult<Vec<Proposal>> {
        Ok(self.proposals.list_proposals_by_author(actor.id).await?)
    }

    /// Admins get the review queue across all authors; everyone else gets
    /// their own proposals.
    pub async fn list(&self, actor: &Actor) -> CatalogResult<Vec<Proposal>> {
        if actor.is_admin() {
            Ok(self
                .proposals
                .list_proposals_by_status(&visibility::REVIEWABLE)
                .await?)
        } else {
            self.list_mine(actor).await
        }
    }

    /// Replaces every content field. Fields absent from the request are
    /// expected to arrive here as empty strings.
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        fields: ProposalFields,
    ) -> CatalogResult<Proposal> {
        let fields = fields.trimmed();
        let mut current = self.load_owned(actor, id).await?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            if !lifecycle::is_editable(current.status) {
                return Err(CatalogError::NotEditable {
                    id,
                    current: current.status,
                });
            }
            match self
                .proposals
                .replace_proposal_fields(id, current.status, fields.clone())
                .await?
            {
                Cas::Applied(updated) => {
                    info!(proposal_id = id, author_id = actor.id, status = %updated.status, "Proposal updated");
                    return Ok(updated);
                }
                Cas::Stale(fresh) => {
                    warn!(proposal_id = id, expected = %current.status, found = %fresh.status, "Concurrent change during update, re-evaluating");
                    current = fresh;
                }
                Cas::Missing => return Err(CatalogError::proposal_not_found(id)),
            }
        }
        Err(contention(id))
    }

    pub async fn delete(&self, actor: &Actor, id: i64) -> CatalogResult<()> {
        let mut current = self.load_owned(actor, id).await?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            if !lifecycle::is_deletable(current.status) {
                return Err(CatalogError::NotDeletable {
                    id,
                    current: current.status,
                });
            }
            match self.proposals.delete_proposal(id, current.status).await? {
                Cas::Applied(deleted) => {
                    info!(proposal_id = id, author_id = actor.id, title = %deleted.fields.title, "Proposal deleted");
                    return Ok(());
                }
                Cas::Stale(fresh) => current = fresh,
                Cas::Missing => return Err(CatalogError::proposal_not_found(id)),
            }
        }
        Err(contention(id))
    }

    /// Applies a lifecycle action.
    ///
    /// Review actions stamp the acting admin as reviewer and always overwrite
    /// the stored notes (with an empty string if none were given). Author
    /// actions leave both as they were, and ignore `review_notes`.
    pub async fn apply_action(
        &self,
        actor: &Actor,
        id: i64,
        action: ProposalAction,
        review_notes: Option<String>,
    ) -> CatalogResult<Proposal> {
        let review = match action.party() {
            ActionParty::Reviewer => Some(ReviewStamp {
                reviewer_id: actor.id,
                notes: review_notes.unwrap_or_default(),
            }),
            ActionParty::Author => None,
        };
        let mut current = self.load_visible(actor, id).await?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            let is_author = visibility::is_author(actor, &current);
            let next = match lifecycle::decide(current.status, action, actor, is_author) {
                Ok(next) => next,
                Err(TransitionError::Denied) => return Err(denied(actor, id, action)),
                Err(TransitionError::Inapplicable) => {
                    debug!(proposal_id = id, %action, current = %current.status, "Action not applicable");
                    return Err(CatalogError::InvalidTransition {
                        current: current.status,
                        action,
                    });
                }
            };

            match self
                .proposals
                .set_proposal_status(id, current.status, next, review.clone())
                .await?
            {
                Cas::Applied(updated) => {
                    info!(
                        proposal_id = id,
                        actor_id = actor.id,
                        role = actor.role.as_str(),
                        %action,
                        from = %current.status,
                        to = %updated.status,
                        "Proposal transitioned"
                    );
                    return Ok(updated);
                }
                Cas::Stale(fresh) => {
                    warn!(
                        proposal_id = id,
                        %action,
                        expected = %current.status,
                        found = %fresh.status,
                        "Concurrent transition, re-evaluating"
                    );
                    if !visibility::can_view_proposal(Some(actor), &fresh) {
                        return Err(CatalogError::proposal_not_found(id));
                    }
                    current = fresh;
                }
                Cas::Missing => return Err(CatalogError::proposal_not_found(id)),
            }
        }
        Err(contention(id))
    }

    pub async fn materialize_course(&self, actor: &Actor, id: i64) -> CatalogResult<Course> {
        self.materializer.materialize(id, actor).await
    }

    async fn load_visible(&self, actor: &Actor, id: i64) -> CatalogResult<Proposal> {
        self.proposals
            .get_proposal(id)
            .await?
            .filter(|p| visibility::can_view_proposal(Some(actor), p))
            .ok_or_else(|| CatalogError::proposal_not_found(id))
    }

    /// Field edits and deletes belong to the author alone.
    async fn load_owned(&self, actor: &Actor, id: i64) -> CatalogResult<Proposal> {
        self.proposals
            .get_proposal(id)
            .await?
            .filter(|p| visibility::is_author(actor, p))
            .ok_or_else(|| CatalogError::proposal_not_found(id))
    }
}

/// A visible proposal acted on by the wrong party. Author actions by anyone
/// else read as not-found; review actions by a non-admin are forbidden.
fn denied(actor: &Actor, id: i64, action: ProposalAction) -> CatalogError {
    match action.party() {
        ActionParty::Author => CatalogError::proposal_not_found(id),
        ActionParty::Reviewer => CatalogError::NotReviewer {
            actor_id: actor.id,
            proposal_id: id,
        },
    }
}

fn contention(id: i64) -> CatalogError {
    CatalogError::Storage(anyhow::anyhow!(
        "Proposal {} kept changing after {} attempts",
        id,
        MAX_CAS_ATTEMPTS
    ))
}
