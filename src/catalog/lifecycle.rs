//! Proposal review state machine.
//!
//! Pure decision functions: nothing here touches storage. The service feeds
//! the current status in, and commits the returned status with a
//! compare-and-set keyed on the status it fed in.

use super::models::{Actor, ProposalAction, ProposalStatus};

/// Which side of the review an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionParty {
    Author,
    Reviewer,
}

impl ProposalAction {
    pub fn party(&self) -> ActionParty {
        if self.is_review() {
            ActionParty::Reviewer
        } else {
            ActionParty::Author
        }
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The actor is not the party the action belongs to.
    Denied,
    /// The action does not apply to the current status.
    Inapplicable,
}

/// The transition table. `None` means the action is not defined from
/// `current`, regardless of who asks.
pub fn transition_target(
    current: ProposalStatus,
    action: ProposalAction,
) -> Option<ProposalStatus> {
    use ProposalAction as A;
    use ProposalStatus as S;

    match (current, action) {
        (S::Draft | S::ChangesRequested, A::Submit) => Some(S::Submitted),
        (S::Submitted, A::Approve) => Some(S::Approved),
        (S::Submitted, A::Reject) => Some(S::Rejected),
        (S::Submitted, A::RequestChanges) => Some(S::ChangesRequested),
        (S::Submitted | S::ChangesRequested, A::Withdraw) => Some(S::Withdrawn),
        (
            S::Draft
            | S::Submitted
            | S::ChangesRequested
            | S::Approved
            | S::Rejected
            | S::Withdrawn,
            _,
        ) => None,
    }
}

/// Decides the status `action` moves a proposal to.
///
/// `is_author` is whether `actor` wrote the proposal. Author actions require
/// authorship; review actions require the admin role. The party check runs
/// first so that a caller without standing learns nothing about the status.
pub fn decide(
    current: ProposalStatus,
    action: ProposalAction,
    actor: &Actor,
    is_author: bool,
) -> Result<ProposalStatus, TransitionError> {
    let permitted = match action.party() {
        ActionParty::Author => is_author,
        ActionParty::Reviewer => actor.is_admin(),
    };
    if !permitted {
        return Err(TransitionError::Denied);
    }
    transition_target(current, action).ok_or(TransitionError::Inapplicable)
}

/// Content edits are allowed only before review or after changes were asked for.
pub fn is_editable(status: ProposalStatus) -> bool {
    matches!(
        status,
        ProposalStatus::Draft | ProposalStatus::ChangesRequested
    )
}

/// Only drafts may be hard-deleted.
pub fn is_deletable(status: ProposalStatus) -> bool {
    status == ProposalStatus::Draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    fn is_final(status: ProposalStatus) -> bool {
        matches!(
            status,
            ProposalStatus::Approved | ProposalStatus::Rejected | ProposalStatus::Withdrawn
        )
    }

    const ACTIONS: [ProposalAction; 5] = [
        ProposalAction::Submit,
        ProposalAction::Approve,
        ProposalAction::Reject,
        ProposalAction::RequestChanges,
        ProposalAction::Withdraw,
    ];

    #[test]
    fn test_author_submits_draft() {
        let author = Actor::student(1);
        assert_eq!(
            decide(ProposalStatus::Draft, ProposalAction::Submit, &author, true),
            Ok(ProposalStatus::Submitted)
        );
    }

    #[test]
    fn test_resubmit_after_changes_requested() {
        let author = Actor::student(1);
        assert_eq!(
            decide(
                ProposalStatus::ChangesRequested,
                ProposalAction::Submit,
                &author,
                true
            ),
            Ok(ProposalStatus::Submitted)
        );
    }

    #[test]
    fn test_admin_review_outcomes() {
        let admin = Actor::admin(99);
        let submitted = ProposalStatus::Submitted;
        assert_eq!(
            decide(submitted, ProposalAction::Approve, &admin, false),
            Ok(ProposalStatus::Approved)
        );
        assert_eq!(
            decide(submitted, ProposalAction::Reject, &admin, false),
            Ok(ProposalStatus::Rejected)
        );
        assert_eq!(
            decide(submitted, ProposalAction::RequestChanges, &admin, false),
            Ok(ProposalStatus::ChangesRequested)
        );
    }

    #[test]
    fn test_withdraw_from_submitted_and_changes_requested() {
        let author = Actor::student(1);
        for from in [ProposalStatus::Submitted, ProposalStatus::ChangesRequested] {
            assert_eq!(
                decide(from, ProposalAction::Withdraw, &author, true),
                Ok(ProposalStatus::Withdrawn)
            );
        }
        assert_eq!(
            decide(ProposalStatus::Draft, ProposalAction::Withdraw, &author, true),
            Err(TransitionError::Inapplicable)
        );
    }

    #[test]
    fn test_student_cannot_review() {
        let author = Actor::student(1);
        assert_eq!(
            decide(ProposalStatus::Submitted, ProposalAction::Approve, &author, true),
            Err(TransitionError::Denied)
        );
    }

    #[test]
    fn test_admin_cannot_submit_for_someone_else() {
        let admin = Actor::admin(99);
        assert_eq!(
            decide(ProposalStatus::Draft, ProposalAction::Submit, &admin, false),
            Err(TransitionError::Denied)
        );
    }

    #[test]
    fn test_admin_author_may_do_both_sides() {
        let admin = Actor::admin(5);
        assert_eq!(
            decide(ProposalStatus::Draft, ProposalAction::Submit, &admin, true),
            Ok(ProposalStatus::Submitted)
        );
        assert_eq!(
            decide(ProposalStatus::Submitted, ProposalAction::Approve, &admin, true),
            Ok(ProposalStatus::Approved)
        );
    }

    #[test]
    fn test_final_states_have_no_transitions() {
        for status in ProposalStatus::ALL.into_iter().filter(|s| is_final(*s)) {
            for action in ACTIONS {
                assert_eq!(transition_target(status, action), None, "{status} {action}");
            }
        }
    }

    #[test]
    fn test_repeat_submit_is_inapplicable() {
        let author = Actor::student(1);
        assert_eq!(
            decide(ProposalStatus::Submitted, ProposalAction::Submit, &author, true),
            Err(TransitionError::Inapplicable)
        );
    }

    #[test]
    fn test_editable_and_deletable() {
        let editable: Vec<_> = ProposalStatus::ALL
            .into_iter()
            .filter(|s| is_editable(*s))
            .collect();
        assert_eq!(
            editable,
            vec![ProposalStatus::Draft, ProposalStatus::ChangesRequested]
        );
        let deletable: Vec<_> = ProposalStatus::ALL
            .into_iter()
            .filter(|s| is_deletable(*s))
            .collect();
        assert_eq!(deletable, vec![ProposalStatus::Draft]);
    }

    /// Walks every status reachable from `draft` and checks that each edge
    /// into `approved` leaves from `submitted`.
    #[test]
    fn test_approved_only_reachable_through_submitted() {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([ProposalStatus::Draft]);
        while let Some(status) = queue.pop_front() {
            if !seen.insert(status) {
                continue;
            }
            for action in ACTIONS {
                if let Some(next) = transition_target(status, action) {
                    if next == ProposalStatus::Approved {
                        assert_eq!(status, ProposalStatus::Submitted);
                    }
                    queue.push_back(next);
                }
            }
        }
        assert_eq!(seen.len(), ProposalStatus::ALL.len());
    }
}
