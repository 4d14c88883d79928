//! Who may observe which proposals and courses.
//!
//! A denied view must be indistinguishable from a missing record, so callers
//! turn `false` here into the same not-found error they use for absent ids.

use super::models::{Actor, Course, CourseStatus, Proposal, ProposalStatus};

/// Statuses an admin reviewer can see on proposals they did not write.
pub const REVIEWABLE: [ProposalStatus; 4] = [
    ProposalStatus::Submitted,
    ProposalStatus::ChangesRequested,
    ProposalStatus::Approved,
    ProposalStatus::Rejected,
];

pub fn is_reviewable(status: ProposalStatus) -> bool {
    REVIEWABLE.contains(&status)
}

pub fn is_author(viewer: &Actor, proposal: &Proposal) -> bool {
    viewer.id == proposal.author_id
}

/// Authors see their own proposals in any status; admins see everything that
/// has entered review and was not withdrawn.
pub fn can_view_proposal(viewer: Option<&Actor>, proposal: &Proposal) -> bool {
    match viewer {
        Some(actor) if is_author(actor, proposal) => true,
        Some(actor) if actor.is_admin() => is_reviewable(proposal.status),
        _ => false,
    }
}

/// Published courses are public. Drafts are visible to their instructor and
/// to admins.
pub fn can_view_course(viewer: Option<&Actor>, course: &Course) -> bool {
    if course.status == CourseStatus::Published {
        return true;
    }
    match viewer {
        Some(actor) => actor.id == course.instructor_id || actor.is_admin(),
        None => false,
    }
}

pub fn can_modify_course(actor: &Actor, course: &Course) -> bool {
    actor.id == course.instructor_id
}
