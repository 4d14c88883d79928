//! Course catalog: proposal review lifecycle back-end.
//!
//! ## Overview
//!
//! Authors draft course proposals, admins review them, and an approved
//! proposal can be turned into exactly one draft course that its author
//! later publishes. Every operation takes an explicit [`models::Actor`].
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig)          │
//! │          │ <─────── │    └─ api.rs  (handlers, Actor extractor)        │
//! └──────────┘          │         │                                        │
//!                       │         │ validate.rs (field bounds)             │
//!                       │         v                                        │
//!                       │  service.rs  (ProposalService, CAS retry)        │
//!                       │    ├─ visibility.rs  (who sees what)             │
//!                       │    ├─ lifecycle.rs   (transition table)          │
//!                       │    └─ materializer.rs (one course per proposal)  │
//!                       │  courses.rs  (CourseService)                     │
//!                       │         │                                        │
//!                       │         v                                        │
//!                       │  repository.rs  (traits, Cas<T>)                 │
//!                       │    ├─ memory.rs  (MemoryStore)                   │
//!                       │    └─ db.rs      (SqliteStore via DbHandle)      │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Typical Request Flow (approve a submitted proposal)
//!
//! 1. `POST /api/proposals/{id}/actions/approve` → `api::proposal_action()`
//! 2. `ProposalService::apply_action()` loads the proposal and hides it
//!    unless `visibility::can_view_proposal` passes.
//! 3. `lifecycle::decide()` checks the actor's party and the transition
//!    table, yielding the next status or a conflict.
//! 4. The repository commits with `set_proposal_status(id, expected, next)`.
//!    If another request moved the proposal first, the fresh record comes
//!    back as `Cas::Stale` and the decision is re-run against it.

pub mod api;
pub mod courses;
pub mod db;
pub mod lifecycle;
pub mod materializer;
pub mod memory;
pub mod models;
pub mod repository;
pub mod server;
pub mod service;
pub mod validate;
pub mod visibility;
