//! # treadmill-sync
//!
//! The two treadmill workflows and the build gate they share.
//!
//! - [`SyncOrchestrator`] re-vendors the upstream mainline onto the treadmill
//!   branch, rebased on the downstream mainline.
//! - [`PickOrchestrator`] lands the treadmill PR's payload commit on top of a
//!   real vendor commit.
//! - [`pipeline::run`] is the single entry point used by the CLI.

pub mod error;
pub mod message;
pub mod pick;
pub mod pipeline;
pub mod sync;
pub mod verify;

pub use error::WorkflowError;
pub use pick::PickOrchestrator;
pub use pipeline::Action;
pub use sync::SyncOrchestrator;
pub use verify::BuildVerifier;
