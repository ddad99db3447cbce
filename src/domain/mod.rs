//! Domain invariants and mutation commands.
//!
//! Mutations are implemented as methods on [`crate::store::Store`], split by
//! record type. Every mutation is a read-modify-write of whole collections.

pub mod clients;
pub mod engagements;
pub mod ids;
pub mod interactions;
pub mod normalize;
pub mod users;

pub use clients::{RenameOutcome, vivify_client};
pub use engagements::{NewEngagement, NewTask};
pub use interactions::NewInteraction;
pub use normalize::{normalize_client, normalize_engagement, normalize_interaction, normalize_user};
