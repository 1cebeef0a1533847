//! Agency Store - persistence capabilities
//!
//! The provisioning pipeline never issues raw queries. It talks to:
//! - [`ResourceStore`]: typed insert/select/delete per resource kind
//! - [`ClientDirectory`] / [`ProfileDirectory`]: read-only collaborators
//! - [`RoleResolver`]: privileged credential-to-role lookup
//!
//! In-memory backends are provided for tests and the development server.
//! They enforce the same foreign-key and uniqueness rules a relational
//! backend would between project rows, so compensation ordering bugs
//! surface as errors. Client and profile ids live in the directories and
//! are not checked by the store; the provisioning steps resolve them.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod directory;
pub mod error;
pub mod memory;
pub mod resource;

pub use directory::{ClientDirectory, InMemoryDirectory, ProfileDirectory, RoleResolver};
pub use error::StoreError;
pub use memory::{InMemoryStore, ResourceCounts};
pub use resource::ResourceStore;
