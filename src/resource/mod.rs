//! Resource abstraction layer
//!
//! Data-driven plumbing shared by every management module: descriptors
//! for the provider collections, id-or-name resolution, and the
//! reconciliation state machine.
//!
//! # Architecture
//!
//! - [`registry`] - Collection descriptors loaded from embedded JSON
//! - [`locate`] - Resolve a target by id or unique name
//! - [`reconcile`] - Disposition state machine producing `ActionResult`

pub mod locate;
pub mod reconcile;
pub mod registry;

pub use locate::{extract_list, item_id, locate, locate_required, Located, ResourceRef};
pub use reconcile::{reconcile, ActionResult, Disposition, ResourceDriver};
pub use registry::{get_resource, resource, ResourceDef};
