//! Reactive aggregation over push-updated resources.
//!
//! - [`Resource`]: the interface a transport-backed collection or model exposes.
//! - [`ChangeBatch`]: per-key change flags with local-write precedence.
//! - [`attach`] / [`attach_with`] / [`track`]: bind a resource, keep its
//!   sanitized snapshot current and deliver batches to a render callback.
//! - [`MemoryResource`]: an in-process resource.

pub mod aggregator;
pub mod batch;
pub mod memory;
pub mod resource;

pub use aggregator::{attach, attach_with, track, Reactive, RenderUpdate, SnapshotReceiver};
pub use batch::ChangeBatch;
pub use memory::{MemoryResource, Origin};
pub use resource::{
    ChangeEvent, Resource, ResourceError, ResourceEvent, ResourceKind, ResourceValue,
    SafeSnapshot,
};
