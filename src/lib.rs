//! # livebind
//!
//! Keep an element tree in step with push-updated resources.
//!
//! A transport delivers `load`, `change` and `error` notifications for a
//! collection or a model. livebind coalesces those notifications into change
//! batches, keeps an escaped snapshot of the resource, renders `{{ }}`
//! templates against it and projects the result onto matching elements.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: resource interface, change batches, the aggregator and an in-memory resource
//! - **[`sanitize`]**: markup escaping for values and records
//! - **[`expr`]**: sandboxed expression language and the formatter registry
//! - **[`template`]**: `{{ expression }}` rendering with fail-soft spans
//! - **[`projection`]**: `selector[:attribute]` declarations applied to a [`dom::Dom`]
//! - **[`dom`]** / **[`selector`]**: slotmap element arena and selector matching
//! - **[`binding`]**: template-then-project glue for render callbacks
//! - **[`connection`]**: read-only connection view and URL options
//! - **[`util`]**: debouncer and random identifiers
//! - **[`config`]**: shared defaults
//!
//! ```no_run
//! use std::sync::Arc;
//! use livebind::reactive::{attach, MemoryResource};
//!
//! # async fn demo() {
//! let posts = MemoryResource::collection();
//! let view = attach(Arc::clone(&posts), |update| {
//!     println!("{} records changed", update.changes.len());
//! });
//! posts.load(Vec::new());
//! # drop(view);
//! # }
//! ```

// Foundation
pub mod config;
pub mod sanitize;
pub mod value;

// Element tree
pub mod dom;
pub mod selector;

// Templates
pub mod expr;
pub mod template;

// Reactivity and projection
pub mod binding;
pub mod connection;
pub mod projection;
pub mod reactive;

pub mod util;

pub use binding::ViewBinding;
pub use config::BindConfig;
pub use template::{render_template, TemplateEngine};
pub use value::{Record, Value};
