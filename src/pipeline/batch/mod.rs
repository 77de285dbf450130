//! Batch dispatch over the records of one invocation.
//!
//! Items are independent: each one runs through
//! ```text
//! Extraction → Analysis → Persistence (or StatusTracker on failure)
//! ```
//! and the per-item outcomes reduce to a single outcome code by precedence.

pub mod error;
pub mod types;
pub mod event;
pub mod dispatcher;

pub use error::{DispatchError, ProcessingError};
pub use types::*;
pub use event::InvocationEvent;
pub use dispatcher::BatchDispatcher;
