//! Live preview: turning a stream of quality changes into a stream of
//! previews that never goes backwards.
//!
//! - [`state`]: sequence bookkeeping and the acceptance rule, no threads
//! - [`controller`]: the worker pool, completion channel and session

pub mod controller;
pub mod state;

pub use controller::{PreviewController, PreviewEvent};
pub use state::{PreviewState, PreviewStatus, Verdict};
