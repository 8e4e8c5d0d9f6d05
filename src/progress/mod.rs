//! Progress accounting and the status line.
//!
//! - `counter` - the shared [`ByteCounter`] every worker adds to
//! - `style` - status line styling options
//! - `display` - rendering of the coordinator's events
//!
//! ```rust
//! use slurp::progress::ByteCounter;
//!
//! let counter = ByteCounter::new();
//! let worker_handle = counter.clone();
//! worker_handle.add(4096);
//! assert_eq!(counter.snapshot(), 4096);
//! ```

pub(crate) mod counter;
pub(crate) mod display;
pub(crate) mod style;

pub use counter::ByteCounter;
pub use display::{rate, status_line, ProgressDisplay};
pub use style::ProgressBarOpts;
