//! Download descriptors, work orders and their results.
//!
//! - [`download`] - the [`Download`] struct and URL handling
//! - [`order`] - the [`Order`] unit of work and the [`UiEvent`]s workers emit
//! - [`summary`] - per-order [`Summary`] and [`TransferOutcome`]

pub mod download;
pub mod order;
pub mod summary;

pub use download::Download;
pub use order::{Order, UiEvent};
pub use summary::{Summary, TransferOutcome};
