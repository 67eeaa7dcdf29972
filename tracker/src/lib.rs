//! Real-time hand-gesture tracking core.
//!
//! Takes per-frame hand landmarks from an external pose estimator and
//! turns them into smoothed screen coordinates and debounced gesture
//! events, delivered to consumers through a latest-wins channel.

pub mod actions;
pub mod channel;
pub mod gesture;
pub mod pipeline;
pub mod sexp;
