//! Draft scheduling: availability windows, deadline allocation, snake order.

pub mod deadlines;
pub mod order;
pub mod windows;

pub use deadlines::{allocate, snap};
pub use order::{linear_index, slot_at};
pub use windows::{window_sequence, AvailabilityWindow};
