//! CPU/GPU synchronization.

pub mod fence;

pub use fence::{Fence, FenceCompleter, FenceValue, Timeline};
