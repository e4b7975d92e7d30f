//! Passes over the built field tree: layout, dependee resolution and
//! FILLER normalization. Each pass consumes the tree and returns a new one.

mod dependee;
mod filler;
mod layout;

pub use dependee::{mark_dependees, DUPLICATE_DEPENDEE};
pub use filler::normalize_fillers;
pub use layout::{calculate_layout, calculate_offsets, calculate_sizes};
