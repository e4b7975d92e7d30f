//! Tree building and PIC decoding.

mod builder;
mod picture;

pub use builder::build_trees;
pub use picture::{comp_variant, decimal_length, decode_picture, is_elementary};
