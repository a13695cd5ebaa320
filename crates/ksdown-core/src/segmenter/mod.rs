//! Range math and segment planning.
//!
//! Splits a remote file of known size into contiguous half-open byte ranges
//! and renders them as HTTP `Range` header values.

mod range;

pub use range::{partition, Segment};
