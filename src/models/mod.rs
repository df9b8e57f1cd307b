//! Model implementations backed by Candle.

pub mod classification;

pub use classification::*;
