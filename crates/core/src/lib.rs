//! Pure domain logic for the resonance telemetry feed.
//!
//! Everything in this crate is free of I/O: payload decoding, sample
//! ordering, gauge classification, heatmap rasterisation and pixel
//! coordinate mapping. The `resonance-feed` crate supplies the network
//! and caching side.

pub mod coords;
pub mod error;
pub mod gauge;
pub mod heatmap;
pub mod lenient;
pub mod palette;
pub mod payload;
pub mod raster;
pub mod sample;
pub mod trend;
pub mod types;
