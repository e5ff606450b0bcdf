//! GPU buffer management

pub mod grass_buffers;

pub use grass_buffers::{GrassBuffers, IndirectArgs};
