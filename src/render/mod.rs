//! GPU runtime path: context, buffers, pipelines, and the per-frame
//! indirect-draw orchestrator.

pub mod context;
pub mod frame;
pub mod buffer;
pub mod pipeline;
pub mod renderer;

pub use context::GpuContext;
pub use frame::{FrameContext, TrampleState, MAX_TRAMPLE_POSITIONS};
pub use renderer::GrassRenderer;
