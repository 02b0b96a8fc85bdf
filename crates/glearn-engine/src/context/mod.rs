//! Render context: binding table, deferred releases and warnings.

mod bindings;
mod config;
mod diagnostics;
mod release;
mod render_context;

pub use config::ContextConfig;
pub use diagnostics::Warning;
pub use release::GpuHandle;
pub use render_context::{GpuResource, RenderContext};
