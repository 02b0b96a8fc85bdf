//! GPU resource layer for the glearn OpenGL sandbox.
//!
//! Owning wrappers for buffers, vertex arrays, textures, framebuffers and
//! shader programs, built on a `RenderContext` that tracks every binding point
//! explicitly and defers native releases until `maintain()`.
//!
//! The driver sits behind [`gl::GlApi`]: [`gl::GlowBackend`] for a live OpenGL
//! 3.3 core context, `gl::MockGl` (feature `mock`) for headless tests.

pub mod context;
pub mod error;
pub mod gl;
pub mod logging;
pub mod resource;
pub mod time;

pub use context::{ContextConfig, GpuResource, RenderContext, Warning};
pub use error::{ResourceError, ResourceResult};
