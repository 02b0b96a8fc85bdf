//! Native call seam.
//!
//! `GlApi` is the only surface through which the resource layer talks to the
//! driver. `GlowBackend` forwards to a live OpenGL 3.3 core context; `MockGl`
//! records calls and simulates enough driver state for headless tests. The
//! mock is compiled for this crate's tests and behind the `mock` feature.

mod api;
mod glow_backend;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod types;

pub use api::GlApi;
pub use glow_backend::GlowBackend;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGl;
pub use types::{
    Attachment, BufferTarget, BufferUsage, ColorBuffer, ComponentType, CubeFace, DrawMode, Filter,
    FramebufferStatus, ImageDesc, ImageTarget, IndexType, InternalFormat, PixelFormat, RawHandle,
    ResourceKind, ShaderStage, TexParam, TextureTarget, UniformLocation, UniformValue,
    VertexAttribute, Wrap,
};
