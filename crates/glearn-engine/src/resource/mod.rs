//! Owning wrappers around native GPU objects.
//!
//! Every wrapper is created through a `RenderContext`, binds only through it,
//! and schedules its own release when dropped.

mod buffer;
mod cube_map;
mod decoded;
mod depth_map;
mod framebuffer;
mod shader;
mod texture;
mod vertex_array;

pub use buffer::{
    ArrayTarget, Buffer, BufferKind, ElementBuffer, ElementTarget, UniformBuffer, UniformTarget,
    VertexBuffer,
};
pub use cube_map::CubeMap;
pub use decoded::DecodedImage;
pub use depth_map::{DEPTH_BORDER_COLOR, DepthMap, DepthMapKind};
pub use framebuffer::{
    ColorAttachmentSpec, ColorStorage, DepthStencilAttachment, DepthStencilKind, FormatCategory,
    Framebuffer, FramebufferDesc, Renderbuffer,
};
pub use shader::{ShaderFiles, ShaderProgram};
pub use texture::{RawTextureDesc, Sampling, Texture};
pub use vertex_array::VertexArray;
