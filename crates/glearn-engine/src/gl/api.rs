use super::types::{
    Attachment, BufferTarget, BufferUsage, ColorBuffer, DrawMode, FramebufferStatus, ImageDesc,
    ImageTarget, IndexType, InternalFormat, RawHandle, ShaderStage, TexParam, TextureTarget,
    UniformLocation, UniformValue, VertexAttribute,
};

/// The native call surface used by the resource layer.
///
/// Calls that "act on the bound X" behave exactly like their GL counterparts:
/// they target whatever object the backend currently has bound, not an object
/// passed by the caller. `RenderContext` is the only caller and keeps its own
/// binding table in lockstep with these calls.
///
/// Creation calls return `Err(reason)` when the driver refuses to allocate.
pub trait GlApi {
    // ── buffers ───────────────────────────────────────────────────────────
    fn create_buffer(&mut self) -> Result<RawHandle, String>;
    fn delete_buffer(&mut self, buffer: RawHandle);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<RawHandle>);
    /// (Re)allocates storage of the buffer bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage);
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]);
    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: RawHandle);
    fn bind_buffer_range(&mut self, target: BufferTarget, index: u32, buffer: RawHandle, offset: usize, size: usize);

    // ── vertex arrays ─────────────────────────────────────────────────────
    fn create_vertex_array(&mut self) -> Result<RawHandle, String>;
    fn delete_vertex_array(&mut self, vertex_array: RawHandle);
    fn bind_vertex_array(&mut self, vertex_array: Option<RawHandle>);
    /// Records `attribute` against the bound array buffer in the bound vertex array.
    /// Attributes where [`VertexAttribute::is_integer`] holds reach the shader as
    /// integers; everything else is converted to float.
    fn vertex_attrib_pointer(&mut self, attribute: &VertexAttribute);
    fn enable_vertex_attrib_array(&mut self, slot: u32);
    fn vertex_attrib_divisor(&mut self, slot: u32, divisor: u32);
    fn max_vertex_attribs(&self) -> u32;

    // ── textures ──────────────────────────────────────────────────────────
    fn create_texture(&mut self) -> Result<RawHandle, String>;
    fn delete_texture(&mut self, texture: RawHandle);
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<RawHandle>);
    fn tex_image_2d(&mut self, target: ImageTarget, desc: &ImageDesc, data: Option<&[u8]>);
    fn tex_image_2d_multisample(&mut self, samples: u32, internal_format: InternalFormat, width: u32, height: u32);
    fn tex_parameter(&mut self, target: TextureTarget, param: TexParam);
    fn generate_mipmap(&mut self, target: TextureTarget);
    fn set_unpack_alignment(&mut self, alignment: u32);

    // ── framebuffers ──────────────────────────────────────────────────────
    fn create_framebuffer(&mut self) -> Result<RawHandle, String>;
    fn delete_framebuffer(&mut self, framebuffer: RawHandle);
    fn bind_framebuffer(&mut self, framebuffer: Option<RawHandle>);
    fn framebuffer_texture_2d(&mut self, attachment: Attachment, target: TextureTarget, texture: RawHandle);
    /// Attaches every layer of `texture` (used for cube depth maps).
    fn framebuffer_texture(&mut self, attachment: Attachment, texture: RawHandle);
    fn create_renderbuffer(&mut self) -> Result<RawHandle, String>;
    fn delete_renderbuffer(&mut self, renderbuffer: RawHandle);
    fn bind_renderbuffer(&mut self, renderbuffer: Option<RawHandle>);
    /// `samples <= 1` allocates single-sample storage.
    fn renderbuffer_storage(&mut self, samples: u32, internal_format: InternalFormat, width: u32, height: u32);
    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RawHandle);
    fn draw_buffers(&mut self, buffers: &[ColorBuffer]);
    fn read_buffer(&mut self, buffer: ColorBuffer);
    fn check_framebuffer_status(&self) -> FramebufferStatus;

    // ── programs ──────────────────────────────────────────────────────────
    fn create_shader(&mut self, stage: ShaderStage) -> Result<RawHandle, String>;
    /// Uploads the source and compiles; `Err` carries the info log.
    fn compile_shader(&mut self, shader: RawHandle, source: &str) -> Result<(), String>;
    fn delete_shader(&mut self, shader: RawHandle);
    fn create_program(&mut self) -> Result<RawHandle, String>;
    fn attach_shader(&mut self, program: RawHandle, shader: RawHandle);
    fn detach_shader(&mut self, program: RawHandle, shader: RawHandle);
    /// Links; `Err` carries the info log.
    fn link_program(&mut self, program: RawHandle) -> Result<(), String>;
    fn delete_program(&mut self, program: RawHandle);
    fn use_program(&mut self, program: Option<RawHandle>);
    fn uniform_location(&self, program: RawHandle, name: &str) -> Option<UniformLocation>;
    /// Writes a uniform of the current program.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);
    fn uniform_block_index(&self, program: RawHandle, name: &str) -> Option<u32>;
    fn uniform_block_binding(&mut self, program: RawHandle, block_index: u32, binding: u32);

    // ── draw state ────────────────────────────────────────────────────────
    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);
    fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: IndexType, offset: usize);
    /// Enables src-alpha / one-minus-src-alpha blending; returns whether blending was already on.
    fn enable_alpha_blending(&mut self) -> bool;
    fn disable_blending(&mut self);
}
