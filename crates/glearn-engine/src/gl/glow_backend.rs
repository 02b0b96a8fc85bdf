use glow::HasContext;

use super::api::GlApi;
use super::types::{
    Attachment, BufferTarget, BufferUsage, ColorBuffer, ComponentType, CubeFace, DrawMode, Filter,
    FramebufferStatus, ImageDesc, ImageTarget, IndexType, InternalFormat, PixelFormat, RawHandle,
    ShaderStage, TexParam, TextureTarget, UniformLocation, UniformValue, VertexAttribute, Wrap,
};

/// Real driver backend built on a `glow` context.
///
/// Desktop GL 3.3 core only.
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Wraps a loaded context.
    ///
    /// # Safety
    ///
    /// The context must be current on the calling thread and stay current for as
    /// long as this backend (and the `RenderContext` owning it) is used.
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Returns the wrapped context for operations this layer does not abstract
    /// (clears, viewport, blits).
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

// ── enum mapping ──────────────────────────────────────────────────────────

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        BufferTarget::Uniform => glow::UNIFORM_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
    }
}

fn component_type(ty: ComponentType) -> u32 {
    match ty {
        ComponentType::Byte => glow::BYTE,
        ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
        ComponentType::Short => glow::SHORT,
        ComponentType::UnsignedShort => glow::UNSIGNED_SHORT,
        ComponentType::Int => glow::INT,
        ComponentType::UnsignedInt => glow::UNSIGNED_INT,
        ComponentType::HalfFloat => glow::HALF_FLOAT,
        ComponentType::Float => glow::FLOAT,
        ComponentType::UnsignedInt24_8 => glow::UNSIGNED_INT_24_8,
    }
}

fn draw_mode(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Points => glow::POINTS,
        DrawMode::Lines => glow::LINES,
        DrawMode::Triangles => glow::TRIANGLES,
        DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

fn index_type(ty: IndexType) -> u32 {
    match ty {
        IndexType::UnsignedShort => glow::UNSIGNED_SHORT,
        IndexType::UnsignedInt => glow::UNSIGNED_INT,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::Texture2DMultisample => glow::TEXTURE_2D_MULTISAMPLE,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

fn image_target(target: ImageTarget) -> u32 {
    match target {
        ImageTarget::Texture2D => glow::TEXTURE_2D,
        ImageTarget::CubeFace(face) => match face {
            CubeFace::PositiveX => glow::TEXTURE_CUBE_MAP_POSITIVE_X,
            CubeFace::NegativeX => glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
            CubeFace::PositiveY => glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
            CubeFace::NegativeY => glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
            CubeFace::PositiveZ => glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
            CubeFace::NegativeZ => glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
        },
    }
}

fn internal_format(format: InternalFormat) -> u32 {
    match format {
        InternalFormat::Red => glow::RED,
        InternalFormat::R8 => glow::R8,
        InternalFormat::R16F => glow::R16F,
        InternalFormat::R32F => glow::R32F,
        InternalFormat::Rg16F => glow::RG16F,
        InternalFormat::Rgb => glow::RGB,
        InternalFormat::Rgb8 => glow::RGB8,
        InternalFormat::Rgb16F => glow::RGB16F,
        InternalFormat::Rgb32F => glow::RGB32F,
        InternalFormat::Srgb => glow::SRGB,
        InternalFormat::Rgba => glow::RGBA,
        InternalFormat::Rgba8 => glow::RGBA8,
        InternalFormat::Rgba16F => glow::RGBA16F,
        InternalFormat::Rgba32F => glow::RGBA32F,
        InternalFormat::SrgbAlpha => glow::SRGB_ALPHA,
        InternalFormat::DepthComponent => glow::DEPTH_COMPONENT,
        InternalFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
    }
}

fn pixel_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Red => glow::RED,
        PixelFormat::Rg => glow::RG,
        PixelFormat::Rgb => glow::RGB,
        PixelFormat::Rgba => glow::RGBA,
        PixelFormat::DepthComponent => glow::DEPTH_COMPONENT,
        PixelFormat::DepthStencil => glow::DEPTH_STENCIL,
    }
}

fn filter(filter: Filter) -> i32 {
    let value = match filter {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear => glow::LINEAR,
        Filter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        Filter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        Filter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        Filter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    };
    value as i32
}

fn wrap(wrap: Wrap) -> i32 {
    let value = match wrap {
        Wrap::Repeat => glow::REPEAT,
        Wrap::MirroredRepeat => glow::MIRRORED_REPEAT,
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        Wrap::ClampToBorder => glow::CLAMP_TO_BORDER,
    };
    value as i32
}

fn attachment(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color(i) => glow::COLOR_ATTACHMENT0 + i,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
        Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
    }
}

fn color_buffer(buffer: ColorBuffer) -> u32 {
    match buffer {
        ColorBuffer::None => glow::NONE,
        ColorBuffer::Color(i) => glow::COLOR_ATTACHMENT0 + i,
    }
}

fn shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

// ── handle mapping ────────────────────────────────────────────────────────

fn buffer(handle: RawHandle) -> glow::NativeBuffer {
    glow::NativeBuffer(handle.get())
}

fn vertex_array(handle: RawHandle) -> glow::NativeVertexArray {
    glow::NativeVertexArray(handle.get())
}

fn texture(handle: RawHandle) -> glow::NativeTexture {
    glow::NativeTexture(handle.get())
}

fn framebuffer(handle: RawHandle) -> glow::NativeFramebuffer {
    glow::NativeFramebuffer(handle.get())
}

fn renderbuffer(handle: RawHandle) -> glow::NativeRenderbuffer {
    glow::NativeRenderbuffer(handle.get())
}

fn shader(handle: RawHandle) -> glow::NativeShader {
    glow::NativeShader(handle.get())
}

fn program(handle: RawHandle) -> glow::NativeProgram {
    glow::NativeProgram(handle.get())
}

// ── GlApi ─────────────────────────────────────────────────────────────────

// SAFETY (all blocks below): `GlowBackend::new` requires the context to be
// current on this thread; every handle passed in was produced by this context.
impl GlApi for GlowBackend {
    fn create_buffer(&mut self) -> Result<RawHandle, String> {
        unsafe { self.gl.create_buffer() }.map(|b| RawHandle::new(b.0))
    }

    fn delete_buffer(&mut self, handle: RawHandle) {
        unsafe { self.gl.delete_buffer(buffer(handle)) }
    }

    fn bind_buffer(&mut self, target: BufferTarget, handle: Option<RawHandle>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), handle.map(buffer)) }
    }

    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        unsafe {
            match data {
                Some(bytes) => {
                    self.gl
                        .buffer_data_u8_slice(buffer_target(target), bytes, buffer_usage(usage))
                }
                None => self
                    .gl
                    .buffer_data_size(buffer_target(target), size as i32, buffer_usage(usage)),
            }
        }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(buffer_target(target), offset as i32, data)
        }
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, handle: RawHandle) {
        unsafe {
            self.gl
                .bind_buffer_base(buffer_target(target), index, Some(buffer(handle)))
        }
    }

    fn bind_buffer_range(&mut self, target: BufferTarget, index: u32, handle: RawHandle, offset: usize, size: usize) {
        unsafe {
            self.gl.bind_buffer_range(
                buffer_target(target),
                index,
                Some(buffer(handle)),
                offset as i32,
                size as i32,
            )
        }
    }

    fn create_vertex_array(&mut self) -> Result<RawHandle, String> {
        unsafe { self.gl.create_vertex_array() }.map(|v| RawHandle::new(v.0))
    }

    fn delete_vertex_array(&mut self, handle: RawHandle) {
        unsafe { self.gl.delete_vertex_array(vertex_array(handle)) }
    }

    fn bind_vertex_array(&mut self, handle: Option<RawHandle>) {
        unsafe { self.gl.bind_vertex_array(handle.map(vertex_array)) }
    }

    fn vertex_attrib_pointer(&mut self, attribute: &VertexAttribute) {
        let data_type = component_type(attribute.component_type);
        let size = attribute.components as i32;
        let (stride, offset) = (attribute.stride as i32, attribute.offset as i32);
        unsafe {
            if attribute.is_integer() {
                self.gl.vertex_attrib_pointer_i32(attribute.slot, size, data_type, stride, offset)
            } else {
                self.gl.vertex_attrib_pointer_f32(
                    attribute.slot,
                    size,
                    data_type,
                    attribute.normalized,
                    stride,
                    offset,
                )
            }
        }
    }

    fn enable_vertex_attrib_array(&mut self, slot: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(slot) }
    }

    fn vertex_attrib_divisor(&mut self, slot: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(slot, divisor) }
    }

    fn max_vertex_attribs(&self) -> u32 {
        let value = unsafe { self.gl.get_parameter_i32(glow::MAX_VERTEX_ATTRIBS) };
        value.max(0) as u32
    }

    fn create_texture(&mut self) -> Result<RawHandle, String> {
        unsafe { self.gl.create_texture() }.map(|t| RawHandle::new(t.0))
    }

    fn delete_texture(&mut self, handle: RawHandle) {
        unsafe { self.gl.delete_texture(texture(handle)) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, target: TextureTarget, handle: Option<RawHandle>) {
        unsafe { self.gl.bind_texture(texture_target(target), handle.map(texture)) }
    }

    fn tex_image_2d(&mut self, target: ImageTarget, desc: &ImageDesc, data: Option<&[u8]>) {
        unsafe {
            self.gl.tex_image_2d(
                image_target(target),
                0,
                internal_format(desc.internal_format) as i32,
                desc.width as i32,
                desc.height as i32,
                0,
                pixel_format(desc.format),
                component_type(desc.component_type),
                glow::PixelUnpackData::Slice(data),
            )
        }
    }

    fn tex_image_2d_multisample(&mut self, samples: u32, format: InternalFormat, width: u32, height: u32) {
        unsafe {
            self.gl.tex_image_2d_multisample(
                glow::TEXTURE_2D_MULTISAMPLE,
                samples as i32,
                internal_format(format) as i32,
                width as i32,
                height as i32,
                true,
            )
        }
    }

    fn tex_parameter(&mut self, target: TextureTarget, param: TexParam) {
        let target = texture_target(target);
        unsafe {
            match param {
                TexParam::MinFilter(f) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter(f))
                }
                TexParam::MagFilter(f) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter(f))
                }
                TexParam::WrapS(w) => self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap(w)),
                TexParam::WrapT(w) => self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap(w)),
                TexParam::WrapR(w) => self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, wrap(w)),
                TexParam::BorderColor(color) => {
                    self.gl
                        .tex_parameter_f32_slice(target, glow::TEXTURE_BORDER_COLOR, &color)
                }
            }
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        unsafe { self.gl.generate_mipmap(texture_target(target)) }
    }

    fn set_unpack_alignment(&mut self, alignment: u32) {
        unsafe { self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment as i32) }
    }

    fn create_framebuffer(&mut self) -> Result<RawHandle, String> {
        unsafe { self.gl.create_framebuffer() }.map(|f| RawHandle::new(f.0))
    }

    fn delete_framebuffer(&mut self, handle: RawHandle) {
        unsafe { self.gl.delete_framebuffer(framebuffer(handle)) }
    }

    fn bind_framebuffer(&mut self, handle: Option<RawHandle>) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, handle.map(framebuffer)) }
    }

    fn framebuffer_texture_2d(&mut self, slot: Attachment, target: TextureTarget, handle: RawHandle) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment(slot),
                texture_target(target),
                Some(texture(handle)),
                0,
            )
        }
    }

    fn framebuffer_texture(&mut self, slot: Attachment, handle: RawHandle) {
        unsafe {
            self.gl
                .framebuffer_texture(glow::FRAMEBUFFER, attachment(slot), Some(texture(handle)), 0)
        }
    }

    fn create_renderbuffer(&mut self) -> Result<RawHandle, String> {
        unsafe { self.gl.create_renderbuffer() }.map(|r| RawHandle::new(r.0))
    }

    fn delete_renderbuffer(&mut self, handle: RawHandle) {
        unsafe { self.gl.delete_renderbuffer(renderbuffer(handle)) }
    }

    fn bind_renderbuffer(&mut self, handle: Option<RawHandle>) {
        unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, handle.map(renderbuffer)) }
    }

    fn renderbuffer_storage(&mut self, samples: u32, format: InternalFormat, width: u32, height: u32) {
        unsafe {
            if samples > 1 {
                self.gl.renderbuffer_storage_multisample(
                    glow::RENDERBUFFER,
                    samples as i32,
                    internal_format(format),
                    width as i32,
                    height as i32,
                )
            } else {
                self.gl.renderbuffer_storage(
                    glow::RENDERBUFFER,
                    internal_format(format),
                    width as i32,
                    height as i32,
                )
            }
        }
    }

    fn framebuffer_renderbuffer(&mut self, slot: Attachment, handle: RawHandle) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment(slot),
                glow::RENDERBUFFER,
                Some(renderbuffer(handle)),
            )
        }
    }

    fn draw_buffers(&mut self, buffers: &[ColorBuffer]) {
        let raw: Vec<u32> = buffers.iter().copied().map(color_buffer).collect();
        unsafe { self.gl.draw_buffers(&raw) }
    }

    fn read_buffer(&mut self, buffer: ColorBuffer) {
        unsafe { self.gl.read_buffer(color_buffer(buffer)) }
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        let status = unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) };
        if status == glow::FRAMEBUFFER_COMPLETE {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::Incomplete(status)
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<RawHandle, String> {
        unsafe { self.gl.create_shader(shader_stage(stage)) }.map(|s| RawHandle::new(s.0))
    }

    fn compile_shader(&mut self, handle: RawHandle, source: &str) -> Result<(), String> {
        let native = shader(handle);
        unsafe {
            self.gl.shader_source(native, source);
            self.gl.compile_shader(native);
            if self.gl.get_shader_compile_status(native) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(native))
            }
        }
    }

    fn delete_shader(&mut self, handle: RawHandle) {
        unsafe { self.gl.delete_shader(shader(handle)) }
    }

    fn create_program(&mut self) -> Result<RawHandle, String> {
        unsafe { self.gl.create_program() }.map(|p| RawHandle::new(p.0))
    }

    fn attach_shader(&mut self, prog: RawHandle, stage: RawHandle) {
        unsafe { self.gl.attach_shader(program(prog), shader(stage)) }
    }

    fn detach_shader(&mut self, prog: RawHandle, stage: RawHandle) {
        unsafe { self.gl.detach_shader(program(prog), shader(stage)) }
    }

    fn link_program(&mut self, handle: RawHandle) -> Result<(), String> {
        let native = program(handle);
        unsafe {
            self.gl.link_program(native);
            if self.gl.get_program_link_status(native) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(native))
            }
        }
    }

    fn delete_program(&mut self, handle: RawHandle) {
        unsafe { self.gl.delete_program(program(handle)) }
    }

    fn use_program(&mut self, handle: Option<RawHandle>) {
        unsafe { self.gl.use_program(handle.map(program)) }
    }

    fn uniform_location(&self, handle: RawHandle, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(program(handle), name) }.map(|l| UniformLocation(l.0))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let loc = glow::NativeUniformLocation(location.0);
        let loc = Some(&loc);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(loc, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, v),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(loc, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(loc, x, y, z, w),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(loc, false, &m),
            }
        }
    }

    fn uniform_block_index(&self, handle: RawHandle, name: &str) -> Option<u32> {
        unsafe { self.gl.get_uniform_block_index(program(handle), name) }
    }

    fn uniform_block_binding(&mut self, handle: RawHandle, block_index: u32, binding: u32) {
        unsafe { self.gl.uniform_block_binding(program(handle), block_index, binding) }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(draw_mode(mode), first as i32, count as i32) }
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32, ty: IndexType, offset: usize) {
        unsafe {
            self.gl
                .draw_elements(draw_mode(mode), count as i32, index_type(ty), offset as i32)
        }
    }

    fn enable_alpha_blending(&mut self) -> bool {
        unsafe {
            let was_enabled = self.gl.is_enabled(glow::BLEND);
            self.gl.enable(glow::BLEND);
            self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            was_enabled
        }
    }

    fn disable_blending(&mut self) {
        unsafe { self.gl.disable(glow::BLEND) }
    }
}
