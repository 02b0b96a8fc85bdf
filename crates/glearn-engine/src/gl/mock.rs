//! Headless recording backend.
//!
//! `MockGl` behaves like a minimal driver: it hands out ids, keeps its own
//! binding state, stores buffer bytes, remembers texture parameters and
//! framebuffer attachments, and logs every call. Tests drive resources through
//! a `RenderContext<MockGl>` and inspect the result via `ctx.gl()`.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use super::api::GlApi;
use super::types::{
    Attachment, BufferTarget, BufferUsage, ColorBuffer, DrawMode, FramebufferStatus, ImageDesc,
    ImageTarget, IndexType, InternalFormat, RawHandle, ResourceKind, ShaderStage, TexParam,
    TextureTarget, UniformLocation, UniformValue, VertexAttribute,
};

/// Status code reported for an attachment that has no storage or was deleted.
pub const INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
/// Status code reported for a framebuffer without any attachment.
pub const INCOMPLETE_MISSING_ATTACHMENT: u32 = 0x8CD7;
/// Status code reported when attachments disagree on sample count.
pub const INCOMPLETE_MULTISAMPLE: u32 = 0x8D56;

/// Source text containing this marker fails to compile.
pub const COMPILE_ERROR_MARKER: &str = "#error";

/// One recorded native call, annotated with the object it implicitly targeted.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(RawHandle),
    DeleteBuffer(RawHandle),
    BindBuffer(BufferTarget, Option<RawHandle>),
    BufferData { buffer: Option<RawHandle>, size: usize, with_data: bool, usage: BufferUsage },
    BufferSubData { buffer: Option<RawHandle>, offset: usize, len: usize },
    BindBufferBase { index: u32, buffer: RawHandle },
    BindBufferRange { index: u32, buffer: RawHandle, offset: usize, size: usize },

    CreateVertexArray(RawHandle),
    DeleteVertexArray(RawHandle),
    BindVertexArray(Option<RawHandle>),
    VertexAttribPointer { vertex_array: Option<RawHandle>, buffer: Option<RawHandle>, attribute: VertexAttribute },
    EnableVertexAttribArray(u32),
    VertexAttribDivisor { slot: u32, divisor: u32 },

    CreateTexture(RawHandle),
    DeleteTexture(RawHandle),
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<RawHandle>),
    TexImage2D { texture: Option<RawHandle>, target: ImageTarget, desc: ImageDesc, with_data: bool },
    TexImage2DMultisample { texture: Option<RawHandle>, samples: u32, internal_format: InternalFormat },
    TexParameter { texture: Option<RawHandle>, param: TexParam },
    GenerateMipmap(Option<RawHandle>),
    UnpackAlignment(u32),

    CreateFramebuffer(RawHandle),
    DeleteFramebuffer(RawHandle),
    BindFramebuffer(Option<RawHandle>),
    FramebufferTexture2D { framebuffer: Option<RawHandle>, attachment: Attachment, texture: RawHandle },
    FramebufferTexture { framebuffer: Option<RawHandle>, attachment: Attachment, texture: RawHandle },
    CreateRenderbuffer(RawHandle),
    DeleteRenderbuffer(RawHandle),
    BindRenderbuffer(Option<RawHandle>),
    RenderbufferStorage { renderbuffer: Option<RawHandle>, samples: u32, internal_format: InternalFormat },
    FramebufferRenderbuffer { framebuffer: Option<RawHandle>, attachment: Attachment, renderbuffer: RawHandle },
    DrawBuffers(Vec<ColorBuffer>),
    ReadBuffer(ColorBuffer),

    CreateShader(ShaderStage, RawHandle),
    CompileShader(RawHandle),
    DeleteShader(RawHandle),
    CreateProgram(RawHandle),
    AttachShader { program: RawHandle, shader: RawHandle },
    DetachShader { program: RawHandle, shader: RawHandle },
    LinkProgram(RawHandle),
    DeleteProgram(RawHandle),
    UseProgram(Option<RawHandle>),
    SetUniform { program: Option<RawHandle>, location: UniformLocation, value: UniformValue },
    UniformBlockBinding { program: RawHandle, block_index: u32, binding: u32 },

    DrawArrays { mode: DrawMode, first: u32, count: u32 },
    DrawElements { mode: DrawMode, count: u32, index_type: IndexType },
    EnableAlphaBlending,
    DisableBlending,
}

/// Recorded vertex-attribute state of one vertex array slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    pub attribute: VertexAttribute,
    /// Array buffer that was bound when the pointer was recorded.
    pub buffer: Option<RawHandle>,
    pub enabled: bool,
    pub divisor: u32,
}

/// Storage and sampler state of one texture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureRecord {
    pub target: Option<TextureTarget>,
    pub images: Vec<(ImageTarget, ImageDesc, bool)>,
    /// Non-zero for multisampled storage.
    pub samples: u32,
    pub params: Vec<TexParam>,
    pub mipmapped: bool,
}

impl TextureRecord {
    /// Last border color applied, if any.
    pub fn border_color(&self) -> Option<[f32; 4]> {
        self.params.iter().rev().find_map(|p| match p {
            TexParam::BorderColor(c) => Some(*c),
            _ => None,
        })
    }

    pub fn has_param(&self, param: TexParam) -> bool {
        self.params.contains(&param)
    }

    fn has_storage(&self) -> bool {
        !self.images.is_empty() || self.samples > 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttachedObject {
    Texture(RawHandle),
    Renderbuffer(RawHandle),
}

#[derive(Debug, Clone, Default)]
struct FramebufferRecord {
    attachments: BTreeMap<AttachmentKey, AttachedObject>,
}

// `Attachment` is not `Ord`; keep attachments sorted color-first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AttachmentKey(u32);

impl AttachmentKey {
    fn of(attachment: Attachment) -> Self {
        match attachment {
            Attachment::Color(i) => Self(i),
            Attachment::Depth => Self(u32::MAX - 1),
            Attachment::DepthStencil => Self(u32::MAX),
        }
    }
}

/// Recording backend used by the test suites.
#[derive(Debug)]
pub struct MockGl {
    next_id: u32,
    calls: Vec<Call>,

    live: HashMap<RawHandle, ResourceKind>,
    created: Vec<(ResourceKind, RawHandle)>,
    released: Vec<(ResourceKind, RawHandle)>,
    invalid_releases: Vec<(ResourceKind, RawHandle)>,

    // driver-side binding state
    buffers: HashMap<BufferTarget, RawHandle>,
    // element array binding is vertex array state, keyed by the bound array
    element_buffers: HashMap<Option<RawHandle>, RawHandle>,
    vertex_array: Option<RawHandle>,
    framebuffer: Option<RawHandle>,
    renderbuffer: Option<RawHandle>,
    program: Option<RawHandle>,
    active_unit: u32,
    units: HashMap<(u32, TextureTarget), RawHandle>,
    blending: bool,

    // object state
    buffer_storage: HashMap<RawHandle, Vec<u8>>,
    attributes: HashMap<RawHandle, BTreeMap<u32, AttributeRecord>>,
    textures: HashMap<RawHandle, TextureRecord>,
    renderbuffer_samples: HashMap<RawHandle, u32>,
    framebuffers: HashMap<RawHandle, FramebufferRecord>,
    shader_stages: HashMap<RawHandle, ShaderStage>,

    // knobs
    max_vertex_attribs: u32,
    uniforms: Vec<String>,
    uniform_blocks: Vec<String>,
    fail_after: Option<usize>,
    fail_link: bool,
    force_incomplete: bool,
}

impl Default for MockGl {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGl {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            calls: Vec::new(),
            live: HashMap::new(),
            created: Vec::new(),
            released: Vec::new(),
            invalid_releases: Vec::new(),
            buffers: HashMap::new(),
            element_buffers: HashMap::new(),
            vertex_array: None,
            framebuffer: None,
            renderbuffer: None,
            program: None,
            active_unit: 0,
            units: HashMap::new(),
            blending: false,
            buffer_storage: HashMap::new(),
            attributes: HashMap::new(),
            textures: HashMap::new(),
            renderbuffer_samples: HashMap::new(),
            framebuffers: HashMap::new(),
            shader_stages: HashMap::new(),
            max_vertex_attribs: 16,
            uniforms: Vec::new(),
            uniform_blocks: Vec::new(),
            fail_after: None,
            fail_link: false,
            force_incomplete: false,
        }
    }

    // ── knobs ─────────────────────────────────────────────────────────────

    pub fn set_max_vertex_attribs(&mut self, slots: u32) {
        self.max_vertex_attribs = slots;
    }

    /// Makes `name` resolvable as a uniform in every program.
    pub fn declare_uniform(&mut self, name: &str) {
        if !self.uniforms.iter().any(|u| u == name) {
            self.uniforms.push(name.to_string());
        }
    }

    /// Makes `name` resolvable as a uniform block in every program.
    pub fn declare_uniform_block(&mut self, name: &str) {
        if !self.uniform_blocks.iter().any(|u| u == name) {
            self.uniform_blocks.push(name.to_string());
        }
    }

    /// After `successes` more object creations, the next one fails (once).
    pub fn fail_allocation_after(&mut self, successes: usize) {
        self.fail_after = Some(successes);
    }

    pub fn fail_link(&mut self, fail: bool) {
        self.fail_link = fail;
    }

    /// Every framebuffer reports `INCOMPLETE_ATTACHMENT`.
    pub fn force_incomplete(&mut self, incomplete: bool) {
        self.force_incomplete = incomplete;
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn created(&self) -> &[(ResourceKind, RawHandle)] {
        &self.created
    }

    pub fn released(&self) -> &[(ResourceKind, RawHandle)] {
        &self.released
    }

    /// Deletes issued for handles that were not live (double frees, foreign ids).
    pub fn invalid_releases(&self) -> &[(ResourceKind, RawHandle)] {
        &self.invalid_releases
    }

    pub fn release_count(&self, handle: RawHandle) -> usize {
        self.released.iter().filter(|(_, h)| *h == handle).count()
    }

    pub fn is_live(&self, handle: RawHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }

    pub fn buffer_contents(&self, buffer: RawHandle) -> Option<&[u8]> {
        self.buffer_storage.get(&buffer).map(Vec::as_slice)
    }

    pub fn attribute(&self, vertex_array: RawHandle, slot: u32) -> Option<&AttributeRecord> {
        self.attributes.get(&vertex_array)?.get(&slot)
    }

    pub fn texture(&self, texture: RawHandle) -> Option<&TextureRecord> {
        self.textures.get(&texture)
    }

    pub fn renderbuffer_samples(&self, renderbuffer: RawHandle) -> Option<u32> {
        self.renderbuffer_samples.get(&renderbuffer).copied()
    }

    pub fn attachment(&self, framebuffer: RawHandle, attachment: Attachment) -> Option<AttachedObject> {
        self.framebuffers
            .get(&framebuffer)?
            .attachments
            .get(&AttachmentKey::of(attachment))
            .copied()
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<RawHandle> {
        match target {
            BufferTarget::ElementArray => self.element_buffers.get(&self.vertex_array).copied(),
            _ => self.buffers.get(&target).copied(),
        }
    }

    /// Element buffer recorded in `vertex_array`.
    pub fn element_buffer_of(&self, vertex_array: RawHandle) -> Option<RawHandle> {
        self.element_buffers.get(&Some(vertex_array)).copied()
    }

    fn set_bound_buffer(&mut self, target: BufferTarget, buffer: Option<RawHandle>) {
        let slot = self.vertex_array;
        match (target, buffer) {
            (BufferTarget::ElementArray, Some(b)) => {
                self.element_buffers.insert(slot, b);
            }
            (BufferTarget::ElementArray, None) => {
                self.element_buffers.remove(&slot);
            }
            (_, Some(b)) => {
                self.buffers.insert(target, b);
            }
            (_, None) => {
                self.buffers.remove(&target);
            }
        }
    }

    pub fn bound_vertex_array(&self) -> Option<RawHandle> {
        self.vertex_array
    }

    pub fn bound_framebuffer(&self) -> Option<RawHandle> {
        self.framebuffer
    }

    pub fn bound_program(&self) -> Option<RawHandle> {
        self.program
    }

    pub fn bound_texture(&self, unit: u32, target: TextureTarget) -> Option<RawHandle> {
        self.units.get(&(unit, target)).copied()
    }

    pub fn blending(&self) -> bool {
        self.blending
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn allocate(&mut self, kind: ResourceKind) -> Result<RawHandle, String> {
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                return Err(format!("out of memory allocating {kind}"));
            }
            Some(n) => self.fail_after = Some(n - 1),
            None => {}
        }
        self.next_id += 1;
        let handle = RawHandle::new(NonZeroU32::new(self.next_id).ok_or("id space exhausted")?);
        self.live.insert(handle, kind);
        self.created.push((kind, handle));
        Ok(handle)
    }

    fn release(&mut self, kind: ResourceKind, handle: RawHandle) -> bool {
        match self.live.get(&handle) {
            Some(k) if *k == kind => {
                self.live.remove(&handle);
                self.released.push((kind, handle));
                true
            }
            _ => {
                self.invalid_releases.push((kind, handle));
                false
            }
        }
    }

    fn bound_texture_on_active(&self, target: TextureTarget) -> Option<RawHandle> {
        self.units.get(&(self.active_unit, target)).copied()
    }

    fn texture_for_image(&self, target: ImageTarget) -> Option<RawHandle> {
        match target {
            ImageTarget::Texture2D => self.bound_texture_on_active(TextureTarget::Texture2D),
            ImageTarget::CubeFace(_) => self.bound_texture_on_active(TextureTarget::CubeMap),
        }
    }

    fn attach(&mut self, attachment: Attachment, object: AttachedObject) -> Option<RawHandle> {
        let fb = self.framebuffer?;
        self.framebuffers
            .entry(fb)
            .or_default()
            .attachments
            .insert(AttachmentKey::of(attachment), object);
        Some(fb)
    }
}

impl GlApi for MockGl {
    fn create_buffer(&mut self) -> Result<RawHandle, String> {
        let h = self.allocate(ResourceKind::Buffer)?;
        self.calls.push(Call::CreateBuffer(h));
        Ok(h)
    }

    fn delete_buffer(&mut self, buffer: RawHandle) {
        self.calls.push(Call::DeleteBuffer(buffer));
        if self.release(ResourceKind::Buffer, buffer) {
            self.buffer_storage.remove(&buffer);
            self.buffers.retain(|_, b| *b != buffer);
            self.element_buffers.retain(|_, b| *b != buffer);
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<RawHandle>) {
        self.calls.push(Call::BindBuffer(target, buffer));
        self.set_bound_buffer(target, buffer);
    }

    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        let buffer = self.bound_buffer(target);
        self.calls.push(Call::BufferData { buffer, size, with_data: data.is_some(), usage });
        if let Some(b) = buffer {
            let mut bytes = vec![0u8; size];
            if let Some(d) = data {
                let n = d.len().min(size);
                bytes[..n].copy_from_slice(&d[..n]);
            }
            self.buffer_storage.insert(b, bytes);
        }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        let buffer = self.bound_buffer(target);
        self.calls.push(Call::BufferSubData { buffer, offset, len: data.len() });
        if let Some(storage) = buffer.and_then(|b| self.buffer_storage.get_mut(&b)) {
            // Out-of-range writes are a driver error; the mock ignores them.
            if let Some(dst) = storage.get_mut(offset..offset + data.len()) {
                dst.copy_from_slice(data);
            }
        }
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: RawHandle) {
        self.calls.push(Call::BindBufferBase { index, buffer });
        // Indexed binds also update the generic binding point.
        self.set_bound_buffer(target, Some(buffer));
    }

    fn bind_buffer_range(&mut self, target: BufferTarget, index: u32, buffer: RawHandle, offset: usize, size: usize) {
        self.calls.push(Call::BindBufferRange { index, buffer, offset, size });
        self.set_bound_buffer(target, Some(buffer));
    }

    fn create_vertex_array(&mut self) -> Result<RawHandle, String> {
        let h = self.allocate(ResourceKind::VertexArray)?;
        self.calls.push(Call::CreateVertexArray(h));
        Ok(h)
    }

    fn delete_vertex_array(&mut self, vertex_array: RawHandle) {
        self.calls.push(Call::DeleteVertexArray(vertex_array));
        if self.release(ResourceKind::VertexArray, vertex_array) {
            self.attributes.remove(&vertex_array);
            self.element_buffers.remove(&Some(vertex_array));
            if self.vertex_array == Some(vertex_array) {
                self.vertex_array = None;
            }
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<RawHandle>) {
        self.calls.push(Call::BindVertexArray(vertex_array));
        self.vertex_array = vertex_array;
    }

    fn vertex_attrib_pointer(&mut self, attribute: &VertexAttribute) {
        let buffer = self.bound_buffer(BufferTarget::Array);
        self.calls.push(Call::VertexAttribPointer {
            vertex_array: self.vertex_array,
            buffer,
            attribute: *attribute,
        });
        if let Some(vao) = self.vertex_array {
            let slots = self.attributes.entry(vao).or_default();
            let record = slots.entry(attribute.slot).or_insert(AttributeRecord {
                attribute: *attribute,
                buffer,
                enabled: false,
                divisor: 0,
            });
            record.attribute = *attribute;
            record.buffer = buffer;
        }
    }

    fn enable_vertex_attrib_array(&mut self, slot: u32) {
        self.calls.push(Call::EnableVertexAttribArray(slot));
        if let Some(record) = self
            .vertex_array
            .and_then(|vao| self.attributes.get_mut(&vao))
            .and_then(|slots| slots.get_mut(&slot))
        {
            record.enabled = true;
        }
    }

    fn vertex_attrib_divisor(&mut self, slot: u32, divisor: u32) {
        self.calls.push(Call::VertexAttribDivisor { slot, divisor });
        if let Some(record) = self
            .vertex_array
            .and_then(|vao| self.attributes.get_mut(&vao))
            .and_then(|slots| slots.get_mut(&slot))
        {
            record.divisor = divisor;
        }
    }

    fn max_vertex_attribs(&self) -> u32 {
        self.max_vertex_attribs
    }

    fn create_texture(&mut self) -> Result<RawHandle, String> {
        let h = self.allocate(ResourceKind::Texture)?;
        self.calls.push(Call::CreateTexture(h));
        self.textures.insert(h, TextureRecord::default());
        Ok(h)
    }

    fn delete_texture(&mut self, texture: RawHandle) {
        self.calls.push(Call::DeleteTexture(texture));
        if self.release(ResourceKind::Texture, texture) {
            self.textures.remove(&texture);
            self.units.retain(|_, t| *t != texture);
        }
    }

    fn active_texture(&mut self, unit: u32) {
        self.calls.push(Call::ActiveTexture(unit));
        self.active_unit = unit;
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<RawHandle>) {
        self.calls.push(Call::BindTexture(target, texture));
        let key = (self.active_unit, target);
        match texture {
            Some(t) => {
                self.units.insert(key, t);
                if let Some(record) = self.textures.get_mut(&t) {
                    record.target.get_or_insert(target);
                }
            }
            None => {
                self.units.remove(&key);
            }
        }
    }

    fn tex_image_2d(&mut self, target: ImageTarget, desc: &ImageDesc, data: Option<&[u8]>) {
        let texture = self.texture_for_image(target);
        self.calls.push(Call::TexImage2D { texture, target, desc: *desc, with_data: data.is_some() });
        if let Some(record) = texture.and_then(|t| self.textures.get_mut(&t)) {
            record.images.push((target, *desc, data.is_some()));
        }
    }

    fn tex_image_2d_multisample(&mut self, samples: u32, internal_format: InternalFormat, _width: u32, _height: u32) {
        let texture = self.bound_texture_on_active(TextureTarget::Texture2DMultisample);
        self.calls.push(Call::TexImage2DMultisample { texture, samples, internal_format });
        if let Some(record) = texture.and_then(|t| self.textures.get_mut(&t)) {
            record.samples = samples;
        }
    }

    fn tex_parameter(&mut self, target: TextureTarget, param: TexParam) {
        let texture = self.bound_texture_on_active(target);
        self.calls.push(Call::TexParameter { texture, param });
        if let Some(record) = texture.and_then(|t| self.textures.get_mut(&t)) {
            record.params.push(param);
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        let texture = self.bound_texture_on_active(target);
        self.calls.push(Call::GenerateMipmap(texture));
        if let Some(record) = texture.and_then(|t| self.textures.get_mut(&t)) {
            record.mipmapped = true;
        }
    }

    fn set_unpack_alignment(&mut self, alignment: u32) {
        self.calls.push(Call::UnpackAlignment(alignment));
    }

    fn create_framebuffer(&mut self) -> Result<RawHandle, String> {
        let h = self.allocate(ResourceKind::Framebuffer)?;
        self.calls.push(Call::CreateFramebuffer(h));
        self.framebuffers.insert(h, FramebufferRecord::default());
        Ok(h)
    }

    fn delete_framebuffer(&mut self, framebuffer: RawHandle) {
        self.calls.push(Call::DeleteFramebuffer(framebuffer));
        if self.release(ResourceKind::Framebuffer, framebuffer) {
            self.framebuffers.remove(&framebuffer);
            if self.framebuffer == Some(framebuffer) {
                self.framebuffer = None;
            }
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<RawHandle>) {
        self.calls.push(Call::BindFramebuffer(framebuffer));
        self.framebuffer = framebuffer;
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, _target: TextureTarget, texture: RawHandle) {
        let framebuffer = self.attach(attachment, AttachedObject::Texture(texture));
        self.calls.push(Call::FramebufferTexture2D { framebuffer, attachment, texture });
    }

    fn framebuffer_texture(&mut self, attachment: Attachment, texture: RawHandle) {
        let framebuffer = self.attach(attachment, AttachedObject::Texture(texture));
        self.calls.push(Call::FramebufferTexture { framebuffer, attachment, texture });
    }

    fn create_renderbuffer(&mut self) -> Result<RawHandle, String> {
        let h = self.allocate(ResourceKind::Renderbuffer)?;
        self.calls.push(Call::CreateRenderbuffer(h));
        Ok(h)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RawHandle) {
        self.calls.push(Call::DeleteRenderbuffer(renderbuffer));
        if self.release(ResourceKind::Renderbuffer, renderbuffer) {
            self.renderbuffer_samples.remove(&renderbuffer);
            if self.renderbuffer == Some(renderbuffer) {
                self.renderbuffer = None;
            }
        }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RawHandle>) {
        self.calls.push(Call::BindRenderbuffer(renderbuffer));
        self.renderbuffer = renderbuffer;
    }

    fn renderbuffer_storage(&mut self, samples: u32, internal_format: InternalFormat, _width: u32, _height: u32) {
        let renderbuffer = self.renderbuffer;
        self.calls.push(Call::RenderbufferStorage { renderbuffer, samples, internal_format });
        if let Some(rb) = renderbuffer {
            self.renderbuffer_samples.insert(rb, samples);
        }
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RawHandle) {
        let framebuffer = self.attach(attachment, AttachedObject::Renderbuffer(renderbuffer));
        self.calls.push(Call::FramebufferRenderbuffer { framebuffer, attachment, renderbuffer });
    }

    fn draw_buffers(&mut self, buffers: &[ColorBuffer]) {
        self.calls.push(Call::DrawBuffers(buffers.to_vec()));
    }

    fn read_buffer(&mut self, buffer: ColorBuffer) {
        self.calls.push(Call::ReadBuffer(buffer));
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        let Some(fb) = self.framebuffer else {
            return FramebufferStatus::Complete;
        };
        if self.force_incomplete {
            return FramebufferStatus::Incomplete(INCOMPLETE_ATTACHMENT);
        }
        let Some(record) = self.framebuffers.get(&fb) else {
            return FramebufferStatus::Incomplete(INCOMPLETE_ATTACHMENT);
        };
        if record.attachments.is_empty() {
            return FramebufferStatus::Incomplete(INCOMPLETE_MISSING_ATTACHMENT);
        }

        let mut sample_counts = Vec::with_capacity(record.attachments.len());
        for object in record.attachments.values() {
            let samples = match object {
                AttachedObject::Texture(t) => match self.textures.get(t) {
                    Some(tex) if tex.has_storage() => tex.samples,
                    _ => return FramebufferStatus::Incomplete(INCOMPLETE_ATTACHMENT),
                },
                AttachedObject::Renderbuffer(r) => match self.renderbuffer_samples.get(r) {
                    Some(s) => *s,
                    None => return FramebufferStatus::Incomplete(INCOMPLETE_ATTACHMENT),
                },
            };
            // Single-sample storage reports 0 or 1 depending on the call used.
            sample_counts.push(samples.max(1));
        }
        if sample_counts.windows(2).any(|w| w[0] != w[1]) {
            return FramebufferStatus::Incomplete(INCOMPLETE_MULTISAMPLE);
        }
        FramebufferStatus::Complete
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<RawHandle, String> {
        let h = self.allocate(ResourceKind::Shader)?;
        self.calls.push(Call::CreateShader(stage, h));
        self.shader_stages.insert(h, stage);
        Ok(h)
    }

    fn compile_shader(&mut self, shader: RawHandle, source: &str) -> Result<(), String> {
        self.calls.push(Call::CompileShader(shader));
        if source.trim().is_empty() {
            return Err("0:1: error: empty translation unit".to_string());
        }
        if let Some(line) = source.lines().position(|l| l.contains(COMPILE_ERROR_MARKER)) {
            return Err(format!("0:{}: error: #error directive", line + 1));
        }
        Ok(())
    }

    fn delete_shader(&mut self, shader: RawHandle) {
        self.calls.push(Call::DeleteShader(shader));
        if self.release(ResourceKind::Shader, shader) {
            self.shader_stages.remove(&shader);
        }
    }

    fn create_program(&mut self) -> Result<RawHandle, String> {
        let h = self.allocate(ResourceKind::Program)?;
        self.calls.push(Call::CreateProgram(h));
        Ok(h)
    }

    fn attach_shader(&mut self, program: RawHandle, shader: RawHandle) {
        self.calls.push(Call::AttachShader { program, shader });
    }

    fn detach_shader(&mut self, program: RawHandle, shader: RawHandle) {
        self.calls.push(Call::DetachShader { program, shader });
    }

    fn link_program(&mut self, program: RawHandle) -> Result<(), String> {
        self.calls.push(Call::LinkProgram(program));
        if self.fail_link {
            return Err("error: vertex output does not match fragment input".to_string());
        }
        Ok(())
    }

    fn delete_program(&mut self, program: RawHandle) {
        self.calls.push(Call::DeleteProgram(program));
        if self.release(ResourceKind::Program, program) && self.program == Some(program) {
            self.program = None;
        }
    }

    fn use_program(&mut self, program: Option<RawHandle>) {
        self.calls.push(Call::UseProgram(program));
        self.program = program;
    }

    fn uniform_location(&self, _program: RawHandle, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        self.calls.push(Call::SetUniform { program: self.program, location, value });
    }

    fn uniform_block_index(&self, _program: RawHandle, name: &str) -> Option<u32> {
        self.uniform_blocks.iter().position(|u| u == name).map(|i| i as u32)
    }

    fn uniform_block_binding(&mut self, program: RawHandle, block_index: u32, binding: u32) {
        self.calls.push(Call::UniformBlockBinding { program, block_index, binding });
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.calls.push(Call::DrawArrays { mode, first, count });
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: IndexType, _offset: usize) {
        self.calls.push(Call::DrawElements { mode, count, index_type });
    }

    fn enable_alpha_blending(&mut self) -> bool {
        self.calls.push(Call::EnableAlphaBlending);
        std::mem::replace(&mut self.blending, true)
    }

    fn disable_blending(&mut self) {
        self.calls.push(Call::DisableBlending);
        self.blending = false;
    }
}
