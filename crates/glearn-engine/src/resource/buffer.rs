use std::marker::PhantomData;

use bytemuck::Pod;

use crate::context::{GpuHandle, GpuResource, RenderContext};
use crate::error::{ResourceError, ResourceResult};
use crate::gl::{BufferTarget, BufferUsage, GlApi, RawHandle, ResourceKind};

/// Binding target a buffer is created for.
pub trait BufferKind {
    const TARGET: BufferTarget;
}

#[derive(Debug)]
pub struct ArrayTarget;
#[derive(Debug)]
pub struct ElementTarget;
#[derive(Debug)]
pub struct UniformTarget;

impl BufferKind for ArrayTarget {
    const TARGET: BufferTarget = BufferTarget::Array;
}

impl BufferKind for ElementTarget {
    const TARGET: BufferTarget = BufferTarget::ElementArray;
}

impl BufferKind for UniformTarget {
    const TARGET: BufferTarget = BufferTarget::Uniform;
}

pub type VertexBuffer = Buffer<ArrayTarget>;
pub type ElementBuffer = Buffer<ElementTarget>;
pub type UniformBuffer = Buffer<UniformTarget>;

/// Fixed-size GPU buffer bound to a single target.
///
/// Element buffers bind into the current vertex array; bind the vertex array
/// first when an element buffer should be recorded by it.
#[derive(Debug)]
pub struct Buffer<T: BufferKind> {
    handle: GpuHandle,
    size: usize,
    usage: BufferUsage,
    _target: PhantomData<T>,
}

impl<T: BufferKind> Buffer<T> {
    /// Allocates `size` bytes, optionally uploading `initial` (which must be exactly `size` long).
    ///
    /// The buffer previously bound to the target is bound again afterwards.
    pub fn new<G: GlApi>(
        ctx: &mut RenderContext<G>,
        size: usize,
        initial: Option<&[u8]>,
        usage: BufferUsage,
    ) -> ResourceResult<Self> {
        let data_len = initial.map(<[u8]>::len);
        if size == 0 || data_len.is_some_and(|len| len != size) {
            return Err(ResourceError::InvalidSize { size, data_len });
        }

        let handle = ctx.create(ResourceKind::Buffer)?;
        let previous = ctx.bound_buffer(T::TARGET);
        ctx.bind_buffer(T::TARGET, Some(handle.raw()));
        ctx.gl_mut().buffer_data(T::TARGET, size, initial, usage);
        ctx.bind_buffer(T::TARGET, previous);

        log::debug!("{:?} buffer {} created ({size} bytes, {usage:?})", T::TARGET, handle.raw());
        Ok(Self { handle, size, usage, _target: PhantomData })
    }

    /// Allocates a buffer holding exactly `data`.
    pub fn from_slice<G: GlApi, P: Pod>(
        ctx: &mut RenderContext<G>,
        data: &[P],
        usage: BufferUsage,
    ) -> ResourceResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::new(ctx, bytes.len(), Some(bytes), usage)
    }

    pub fn bind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_buffer(T::TARGET, Some(self.handle.raw()));
    }

    pub fn unbind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_buffer(T::TARGET, None);
    }

    /// Overwrites `[offset, offset + data.len())` of this buffer.
    ///
    /// Targets this buffer regardless of what is bound; the previous binding is
    /// restored. Writes past the end are rejected before any native call.
    pub fn update<G: GlApi>(&self, ctx: &mut RenderContext<G>, offset: usize, data: &[u8]) -> ResourceResult<()> {
        let end = offset.checked_add(data.len());
        if end.is_none_or(|end| end > self.size) {
            return Err(ResourceError::UpdateOutOfRange { offset, len: data.len(), size: self.size });
        }
        if data.is_empty() {
            return Ok(());
        }

        let raw = self.handle.raw();
        let previous = ctx.bound_buffer(T::TARGET);
        if previous != Some(raw) {
            ctx.bind_buffer(T::TARGET, Some(raw));
        }
        ctx.gl_mut().buffer_sub_data(T::TARGET, offset, data);
        if previous != Some(raw) {
            ctx.bind_buffer(T::TARGET, previous);
        }
        Ok(())
    }

    pub fn update_slice<G: GlApi, P: Pod>(
        &self,
        ctx: &mut RenderContext<G>,
        offset: usize,
        data: &[P],
    ) -> ResourceResult<()> {
        self.update(ctx, offset, bytemuck::cast_slice(data))
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle.raw()
    }
}

impl Buffer<UniformTarget> {
    /// Binds the whole buffer to indexed uniform binding `point`.
    pub fn bind_to_binding_point<G: GlApi>(&self, ctx: &mut RenderContext<G>, point: u32) {
        ctx.bind_buffer_base(BufferTarget::Uniform, point, self.handle.raw());
    }

    /// Binds `[offset, offset + size)` to indexed uniform binding `point`.
    pub fn bind_range<G: GlApi>(
        &self,
        ctx: &mut RenderContext<G>,
        point: u32,
        offset: usize,
        size: usize,
    ) -> ResourceResult<()> {
        let end = offset.checked_add(size);
        if size == 0 || end.is_none_or(|end| end > self.size) {
            return Err(ResourceError::RangeOutOfBounds { offset, len: size, size: self.size });
        }
        ctx.bind_buffer_range(BufferTarget::Uniform, point, self.handle.raw(), offset, size);
        Ok(())
    }
}

impl<T: BufferKind> GpuResource for Buffer<T> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Buffer
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle.raw()
    }
}
