use std::collections::BTreeMap;

use crate::context::{GpuHandle, GpuResource, RenderContext};
use crate::error::{ResourceError, ResourceResult};
use crate::gl::{BufferTarget, GlApi, RawHandle, ResourceKind, VertexAttribute};

use super::buffer::VertexBuffer;

/// Vertex input descriptor: which buffer bytes feed which shader input slot.
#[derive(Debug)]
pub struct VertexArray {
    handle: GpuHandle,
    sources: BTreeMap<u32, RawHandle>,
}

impl VertexArray {
    pub fn new<G: GlApi>(ctx: &mut RenderContext<G>) -> ResourceResult<Self> {
        let handle = ctx.create(ResourceKind::VertexArray)?;
        log::debug!("vertex array {} created", handle.raw());
        Ok(Self { handle, sources: BTreeMap::new() })
    }

    /// Number of attribute slots the driver exposes.
    pub fn max_attribute_slots<G: GlApi>(ctx: &RenderContext<G>) -> u32 {
        ctx.gl().max_vertex_attribs()
    }

    pub fn bind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_vertex_array(Some(self.handle.raw()));
    }

    pub fn unbind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.bind_vertex_array(None);
    }

    /// Records `attribute` against whichever array buffer the context has bound
    /// right now, then enables the slot and sets its divisor (0 for per-vertex
    /// data). Leaves this vertex array bound.
    ///
    /// The source buffer is not a parameter: bind the intended buffer
    /// immediately before calling, or use [`configure_attribute_from`].
    /// Returns the captured buffer.
    ///
    /// [`configure_attribute_from`]: VertexArray::configure_attribute_from
    pub fn configure_attribute<G: GlApi>(
        &mut self,
        ctx: &mut RenderContext<G>,
        attribute: &VertexAttribute,
    ) -> ResourceResult<RawHandle> {
        let slot = attribute.slot;
        if !(1..=4).contains(&attribute.components) {
            return Err(ResourceError::InvalidAttribute { slot, components: attribute.components });
        }
        let max = Self::max_attribute_slots(ctx);
        if slot >= max {
            return Err(ResourceError::AttributeSlotOutOfRange { slot, max });
        }
        let Some(source) = ctx.bound_buffer(BufferTarget::Array) else {
            return Err(ResourceError::NoArrayBufferBound { slot });
        };

        if ctx.bound_vertex_array() != Some(self.handle.raw()) {
            self.bind(ctx);
        }
        let gl = ctx.gl_mut();
        gl.vertex_attrib_pointer(attribute);
        gl.enable_vertex_attrib_array(slot);
        // divisor 0 must be written too, the slot may have been instanced before
        gl.vertex_attrib_divisor(slot, attribute.divisor);

        self.sources.insert(slot, source);
        Ok(source)
    }

    /// Binds `buffer`, then configures `attribute` from it.
    pub fn configure_attribute_from<G: GlApi>(
        &mut self,
        ctx: &mut RenderContext<G>,
        buffer: &VertexBuffer,
        attribute: &VertexAttribute,
    ) -> ResourceResult<RawHandle> {
        buffer.bind(ctx);
        self.configure_attribute(ctx, attribute)
    }

    /// Buffer captured for `slot` by the last successful configuration.
    pub fn attribute_source(&self, slot: u32) -> Option<RawHandle> {
        self.sources.get(&slot).copied()
    }

    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle.raw()
    }
}

impl GpuResource for VertexArray {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VertexArray
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle.raw()
    }
}
