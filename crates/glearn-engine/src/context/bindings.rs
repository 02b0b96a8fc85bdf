use std::collections::HashMap;

use crate::gl::{BufferTarget, RawHandle, ResourceKind, TextureTarget};

/// Context-side mirror of the driver's binding points.
///
/// Updated by every binding call the context issues, and scrubbed when a
/// handle is released so it never names a dead object. The element array
/// slot belongs to the bound vertex array, so it is keyed by it.
#[derive(Debug, Default)]
pub(crate) struct BindingTable {
    pub(crate) buffers: HashMap<BufferTarget, RawHandle>,
    pub(crate) element_buffers: HashMap<Option<RawHandle>, RawHandle>,
    pub(crate) vertex_array: Option<RawHandle>,
    pub(crate) framebuffer: Option<RawHandle>,
    pub(crate) renderbuffer: Option<RawHandle>,
    pub(crate) program: Option<RawHandle>,
    pub(crate) active_unit: u32,
    pub(crate) textures: HashMap<(u32, TextureTarget), RawHandle>,
}

impl BindingTable {
    pub(crate) fn buffer(&self, target: BufferTarget) -> Option<RawHandle> {
        match target {
            BufferTarget::ElementArray => self.element_buffers.get(&self.vertex_array).copied(),
            _ => self.buffers.get(&target).copied(),
        }
    }

    pub(crate) fn set_buffer(&mut self, target: BufferTarget, handle: Option<RawHandle>) {
        if target == BufferTarget::ElementArray {
            match handle {
                Some(h) => self.element_buffers.insert(self.vertex_array, h),
                None => self.element_buffers.remove(&self.vertex_array),
            };
            return;
        }
        match handle {
            Some(h) => self.buffers.insert(target, h),
            None => self.buffers.remove(&target),
        };
    }

    pub(crate) fn set_texture(&mut self, unit: u32, target: TextureTarget, handle: Option<RawHandle>) {
        match handle {
            Some(h) => self.textures.insert((unit, target), h),
            None => self.textures.remove(&(unit, target)),
        };
    }

    /// Clears every slot naming `handle`.
    pub(crate) fn forget(&mut self, kind: ResourceKind, handle: RawHandle) {
        fn clear(slot: &mut Option<RawHandle>, handle: RawHandle) {
            if *slot == Some(handle) {
                *slot = None;
            }
        }

        match kind {
            ResourceKind::Buffer => {
                self.buffers.retain(|_, h| *h != handle);
                self.element_buffers.retain(|_, h| *h != handle);
            }
            ResourceKind::Texture => self.textures.retain(|_, h| *h != handle),
            ResourceKind::VertexArray => {
                self.element_buffers.remove(&Some(handle));
                clear(&mut self.vertex_array, handle);
            }
            ResourceKind::Framebuffer => clear(&mut self.framebuffer, handle),
            ResourceKind::Renderbuffer => clear(&mut self.renderbuffer, handle),
            ResourceKind::Program => clear(&mut self.program, handle),
            ResourceKind::Shader => {}
        }
    }
}
