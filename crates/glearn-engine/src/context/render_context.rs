use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{ResourceError, ResourceResult};
use crate::gl::{
    BufferTarget, DrawMode, GlApi, IndexType, RawHandle, ResourceKind, ShaderStage, TextureTarget,
};

use super::bindings::BindingTable;
use super::config::ContextConfig;
use super::diagnostics::{Diagnostics, Warning};
use super::release::{GpuHandle, ReleaseQueue};

/// A wrapper that owns native objects created through a `RenderContext`.
pub trait GpuResource {
    fn kind(&self) -> ResourceKind;
    /// The primary native object (composites expose their parent object).
    fn raw_handle(&self) -> RawHandle;
}

/// Owns the backend and everything the resource layer shares:
/// the binding table, the deferred release queue and the warning channel.
///
/// Wrappers only touch binding points through the context, so the table
/// always mirrors the driver. The context is `!Send`; all resources must be
/// created, used and dropped on the thread that owns the GL context.
pub struct RenderContext<G: GlApi> {
    gl: G,
    config: ContextConfig,
    bindings: BindingTable,
    releases: ReleaseQueue,
    diagnostics: Diagnostics,
}

impl<G: GlApi> RenderContext<G> {
    pub fn new(gl: G, config: ContextConfig) -> Self {
        log::debug!(
            "render context created ({} texture units, {} color attachments)",
            config.texture_units,
            config.max_color_attachments
        );
        let diagnostics = Diagnostics::new(config.warning_capacity);
        Self {
            gl,
            config,
            bindings: BindingTable::default(),
            releases: Rc::new(RefCell::new(Vec::new())),
            diagnostics,
        }
    }

    #[inline]
    pub fn gl(&self) -> &G {
        &self.gl
    }

    #[inline]
    pub fn gl_mut(&mut self) -> &mut G {
        &mut self.gl
    }

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    // ── allocation / release ──────────────────────────────────────────────

    /// Creates one native object of `kind` and wraps it in an owning guard.
    pub(crate) fn create(&mut self, kind: ResourceKind) -> ResourceResult<GpuHandle> {
        let raw = match kind {
            ResourceKind::Buffer => self.gl.create_buffer(),
            ResourceKind::VertexArray => self.gl.create_vertex_array(),
            ResourceKind::Texture => self.gl.create_texture(),
            ResourceKind::Renderbuffer => self.gl.create_renderbuffer(),
            ResourceKind::Framebuffer => self.gl.create_framebuffer(),
            ResourceKind::Program => self.gl.create_program(),
            ResourceKind::Shader => Err("shader objects are created per stage".to_string()),
        };
        self.guard(kind, raw)
    }

    pub(crate) fn create_shader(&mut self, stage: ShaderStage) -> ResourceResult<GpuHandle> {
        let raw = self.gl.create_shader(stage);
        self.guard(ResourceKind::Shader, raw)
    }

    fn guard(&mut self, kind: ResourceKind, raw: Result<RawHandle, String>) -> ResourceResult<GpuHandle> {
        let raw = raw.map_err(|reason| ResourceError::Allocation { kind, reason })?;
        log::trace!("created {kind} {raw}");
        Ok(GpuHandle::new(kind, raw, Rc::clone(&self.releases)))
    }

    /// Issues every scheduled native delete. Returns how many were issued.
    ///
    /// Each dropped guard contributes exactly one entry, so every handle is
    /// deleted exactly once. Binding slots naming a released handle are cleared.
    pub fn maintain(&mut self) -> usize {
        let pending = std::mem::take(&mut *self.releases.borrow_mut());
        for &(kind, raw) in &pending {
            self.release(kind, raw);
        }
        pending.len()
    }

    /// Releases one guard's object immediately; other scheduled releases stay queued.
    pub(crate) fn release_now(&mut self, handle: GpuHandle) {
        let entry = (handle.kind(), handle.raw());
        drop(handle);
        let mut queue = self.releases.borrow_mut();
        if let Some(index) = queue.iter().rposition(|queued| *queued == entry) {
            queue.remove(index);
        }
        drop(queue);
        self.release(entry.0, entry.1);
    }

    fn release(&mut self, kind: ResourceKind, raw: RawHandle) {
        self.bindings.forget(kind, raw);
        match kind {
            ResourceKind::Buffer => self.gl.delete_buffer(raw),
            ResourceKind::VertexArray => self.gl.delete_vertex_array(raw),
            ResourceKind::Texture => self.gl.delete_texture(raw),
            ResourceKind::Renderbuffer => self.gl.delete_renderbuffer(raw),
            ResourceKind::Framebuffer => self.gl.delete_framebuffer(raw),
            ResourceKind::Program => self.gl.delete_program(raw),
            ResourceKind::Shader => self.gl.delete_shader(raw),
        }
        log::trace!("released {kind} {raw}");
    }

    /// Drops `resource` and releases its native objects right away.
    pub fn destroy<R: GpuResource>(&mut self, resource: R) {
        log::debug!("destroying {} {}", resource.kind(), resource.raw_handle());
        drop(resource);
        self.maintain();
    }

    pub fn pending_releases(&self) -> usize {
        self.releases.borrow().len()
    }

    // ── warnings ──────────────────────────────────────────────────────────

    /// Records a non-fatal problem on the warning channel.
    pub fn warn(&mut self, warning: Warning) {
        self.diagnostics.push(warning);
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.diagnostics.iter()
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        self.diagnostics.take()
    }

    // ── binding queries ───────────────────────────────────────────────────

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<RawHandle> {
        self.bindings.buffer(target)
    }

    pub fn bound_vertex_array(&self) -> Option<RawHandle> {
        self.bindings.vertex_array
    }

    pub fn bound_framebuffer(&self) -> Option<RawHandle> {
        self.bindings.framebuffer
    }

    pub fn bound_renderbuffer(&self) -> Option<RawHandle> {
        self.bindings.renderbuffer
    }

    pub fn bound_program(&self) -> Option<RawHandle> {
        self.bindings.program
    }

    pub fn active_texture_unit(&self) -> u32 {
        self.bindings.active_unit
    }

    pub fn bound_texture(&self, unit: u32, target: TextureTarget) -> Option<RawHandle> {
        self.bindings.textures.get(&(unit, target)).copied()
    }

    // ── binding operations ────────────────────────────────────────────────

    pub fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<RawHandle>) {
        self.gl.bind_buffer(target, buffer);
        self.bindings.set_buffer(target, buffer);
    }

    /// Binds `buffer` to an indexed binding point; the generic `target` slot follows.
    pub fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: RawHandle) {
        self.gl.bind_buffer_base(target, index, buffer);
        self.bindings.set_buffer(target, Some(buffer));
    }

    pub fn bind_buffer_range(
        &mut self,
        target: BufferTarget,
        index: u32,
        buffer: RawHandle,
        offset: usize,
        size: usize,
    ) {
        self.gl.bind_buffer_range(target, index, buffer, offset, size);
        self.bindings.set_buffer(target, Some(buffer));
    }

    pub fn bind_vertex_array(&mut self, vertex_array: Option<RawHandle>) {
        self.gl.bind_vertex_array(vertex_array);
        self.bindings.vertex_array = vertex_array;
    }

    pub fn bind_framebuffer(&mut self, framebuffer: Option<RawHandle>) {
        self.gl.bind_framebuffer(framebuffer);
        self.bindings.framebuffer = framebuffer;
    }

    pub fn bind_renderbuffer(&mut self, renderbuffer: Option<RawHandle>) {
        self.gl.bind_renderbuffer(renderbuffer);
        self.bindings.renderbuffer = renderbuffer;
    }

    pub fn use_program(&mut self, program: Option<RawHandle>) {
        self.gl.use_program(program);
        self.bindings.program = program;
    }

    /// Selects `unit` and binds `texture` (or clears it) on `target`.
    ///
    /// Returns `false` and records `Warning::TextureUnitOutOfRange` without
    /// touching the driver when `unit` is not below the configured unit count.
    pub fn bind_texture_unit(&mut self, unit: u32, target: TextureTarget, texture: Option<RawHandle>) -> bool {
        if unit >= self.config.texture_units {
            self.warn(Warning::TextureUnitOutOfRange {
                unit,
                units: self.config.texture_units,
            });
            return false;
        }
        self.gl.active_texture(unit);
        self.bindings.active_unit = unit;
        self.gl.bind_texture(target, texture);
        self.bindings.set_texture(unit, target, texture);
        true
    }

    // ── draws ─────────────────────────────────────────────────────────────

    pub fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.gl.draw_arrays(mode, first, count);
    }

    /// Draws `count` indices from the element buffer recorded in the bound vertex array.
    pub fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: IndexType, offset: usize) {
        self.gl.draw_elements(mode, count, index_type, offset);
    }
}

impl<G: GlApi> Drop for RenderContext<G> {
    fn drop(&mut self) {
        let released = self.maintain();
        if released > 0 {
            log::debug!("render context dropped, {released} pending release(s) flushed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::MockGl;
    use crate::gl::mock::Call;

    fn ctx() -> RenderContext<MockGl> {
        RenderContext::new(MockGl::new(), ContextConfig::default())
    }

    #[test]
    fn dropped_guard_is_released_on_maintain() {
        let mut ctx = ctx();
        let guard = ctx.create(ResourceKind::Buffer).unwrap();
        let raw = guard.raw();
        drop(guard);
        assert_eq!(ctx.pending_releases(), 1);
        assert!(ctx.gl().is_live(raw));

        assert_eq!(ctx.maintain(), 1);
        assert!(!ctx.gl().is_live(raw));
        assert_eq!(ctx.gl().release_count(raw), 1);
        assert_eq!(ctx.maintain(), 0);
        assert!(ctx.gl().invalid_releases().is_empty());
    }

    #[test]
    fn release_clears_binding_slot() {
        let mut ctx = ctx();
        let guard = ctx.create(ResourceKind::Buffer).unwrap();
        ctx.bind_buffer(BufferTarget::Array, Some(guard.raw()));
        assert_eq!(ctx.bound_buffer(BufferTarget::Array), Some(guard.raw()));

        drop(guard);
        ctx.maintain();
        assert_eq!(ctx.bound_buffer(BufferTarget::Array), None);
    }

    #[test]
    fn release_now_leaves_other_releases_queued() {
        let mut ctx = ctx();
        let kept_pending = ctx.create(ResourceKind::Buffer).unwrap();
        let kept_raw = kept_pending.raw();
        drop(kept_pending);
        let immediate = ctx.create(ResourceKind::Texture).unwrap();
        let raw = immediate.raw();

        ctx.release_now(immediate);
        assert_eq!(ctx.gl().release_count(raw), 1);
        assert_eq!(ctx.gl().release_count(kept_raw), 0);
        assert_eq!(ctx.pending_releases(), 1);

        assert_eq!(ctx.maintain(), 1);
        assert_eq!(ctx.gl().release_count(raw), 1);
        assert!(ctx.gl().invalid_releases().is_empty());
    }

    #[test]
    fn allocation_failure_is_fatal() {
        let mut ctx = ctx();
        ctx.gl_mut().fail_allocation_after(0);
        let err = ctx.create(ResourceKind::Texture).unwrap_err();
        assert!(matches!(err, ResourceError::Allocation { kind: ResourceKind::Texture, .. }));
        assert!(ctx.create(ResourceKind::Texture).is_ok());
    }

    #[test]
    fn texture_unit_out_of_range_warns_without_native_call() {
        let mut ctx = ctx();
        let guard = ctx.create(ResourceKind::Texture).unwrap();
        ctx.gl_mut().clear_calls();

        assert!(!ctx.bind_texture_unit(16, TextureTarget::Texture2D, Some(guard.raw())));
        assert!(ctx.gl().calls().is_empty());
        assert_eq!(
            ctx.take_warnings(),
            vec![Warning::TextureUnitOutOfRange { unit: 16, units: 16 }]
        );

        assert!(ctx.bind_texture_unit(15, TextureTarget::Texture2D, Some(guard.raw())));
        assert_eq!(ctx.active_texture_unit(), 15);
        assert_eq!(ctx.bound_texture(15, TextureTarget::Texture2D), Some(guard.raw()));
        assert_eq!(ctx.gl().calls()[0], Call::ActiveTexture(15));
    }

    #[test]
    fn guard_outliving_context_does_not_panic() {
        let mut ctx = ctx();
        let guard = ctx.create(ResourceKind::Program).unwrap();
        drop(ctx);
        drop(guard);
    }

    #[test]
    fn binding_table_tracks_last_bind() {
        let mut ctx = ctx();
        let a = ctx.create(ResourceKind::VertexArray).unwrap();
        let b = ctx.create(ResourceKind::VertexArray).unwrap();
        ctx.bind_vertex_array(Some(a.raw()));
        ctx.bind_vertex_array(Some(b.raw()));
        assert_eq!(ctx.bound_vertex_array(), Some(b.raw()));
        assert_eq!(ctx.gl().bound_vertex_array(), Some(b.raw()));
    }
}
