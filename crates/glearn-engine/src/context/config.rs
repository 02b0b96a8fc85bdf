/// Limits enforced by the render context.
///
/// The defaults match the minimums an OpenGL 3.3 core driver guarantees for the
/// features the sandbox uses.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Number of addressable texture units; valid units are `0..texture_units`.
    pub texture_units: u32,
    /// Upper bound on color attachments per framebuffer.
    pub max_color_attachments: usize,
    /// Warnings retained before the oldest are dropped.
    pub warning_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            texture_units: 16,
            max_color_attachments: 32,
            warning_capacity: 256,
        }
    }
}
