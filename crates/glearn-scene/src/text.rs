use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use glam::{IVec2, UVec2, Vec3};
use glearn_engine::gl::{
    BufferUsage, ComponentType, DrawMode, GlApi, InternalFormat, PixelFormat, TextureTarget,
    VertexAttribute,
};
use glearn_engine::resource::{RawTextureDesc, Sampling, ShaderProgram, Texture, VertexArray, VertexBuffer};
use glearn_engine::{RenderContext, ResourceResult, Warning};

pub const DEFAULT_PIXEL_SIZE: f32 = 48.0;

/// Texture unit glyphs are sampled from.
pub const GLYPH_UNIT: u32 = 15;

/// One textured quad: six `[x, y, u, v]` vertices.
pub type GlyphQuad = [[f32; 4]; 6];

/// Coverage bitmap of one rasterized glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub size: UVec2,
    /// Offset from the pen position to the bitmap's left edge (x) and top edge (y, up).
    pub bearing: IVec2,
    /// Horizontal pen advance in pixels.
    pub advance: f32,
    /// One byte per pixel, rows top to bottom.
    pub coverage: Vec<u8>,
}

impl GlyphBitmap {
    fn from_fontdue(metrics: &fontdue::Metrics, coverage: Vec<u8>) -> Self {
        let size = UVec2::new(metrics.width as u32, metrics.height as u32);
        Self {
            size,
            bearing: IVec2::new(metrics.xmin, metrics.ymin + metrics.height as i32),
            advance: metrics.advance_width,
            coverage,
        }
    }
}

#[derive(Debug)]
struct Glyph {
    /// `None` for glyphs with no visible pixels (space).
    texture: Option<Texture>,
    size: UVec2,
    bearing: IVec2,
    advance: f32,
}

/// Quad covering a glyph whose pen sits at `(x, y)` (y up, baseline).
pub fn glyph_quad(x: f32, y: f32, size: UVec2, bearing: IVec2, scale: f32) -> GlyphQuad {
    let xpos = x + bearing.x as f32 * scale;
    let ypos = y - (size.y as i32 - bearing.y) as f32 * scale;
    let w = size.x as f32 * scale;
    let h = size.y as f32 * scale;
    [
        [xpos, ypos + h, 0.0, 0.0],
        [xpos, ypos, 0.0, 1.0],
        [xpos + w, ypos, 1.0, 1.0],
        [xpos, ypos + h, 0.0, 0.0],
        [xpos + w, ypos, 1.0, 1.0],
        [xpos + w, ypos + h, 1.0, 0.0],
    ]
}

/// Draws ASCII text from pre-rasterized glyph textures.
///
/// Every glyph is a single-channel texture; `write` streams one quad per
/// character through a small dynamic vertex buffer.
#[derive(Debug)]
pub struct TextRenderer {
    glyphs: HashMap<char, Glyph>,
    vertex_array: VertexArray,
    vertices: VertexBuffer,
}

impl TextRenderer {
    pub fn from_file<G: GlApi>(
        ctx: &mut RenderContext<G>,
        path: impl AsRef<Path>,
        pixel_size: f32,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        Self::from_font_bytes(ctx, &bytes, pixel_size).with_context(|| format!("loading font {}", path.display()))
    }

    /// Rasterizes characters 0..128 of a TrueType/OpenType font at `pixel_size`.
    pub fn from_font_bytes<G: GlApi>(ctx: &mut RenderContext<G>, bytes: &[u8], pixel_size: f32) -> anyhow::Result<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| anyhow::anyhow!("font parse error: {e}"))?;

        let bitmaps: Vec<(char, GlyphBitmap)> = (0u8..128)
            .map(char::from)
            .filter(|&ch| font.lookup_glyph_index(ch) != 0 || ch == ' ')
            .map(|ch| {
                let (metrics, coverage) = font.rasterize(ch, pixel_size);
                (ch, GlyphBitmap::from_fontdue(&metrics, coverage))
            })
            .collect();
        log::debug!("rasterized {} glyphs at {pixel_size}px", bitmaps.len());

        Ok(Self::from_bitmaps(ctx, bitmaps)?)
    }

    /// Uploads already rasterized glyphs.
    pub fn from_bitmaps<G: GlApi>(
        ctx: &mut RenderContext<G>,
        bitmaps: impl IntoIterator<Item = (char, GlyphBitmap)>,
    ) -> ResourceResult<Self> {
        let glyphs = upload_glyphs(ctx, bitmaps)?;

        let vertices = VertexBuffer::new(ctx, size_of::<GlyphQuad>(), None, BufferUsage::DynamicDraw)?;
        let mut vertex_array = VertexArray::new(ctx)?;
        let stride = size_of::<[f32; 4]>() as u32;
        vertex_array.configure_attribute_from(ctx, &vertices, &VertexAttribute::floats(0, 4, stride, 0))?;
        vertex_array.unbind(ctx);
        vertices.unbind(ctx);

        Ok(Self { glyphs, vertex_array, vertices })
    }

    /// Draws `text` with its baseline starting at `(x, y)` in the projection
    /// the program expects, tinted by `color` (uniform `uTextColor`).
    ///
    /// Alpha blending is on for the duration of the call and restored after.
    /// Characters without a glyph are skipped with a warning. Returns the pen
    /// position after the last character.
    #[allow(clippy::too_many_arguments)]
    pub fn write<G: GlApi>(
        &self,
        ctx: &mut RenderContext<G>,
        program: &ShaderProgram,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: Vec3,
    ) -> ResourceResult<f32> {
        let was_blending = ctx.gl_mut().enable_alpha_blending();
        program.bind(ctx);
        program.set_vec3(ctx, "uTextColor", color);
        self.vertex_array.bind(ctx);

        let result = self.draw_glyphs(ctx, text, x, y, scale);

        if GLYPH_UNIT < ctx.config().texture_units {
            ctx.bind_texture_unit(GLYPH_UNIT, TextureTarget::Texture2D, None);
        }
        self.vertex_array.unbind(ctx);
        program.unbind(ctx);
        if !was_blending {
            ctx.gl_mut().disable_blending();
        }
        result
    }

    fn draw_glyphs<G: GlApi>(&self, ctx: &mut RenderContext<G>, text: &str, mut x: f32, y: f32, scale: f32) -> ResourceResult<f32> {
        for ch in text.chars() {
            let Some(glyph) = self.glyphs.get(&ch) else {
                ctx.warn(Warning::GlyphMissing { ch });
                continue;
            };
            if let Some(texture) = &glyph.texture {
                if !texture.bind(ctx, GLYPH_UNIT) {
                    return Ok(x);
                }
                let quad = glyph_quad(x, y, glyph.size, glyph.bearing, scale);
                self.vertices.update_slice(ctx, 0, &quad)?;
                ctx.draw_arrays(DrawMode::Triangles, 0, 6);
            }
            x += glyph.advance * scale;
        }
        Ok(x)
    }

    /// Horizontal advance of `text` at `scale`, ignoring unknown characters.
    pub fn measure(&self, text: &str, scale: f32) -> f32 {
        text.chars()
            .filter_map(|ch| self.glyphs.get(&ch))
            .map(|g| g.advance * scale)
            .sum()
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

fn upload_glyphs<G: GlApi>(
    ctx: &mut RenderContext<G>,
    bitmaps: impl IntoIterator<Item = (char, GlyphBitmap)>,
) -> ResourceResult<HashMap<char, Glyph>> {
    let mut glyphs = HashMap::new();
    for (ch, bitmap) in bitmaps {
        let texture = if bitmap.size.x == 0 || bitmap.size.y == 0 {
            None
        } else {
            let desc = RawTextureDesc {
                width: bitmap.size.x,
                height: bitmap.size.y,
                internal_format: InternalFormat::Red,
                format: PixelFormat::Red,
                component_type: ComponentType::UnsignedByte,
                sampling: Sampling::linear_clamped(),
            };
            Some(Texture::from_raw(ctx, &desc, Some(&bitmap.coverage))?)
        };
        glyphs.insert(ch, Glyph { texture, size: bitmap.size, bearing: bitmap.bearing, advance: bitmap.advance });
    }
    Ok(glyphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glearn_engine::ContextConfig;
    use glearn_engine::gl::mock::Call;
    use glearn_engine::gl::{MockGl, ResourceKind, ShaderStage, UniformValue};

    fn ctx() -> RenderContext<MockGl> {
        RenderContext::new(MockGl::new(), ContextConfig::default())
    }

    fn bitmap(w: u32, h: u32, bearing: (i32, i32), advance: f32) -> GlyphBitmap {
        GlyphBitmap {
            size: UVec2::new(w, h),
            bearing: IVec2::new(bearing.0, bearing.1),
            advance,
            coverage: vec![200; (w * h) as usize],
        }
    }

    fn glyph_set() -> Vec<(char, GlyphBitmap)> {
        vec![
            ('A', bitmap(3, 5, (1, 5), 6.0)),
            ('g', bitmap(3, 6, (0, 4), 5.0)),
            (' ', bitmap(0, 0, (0, 0), 4.0)),
        ]
    }

    fn program(ctx: &mut RenderContext<MockGl>) -> ShaderProgram {
        ctx.gl_mut().declare_uniform("uTextColor");
        ShaderProgram::from_sources(
            ctx,
            &[(ShaderStage::Vertex, "void main() {}"), (ShaderStage::Fragment, "void main() {}")],
        )
        .unwrap()
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn quad_sits_on_the_baseline() {
        let quad = glyph_quad(10.0, 20.0, UVec2::new(3, 5), IVec2::new(1, 5), 1.0);
        assert_eq!(quad[0], [11.0, 25.0, 0.0, 0.0]);
        assert_eq!(quad[1], [11.0, 20.0, 0.0, 1.0]);
        assert_eq!(quad[2], [14.0, 20.0, 1.0, 1.0]);
        assert_eq!(quad[5], [14.0, 25.0, 1.0, 0.0]);
    }

    #[test]
    fn descender_hangs_below_the_baseline() {
        let quad = glyph_quad(0.0, 10.0, UVec2::new(3, 6), IVec2::new(0, 4), 2.0);
        // 2px below the baseline, scaled by 2
        assert_eq!(quad[1][1], 6.0);
        assert_eq!(quad[0][1], 18.0);
    }

    // ── upload ────────────────────────────────────────────────────────────

    #[test]
    fn blank_glyphs_get_no_texture() {
        let mut ctx = ctx();
        let text = TextRenderer::from_bitmaps(&mut ctx, glyph_set()).unwrap();
        assert_eq!(text.glyph_count(), 3);
        assert_eq!(ctx.gl().live_of(ResourceKind::Texture), 2);
        assert_eq!(ctx.gl().live_of(ResourceKind::Buffer), 1);
    }

    #[test]
    fn glyph_upload_uses_byte_alignment() {
        let mut ctx = ctx();
        let _text = TextRenderer::from_bitmaps(&mut ctx, glyph_set()).unwrap();
        let calls = ctx.gl().calls();
        let first_upload = calls.iter().position(|c| matches!(c, Call::TexImage2D { .. })).unwrap();
        let aligned = calls.iter().position(|c| *c == Call::UnpackAlignment(1)).unwrap();
        let restored = calls.iter().rposition(|c| *c == Call::UnpackAlignment(4)).unwrap();
        assert!(aligned < first_upload && first_upload < restored);
    }

    #[test]
    fn vertex_buffer_holds_one_quad() {
        let mut ctx = ctx();
        let text = TextRenderer::from_bitmaps(&mut ctx, glyph_set()).unwrap();
        assert_eq!(text.vertices.size(), 96);
        assert_eq!(text.vertices.usage(), BufferUsage::DynamicDraw);
        let record = ctx.gl().attribute(text.vertex_array.handle(), 0).unwrap();
        assert_eq!(record.attribute.components, 4);
        assert_eq!(record.attribute.stride, 16);
    }

    #[test]
    fn invalid_font_bytes_are_an_error() {
        let mut ctx = ctx();
        assert!(TextRenderer::from_font_bytes(&mut ctx, b"not a font", DEFAULT_PIXEL_SIZE).is_err());
        assert!(TextRenderer::from_file(&mut ctx, "/nonexistent/font.ttf", DEFAULT_PIXEL_SIZE).is_err());
    }

    // ── write ─────────────────────────────────────────────────────────────

    #[test]
    fn write_draws_visible_glyphs_and_advances() {
        let mut ctx = ctx();
        let program = program(&mut ctx);
        let text = TextRenderer::from_bitmaps(&mut ctx, glyph_set()).unwrap();
        ctx.gl_mut().clear_calls();

        let end = text.write(&mut ctx, &program, "A gA", 0.0, 0.0, 1.0, Vec3::new(1.0, 0.5, 0.0)).unwrap();

        assert_eq!(end, 21.0);
        assert_eq!(end, text.measure("A gA", 1.0));
        assert_eq!(ctx.gl().count_calls(|c| matches!(c, Call::DrawArrays { count: 6, .. })), 3);
        assert!(ctx.gl().calls().iter().any(|c| matches!(
            c,
            Call::SetUniform { value: UniformValue::Vec3([1.0, 0.5, 0.0]), .. }
        )));
        assert!(ctx.gl().calls().contains(&Call::ActiveTexture(GLYPH_UNIT)));
        // last quad is the second 'A' at pen x = 15
        let contents = ctx.gl().buffer_contents(text.vertices.handle()).unwrap();
        let first_x = f32::from_ne_bytes(contents[..4].try_into().unwrap());
        assert_eq!(first_x, 16.0);
        assert!(ctx.take_warnings().is_empty());
    }

    #[test]
    fn blending_is_restored() {
        let mut ctx = ctx();
        let program = program(&mut ctx);
        let text = TextRenderer::from_bitmaps(&mut ctx, glyph_set()).unwrap();

        text.write(&mut ctx, &program, "A", 0.0, 0.0, 1.0, Vec3::ONE).unwrap();
        assert!(!ctx.gl().blending());

        ctx.gl_mut().enable_alpha_blending();
        text.write(&mut ctx, &program, "A", 0.0, 0.0, 1.0, Vec3::ONE).unwrap();
        assert!(ctx.gl().blending());
    }

    #[test]
    fn write_leaves_no_bindings_behind() {
        let mut ctx = ctx();
        let program = program(&mut ctx);
        let text = TextRenderer::from_bitmaps(&mut ctx, glyph_set()).unwrap();

        text.write(&mut ctx, &program, "gA", 5.0, 5.0, 0.5, Vec3::ONE).unwrap();
        assert_eq!(ctx.bound_program(), None);
        assert_eq!(ctx.bound_vertex_array(), None);
        assert_eq!(ctx.bound_texture(GLYPH_UNIT, TextureTarget::Texture2D), None);
    }

    #[test]
    fn unknown_characters_warn_and_are_skipped() {
        let mut ctx = ctx();
        let program = program(&mut ctx);
        let text = TextRenderer::from_bitmaps(&mut ctx, glyph_set()).unwrap();
        ctx.gl_mut().clear_calls();

        let end = text.write(&mut ctx, &program, "AéA", 0.0, 0.0, 1.0, Vec3::ONE).unwrap();
        assert_eq!(end, 12.0);
        assert_eq!(ctx.gl().count_calls(|c| matches!(c, Call::DrawArrays { .. })), 2);
        assert_eq!(ctx.take_warnings(), vec![Warning::GlyphMissing { ch: 'é' }]);
    }
}
