use std::mem::{offset_of, size_of};
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glearn_engine::gl::{BufferUsage, DrawMode, GlApi, IndexType, VertexAttribute};
use glearn_engine::resource::{ElementBuffer, ShaderProgram, Texture, VertexArray, VertexBuffer};
use glearn_engine::{RenderContext, ResourceResult};

/// Interleaved vertex fed to slots 0..=3.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [VertexAttribute; 4] = {
        let stride = size_of::<Vertex>() as u32;
        [
            VertexAttribute::floats(0, 3, stride, offset_of!(Vertex, position) as u32),
            VertexAttribute::floats(1, 3, stride, offset_of!(Vertex, normal) as u32),
            VertexAttribute::floats(2, 2, stride, offset_of!(Vertex, tex_coords) as u32),
            VertexAttribute::floats(3, 3, stride, offset_of!(Vertex, tangent) as u32),
        ]
    };
}

/// Which material array a texture feeds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MaterialKind {
    Diffuse,
    Specular,
    Normal,
}

impl MaterialKind {
    fn uniform_array(self) -> &'static str {
        match self {
            MaterialKind::Diffuse => "uMaterial.diffuseMaps",
            MaterialKind::Specular => "uMaterial.specularMaps",
            MaterialKind::Normal => "uMaterial.normalMaps",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeshTexture {
    pub kind: MaterialKind,
    pub texture: Rc<Texture>,
}

/// Indexed triangle mesh with its material textures.
#[derive(Debug)]
pub struct Mesh {
    vertex_array: VertexArray,
    vertices: VertexBuffer,
    indices: ElementBuffer,
    index_count: u32,
    textures: Vec<MeshTexture>,
}

impl Mesh {
    pub fn new<G: GlApi>(
        ctx: &mut RenderContext<G>,
        vertices: &[Vertex],
        indices: &[u32],
        textures: Vec<MeshTexture>,
    ) -> ResourceResult<Self> {
        let vertex_buffer = VertexBuffer::from_slice(ctx, vertices, BufferUsage::StaticDraw)?;
        let mut vertex_array = VertexArray::new(ctx)?;
        vertex_array.bind(ctx);
        let index_buffer = ElementBuffer::from_slice(ctx, indices, BufferUsage::StaticDraw)?;
        // recorded by the vertex array only while it is bound
        index_buffer.bind(ctx);
        for attribute in &Vertex::ATTRIBUTES {
            vertex_array.configure_attribute_from(ctx, &vertex_buffer, attribute)?;
        }
        vertex_array.unbind(ctx);
        vertex_buffer.unbind(ctx);

        log::debug!(
            "mesh created ({} vertices, {} indices, {} textures)",
            vertices.len(),
            indices.len(),
            textures.len()
        );
        Ok(Self {
            vertex_array,
            vertices: vertex_buffer,
            indices: index_buffer,
            index_count: indices.len() as u32,
            textures,
        })
    }

    /// Binds texture `i` to unit `i`, points the matching material uniform at
    /// it, then draws every index as triangles.
    ///
    /// Nothing is drawn when a texture needs a unit the context does not have.
    pub fn draw<G: GlApi>(&self, ctx: &mut RenderContext<G>, program: &ShaderProgram) {
        let (mut diffuse, mut specular, mut normal) = (0u32, 0u32, 0u32);
        for (unit, entry) in self.textures.iter().enumerate() {
            let unit = unit as u32;
            let counter = match entry.kind {
                MaterialKind::Diffuse => &mut diffuse,
                MaterialKind::Specular => &mut specular,
                MaterialKind::Normal => &mut normal,
            };
            let name = format!("{}[{counter}]", entry.kind.uniform_array());
            *counter += 1;

            if !entry.texture.bind(ctx, unit) {
                return;
            }
            program.set_int(ctx, &name, unit as i32);
        }

        program.bind(ctx);
        self.vertex_array.bind(ctx);
        ctx.draw_elements(DrawMode::Triangles, self.index_count, IndexType::UnsignedInt, 0);
        self.vertex_array.unbind(ctx);
        program.unbind(ctx);
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn textures(&self) -> &[MeshTexture] {
        &self.textures
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn index_buffer(&self) -> &ElementBuffer {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glearn_engine::gl::mock::Call;
    use glearn_engine::gl::{
        ComponentType, InternalFormat, MockGl, PixelFormat, ResourceKind, ShaderStage, UniformValue,
    };
    use glearn_engine::resource::{RawTextureDesc, Sampling};
    use glearn_engine::{ContextConfig, Warning};

    fn ctx() -> RenderContext<MockGl> {
        RenderContext::new(MockGl::new(), ContextConfig::default())
    }

    fn quad() -> (Vec<Vertex>, Vec<u32>) {
        let corner = |x: f32, y: f32| Vertex { position: [x, y, 0.0], tex_coords: [x, y], ..Vertex::default() };
        let vertices = vec![corner(0.0, 0.0), corner(1.0, 0.0), corner(1.0, 1.0), corner(0.0, 1.0)];
        (vertices, vec![0, 1, 2, 0, 2, 3])
    }

    fn program(ctx: &mut RenderContext<MockGl>) -> ShaderProgram {
        ShaderProgram::from_sources(
            ctx,
            &[(ShaderStage::Vertex, "void main() {}"), (ShaderStage::Fragment, "void main() {}")],
        )
        .unwrap()
    }

    fn texture(ctx: &mut RenderContext<MockGl>) -> Rc<Texture> {
        let desc = RawTextureDesc {
            width: 1,
            height: 1,
            internal_format: InternalFormat::Rgba,
            format: PixelFormat::Rgba,
            component_type: ComponentType::UnsignedByte,
            sampling: Sampling::default(),
        };
        Rc::new(Texture::from_raw(ctx, &desc, Some(&[255; 4])).unwrap())
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(size_of::<Vertex>(), 44);
        let offsets: Vec<u32> = Vertex::ATTRIBUTES.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32]);
        assert!(Vertex::ATTRIBUTES.iter().all(|a| a.stride == 44));
    }

    #[test]
    fn vertex_array_records_buffers_and_slots() {
        let mut ctx = ctx();
        let (vertices, indices) = quad();
        let mesh = Mesh::new(&mut ctx, &vertices, &indices, Vec::new()).unwrap();

        let vao = mesh.vertex_array().handle();
        assert_eq!(ctx.gl().element_buffer_of(vao), Some(mesh.index_buffer().handle()));
        for slot in 0..4 {
            let record = ctx.gl().attribute(vao, slot).unwrap();
            assert_eq!(record.buffer, Some(mesh.vertex_buffer().handle()));
            assert!(record.enabled);
        }
        assert_eq!(ctx.bound_vertex_array(), None);
        assert_eq!(mesh.index_count(), 6);
    }

    #[test]
    fn creating_a_mesh_keeps_other_vertex_arrays_intact() {
        let mut ctx = ctx();
        let (vertices, indices) = quad();
        let first = Mesh::new(&mut ctx, &vertices, &indices, Vec::new()).unwrap();
        let second = Mesh::new(&mut ctx, &vertices, &indices, Vec::new()).unwrap();
        assert_eq!(
            ctx.gl().element_buffer_of(first.vertex_array().handle()),
            Some(first.index_buffer().handle())
        );
        assert_eq!(
            ctx.gl().element_buffer_of(second.vertex_array().handle()),
            Some(second.index_buffer().handle())
        );
    }

    #[test]
    fn empty_index_list_is_rejected() {
        let mut ctx = ctx();
        let (vertices, _) = quad();
        assert!(Mesh::new(&mut ctx, &vertices, &[], Vec::new()).is_err());
        ctx.maintain();
        assert_eq!(ctx.gl().live_count(), 0);
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn draw_binds_materials_in_order() {
        let mut ctx = ctx();
        for name in ["uMaterial.diffuseMaps[0]", "uMaterial.diffuseMaps[1]", "uMaterial.specularMaps[0]"] {
            ctx.gl_mut().declare_uniform(name);
        }
        let program = program(&mut ctx);
        let textures = vec![
            MeshTexture { kind: MaterialKind::Diffuse, texture: texture(&mut ctx) },
            MeshTexture { kind: MaterialKind::Specular, texture: texture(&mut ctx) },
            MeshTexture { kind: MaterialKind::Diffuse, texture: texture(&mut ctx) },
        ];
        let (vertices, indices) = quad();
        let mesh = Mesh::new(&mut ctx, &vertices, &indices, textures).unwrap();
        ctx.gl_mut().clear_calls();

        mesh.draw(&mut ctx, &program);

        let uniforms: Vec<_> = ctx
            .gl()
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::SetUniform { location, value, .. } => Some((location.0, *value)),
                _ => None,
            })
            .collect();
        // declared order: diffuse[0] = 0, diffuse[1] = 1, specular[0] = 2
        assert_eq!(
            uniforms,
            vec![(0, UniformValue::Int(0)), (2, UniformValue::Int(1)), (1, UniformValue::Int(2))]
        );
        for (unit, entry) in mesh.textures().iter().enumerate() {
            assert_eq!(
                ctx.bound_texture(unit as u32, entry.texture.target()),
                Some(entry.texture.handle())
            );
        }
        assert_eq!(
            ctx.gl().count_calls(|c| matches!(
                c,
                Call::DrawElements { mode: DrawMode::Triangles, count: 6, index_type: IndexType::UnsignedInt }
            )),
            1
        );
        assert_eq!(ctx.bound_program(), None);
        assert!(ctx.take_warnings().is_empty());
    }

    #[test]
    fn too_many_textures_abort_the_draw() {
        let mut ctx = RenderContext::new(MockGl::new(), ContextConfig { texture_units: 2, ..ContextConfig::default() });
        let program = program(&mut ctx);
        let shared = texture(&mut ctx);
        let textures = (0..3)
            .map(|_| MeshTexture { kind: MaterialKind::Normal, texture: Rc::clone(&shared) })
            .collect();
        let (vertices, indices) = quad();
        let mesh = Mesh::new(&mut ctx, &vertices, &indices, textures).unwrap();
        ctx.gl_mut().clear_calls();
        ctx.take_warnings();

        mesh.draw(&mut ctx, &program);

        assert_eq!(ctx.gl().count_calls(|c| matches!(c, Call::DrawElements { .. })), 0);
        assert!(ctx
            .take_warnings()
            .contains(&Warning::TextureUnitOutOfRange { unit: 2, units: 2 }));
    }

    #[test]
    fn dropping_a_mesh_releases_three_objects() {
        let mut ctx = ctx();
        let (vertices, indices) = quad();
        let mesh = Mesh::new(&mut ctx, &vertices, &indices, Vec::new()).unwrap();
        assert_eq!(ctx.gl().live_of(ResourceKind::Buffer), 2);
        drop(mesh);
        assert_eq!(ctx.maintain(), 3);
        assert_eq!(ctx.gl().live_count(), 0);
    }
}
