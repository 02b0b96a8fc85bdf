use std::path::{Path, PathBuf};

use anyhow::Context;
use glearn_engine::RenderContext;
use glearn_engine::gl::GlApi;
use glearn_engine::resource::ShaderProgram;

use crate::mesh::{MaterialKind, Mesh, MeshTexture, Vertex};
use crate::texture_cache::TextureCache;

/// Mesh data produced by an importer, with texture paths relative to the model file.
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<(MaterialKind, PathBuf)>,
}

/// A set of meshes loaded from one model file.
#[derive(Debug)]
pub struct Model {
    directory: PathBuf,
    meshes: Vec<Mesh>,
}

impl Model {
    /// Uploads every mesh of the model at `model_path`.
    ///
    /// Texture paths are resolved against the model's directory and shared
    /// through `cache`, so a file used by several meshes is uploaded once.
    pub fn from_imported<G: GlApi>(
        ctx: &mut RenderContext<G>,
        cache: &mut TextureCache,
        model_path: impl AsRef<Path>,
        imported: &[ImportedMesh],
    ) -> anyhow::Result<Self> {
        let model_path = model_path.as_ref();
        let directory = model_path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut meshes = Vec::with_capacity(imported.len());
        for (index, mesh) in imported.iter().enumerate() {
            let mut textures = Vec::with_capacity(mesh.textures.len());
            for (kind, relative) in &mesh.textures {
                let path = directory.join(relative);
                let texture = cache
                    .load(ctx, &path)
                    .with_context(|| format!("loading {kind:?} texture {}", path.display()))?;
                textures.push(MeshTexture { kind: *kind, texture });
            }
            let mesh = Mesh::new(ctx, &mesh.vertices, &mesh.indices, textures)
                .with_context(|| format!("uploading mesh {index} of {}", model_path.display()))?;
            meshes.push(mesh);
        }

        log::info!(
            "model {} loaded ({} meshes, {} cached textures)",
            model_path.display(),
            meshes.len(),
            cache.len()
        );
        Ok(Self { directory, meshes })
    }

    pub fn draw<G: GlApi>(&self, ctx: &mut RenderContext<G>, program: &ShaderProgram) {
        for mesh in &self.meshes {
            mesh.draw(ctx, program);
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Directory texture paths were resolved against.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
