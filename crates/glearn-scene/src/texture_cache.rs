use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glearn_engine::gl::GlApi;
use glearn_engine::resource::Texture;
use glearn_engine::{RenderContext, ResourceResult};

/// Image textures shared between meshes, keyed by the path they were loaded from.
///
/// A texture is decoded and uploaded once; later loads of the same path hand
/// out another reference. Native storage is released when the cache and every
/// mesh holding a reference have dropped theirs.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<PathBuf, Rc<Texture>>,
    gamma: bool,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads color data as sRGB.
    pub fn with_gamma(gamma: bool) -> Self {
        Self { entries: HashMap::new(), gamma }
    }

    pub fn load<G: GlApi>(&mut self, ctx: &mut RenderContext<G>, path: impl AsRef<Path>) -> ResourceResult<Rc<Texture>> {
        let path = path.as_ref();
        if let Some(texture) = self.entries.get(path) {
            log::trace!("texture cache hit for {}", path.display());
            return Ok(Rc::clone(texture));
        }
        let texture = Rc::new(Texture::from_image_file(ctx, path, self.gamma)?);
        self.entries.insert(path.to_path_buf(), Rc::clone(&texture));
        Ok(texture)
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Rc<Texture>> {
        self.entries.get(path.as_ref()).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops the cache's references; textures still used by meshes stay alive.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
