use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3, Vec4};

use crate::context::{GpuHandle, GpuResource, RenderContext, Warning};
use crate::error::{ResourceError, ResourceResult};
use crate::gl::{GlApi, RawHandle, ResourceKind, ShaderStage, UniformLocation, UniformValue};

/// Source files for each stage of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderFiles {
    pub vertex: PathBuf,
    pub geometry: Option<PathBuf>,
    pub fragment: PathBuf,
}

impl ShaderFiles {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self { vertex: vertex.into(), geometry: None, fragment: fragment.into() }
    }

    pub fn with_geometry(mut self, geometry: impl Into<PathBuf>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }
}

/// A linked GPU program. Stage objects do not outlive construction.
#[derive(Debug)]
pub struct ShaderProgram {
    handle: GpuHandle,
}

fn read_source(path: &Path) -> ResourceResult<String> {
    std::fs::read_to_string(path).map_err(|source| ResourceError::Io { path: path.to_path_buf(), source })
}

fn release_all<G: GlApi>(ctx: &mut RenderContext<G>, handles: Vec<GpuHandle>) {
    for handle in handles {
        ctx.release_now(handle);
    }
}

impl ShaderProgram {
    /// Reads every stage as opaque text, then compiles and links.
    pub fn from_files<G: GlApi>(ctx: &mut RenderContext<G>, files: &ShaderFiles) -> ResourceResult<Self> {
        let vertex = read_source(&files.vertex)?;
        let geometry = files.geometry.as_deref().map(read_source).transpose()?;
        let fragment = read_source(&files.fragment)?;

        let mut stages = vec![(ShaderStage::Vertex, vertex.as_str())];
        if let Some(geometry) = &geometry {
            stages.push((ShaderStage::Geometry, geometry.as_str()));
        }
        stages.push((ShaderStage::Fragment, fragment.as_str()));

        log::debug!("building program from {}", files.vertex.display());
        Self::from_sources(ctx, &stages)
    }

    /// Compiles each stage, links them and releases the stage objects.
    ///
    /// Vertex and fragment stages are required. On any failure every object
    /// created so far is released before the error is returned. Only this
    /// program's own objects are released; other scheduled releases wait for
    /// the next `maintain`.
    pub fn from_sources<G: GlApi>(
        ctx: &mut RenderContext<G>,
        stages: &[(ShaderStage, &str)],
    ) -> ResourceResult<Self> {
        let has = |wanted: ShaderStage| stages.iter().any(|(stage, _)| *stage == wanted);
        if !has(ShaderStage::Vertex) || !has(ShaderStage::Fragment) {
            return Err(ResourceError::ProgramLink {
                log: "a program needs both a vertex and a fragment stage".to_string(),
            });
        }

        let mut compiled = Vec::with_capacity(stages.len());
        for &(stage, source) in stages {
            let shader = match ctx.create_shader(stage) {
                Ok(shader) => shader,
                Err(err) => {
                    release_all(ctx, compiled);
                    return Err(err);
                }
            };
            if let Err(log) = ctx.gl_mut().compile_shader(shader.raw(), source) {
                compiled.push(shader);
                release_all(ctx, compiled);
                return Err(ResourceError::ShaderCompile { stage, log });
            }
            compiled.push(shader);
        }

        let program = match ctx.create(ResourceKind::Program) {
            Ok(program) => program,
            Err(err) => {
                release_all(ctx, compiled);
                return Err(err);
            }
        };
        let gl = ctx.gl_mut();
        for shader in &compiled {
            gl.attach_shader(program.raw(), shader.raw());
        }
        let linked = gl.link_program(program.raw());
        for shader in &compiled {
            gl.detach_shader(program.raw(), shader.raw());
        }
        release_all(ctx, compiled);

        let raw = program.raw();
        if let Err(log) = linked {
            ctx.release_now(program);
            return Err(ResourceError::ProgramLink { log });
        }

        log::debug!("program {raw} linked ({} stages)", stages.len());
        Ok(Self { handle: program })
    }

    pub fn bind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.use_program(Some(self.handle.raw()));
    }

    pub fn unbind<G: GlApi>(&self, ctx: &mut RenderContext<G>) {
        ctx.use_program(None);
    }

    pub fn set_int<G: GlApi>(&self, ctx: &mut RenderContext<G>, name: &str, value: i32) {
        self.set(ctx, name, UniformValue::Int(value));
    }

    pub fn set_float<G: GlApi>(&self, ctx: &mut RenderContext<G>, name: &str, value: f32) {
        self.set(ctx, name, UniformValue::Float(value));
    }

    pub fn set_vec3<G: GlApi>(&self, ctx: &mut RenderContext<G>, name: &str, value: Vec3) {
        self.set(ctx, name, UniformValue::Vec3(value.to_array()));
    }

    pub fn set_vec4<G: GlApi>(&self, ctx: &mut RenderContext<G>, name: &str, value: Vec4) {
        self.set(ctx, name, UniformValue::Vec4(value.to_array()));
    }

    pub fn set_mat4<G: GlApi>(&self, ctx: &mut RenderContext<G>, name: &str, value: &Mat4) {
        self.set(ctx, name, UniformValue::Mat4(value.to_cols_array()));
    }

    /// Points uniform block `name` at indexed binding `binding`.
    pub fn set_uniform_block_binding<G: GlApi>(&self, ctx: &mut RenderContext<G>, name: &str, binding: u32) {
        let raw = self.handle.raw();
        match ctx.gl().uniform_block_index(raw, name) {
            Some(index) => ctx.gl_mut().uniform_block_binding(raw, index, binding),
            None => ctx.warn(Warning::UniformBlockNotFound { program: raw, name: name.to_string() }),
        }
    }

    /// Resolves `name` (no caching) and writes `value`, making this program
    /// current first when it is not. Unknown names are a warning and a no-op.
    fn set<G: GlApi>(&self, ctx: &mut RenderContext<G>, name: &str, value: UniformValue) {
        let raw = self.handle.raw();
        let Some(location) = self.locate(ctx, name) else {
            ctx.warn(Warning::UniformNotFound { program: raw, name: name.to_string() });
            return;
        };
        if ctx.bound_program() != Some(raw) {
            ctx.use_program(Some(raw));
        }
        ctx.gl_mut().set_uniform(location, value);
    }

    fn locate<G: GlApi>(&self, ctx: &RenderContext<G>, name: &str) -> Option<UniformLocation> {
        ctx.gl().uniform_location(self.handle.raw(), name)
    }

    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle.raw()
    }
}

impl GpuResource for ShaderProgram {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Program
    }

    fn raw_handle(&self) -> RawHandle {
        self.handle.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use crate::gl::MockGl;
    use crate::gl::mock::Call;

    const VERT: &str = "#version 330 core\nvoid main() { gl_Position = vec4(0.0); }\n";
    const GEOM: &str = "#version 330 core\nlayout(points) in;\nvoid main() {}\n";
    const FRAG: &str = "#version 330 core\nout vec4 c;\nvoid main() { c = vec4(1.0); }\n";

    fn ctx() -> RenderContext<MockGl> {
        RenderContext::new(MockGl::new(), ContextConfig::default())
    }

    fn shader_handles(ctx: &RenderContext<MockGl>) -> Vec<RawHandle> {
        ctx.gl()
            .created()
            .iter()
            .filter(|(kind, _)| *kind == ResourceKind::Shader)
            .map(|(_, h)| *h)
            .collect()
    }

    // ── build ─────────────────────────────────────────────────────────────

    #[test]
    fn stages_are_released_right_after_linking() {
        let mut ctx = ctx();
        let program = ShaderProgram::from_sources(
            &mut ctx,
            &[(ShaderStage::Vertex, VERT), (ShaderStage::Fragment, FRAG)],
        )
        .unwrap();

        let shaders = shader_handles(&ctx);
        assert_eq!(shaders.len(), 2);
        for shader in shaders {
            assert_eq!(ctx.gl().release_count(shader), 1);
            assert!(ctx.gl().calls().contains(&Call::DetachShader { program: program.handle(), shader }));
        }
        assert!(ctx.gl().is_live(program.handle()));
        assert_eq!(ctx.pending_releases(), 0);
    }

    #[test]
    fn building_leaves_unrelated_releases_pending() {
        let mut ctx = ctx();
        let unrelated = ctx.create(ResourceKind::Buffer).unwrap();
        let unrelated_raw = unrelated.raw();
        drop(unrelated);

        ShaderProgram::from_sources(&mut ctx, &[(ShaderStage::Vertex, VERT), (ShaderStage::Fragment, FRAG)])
            .unwrap();
        assert_eq!(ctx.pending_releases(), 1);
        assert!(ctx.gl().is_live(unrelated_raw));
        for shader in shader_handles(&ctx) {
            assert_eq!(ctx.gl().release_count(shader), 1);
        }

        ctx.gl_mut().fail_link(true);
        let _ = ShaderProgram::from_sources(&mut ctx, &[(ShaderStage::Vertex, VERT), (ShaderStage::Fragment, FRAG)]);
        assert_eq!(ctx.pending_releases(), 1);
        assert!(ctx.gl().is_live(unrelated_raw));
    }

    #[test]
    fn geometry_stage_is_compiled_when_present() {
        let mut ctx = ctx();
        ShaderProgram::from_sources(
            &mut ctx,
            &[(ShaderStage::Vertex, VERT), (ShaderStage::Geometry, GEOM), (ShaderStage::Fragment, FRAG)],
        )
        .unwrap();
        let stages: Vec<_> = ctx
            .gl()
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::CreateShader(stage, _) => Some(*stage),
                _ => None,
            })
            .collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment]);
    }

    #[test]
    fn compile_failure_is_fatal_and_releases_stages() {
        let mut ctx = ctx();
        let broken = "#version 330 core\n#error broken on purpose\n";
        let err = ShaderProgram::from_sources(
            &mut ctx,
            &[(ShaderStage::Vertex, VERT), (ShaderStage::Fragment, broken)],
        )
        .unwrap_err();

        match err {
            ResourceError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.starts_with("0:2:"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ctx.gl().live_count(), 0);
        assert_eq!(ctx.gl().live_of(ResourceKind::Program), 0);
        assert!(ctx.gl().invalid_releases().is_empty());
    }

    #[test]
    fn link_failure_releases_program_and_stages() {
        let mut ctx = ctx();
        ctx.gl_mut().fail_link(true);
        let err = ShaderProgram::from_sources(
            &mut ctx,
            &[(ShaderStage::Vertex, VERT), (ShaderStage::Fragment, FRAG)],
        )
        .unwrap_err();

        assert!(matches!(err, ResourceError::ProgramLink { .. }));
        assert_eq!(ctx.gl().created().len(), 3);
        assert_eq!(ctx.gl().released().len(), 3);
        assert_eq!(ctx.gl().live_count(), 0);
    }

    #[test]
    fn missing_fragment_stage_is_rejected() {
        let mut ctx = ctx();
        let err = ShaderProgram::from_sources(&mut ctx, &[(ShaderStage::Vertex, VERT)]).unwrap_err();
        assert!(matches!(err, ResourceError::ProgramLink { .. }));
        assert!(ctx.gl().created().is_empty());
    }

    #[test]
    fn files_are_read_as_opaque_text() {
        let dir = std::env::temp_dir().join("glearn-shader-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("basic.vert"), VERT).unwrap();
        std::fs::write(dir.join("basic.frag"), FRAG).unwrap();

        let mut ctx = ctx();
        let files = ShaderFiles::new(dir.join("basic.vert"), dir.join("basic.frag"));
        assert!(ShaderProgram::from_files(&mut ctx, &files).is_ok());

        let missing = ShaderFiles::new(dir.join("basic.vert"), dir.join("basic.frag"))
            .with_geometry(dir.join("missing.geom"));
        let err = ShaderProgram::from_files(&mut ctx, &missing).unwrap_err();
        assert!(matches!(err, ResourceError::Io { ref path, .. } if path.ends_with("missing.geom")));
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    fn program(ctx: &mut RenderContext<MockGl>) -> ShaderProgram {
        ShaderProgram::from_sources(ctx, &[(ShaderStage::Vertex, VERT), (ShaderStage::Fragment, FRAG)]).unwrap()
    }

    #[test]
    fn setter_makes_program_current() {
        let mut ctx = ctx();
        ctx.gl_mut().declare_uniform("uModel");
        let a = program(&mut ctx);
        let b = program(&mut ctx);
        b.bind(&mut ctx);

        a.set_mat4(&mut ctx, "uModel", &Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));

        assert_eq!(ctx.bound_program(), Some(a.handle()));
        let written = ctx.gl().calls().iter().rev().find_map(|c| match c {
            Call::SetUniform { program, value: UniformValue::Mat4(m), .. } => Some((*program, *m)),
            _ => None,
        });
        let (target, cols) = written.unwrap();
        assert_eq!(target, Some(a.handle()));
        // column-major: translation lives in the last column
        assert_eq!(&cols[12..15], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn unknown_uniform_warns_and_skips() {
        let mut ctx = ctx();
        let p = program(&mut ctx);
        ctx.gl_mut().clear_calls();

        p.set_float(&mut ctx, "uMissing", 1.0);
        p.set_uniform_block_binding(&mut ctx, "Matrices", 0);

        assert_eq!(ctx.gl().count_calls(|c| matches!(c, Call::SetUniform { .. })), 0);
        assert_eq!(ctx.gl().count_calls(|c| matches!(c, Call::UniformBlockBinding { .. })), 0);
        assert_eq!(
            ctx.take_warnings(),
            vec![
                Warning::UniformNotFound { program: p.handle(), name: "uMissing".into() },
                Warning::UniformBlockNotFound { program: p.handle(), name: "Matrices".into() },
            ]
        );
    }

    #[test]
    fn scalar_and_vector_setters_write_values() {
        let mut ctx = ctx();
        for name in ["uCount", "uScale", "uColor", "uTint"] {
            ctx.gl_mut().declare_uniform(name);
        }
        let p = program(&mut ctx);
        ctx.gl_mut().clear_calls();

        p.set_int(&mut ctx, "uCount", 3);
        p.set_float(&mut ctx, "uScale", 0.5);
        p.set_vec3(&mut ctx, "uColor", Vec3::new(1.0, 0.5, 0.25));
        p.set_vec4(&mut ctx, "uTint", Vec4::ONE);

        let values: Vec<_> = ctx
            .gl()
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::SetUniform { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(
            values,
            vec![
                UniformValue::Int(3),
                UniformValue::Float(0.5),
                UniformValue::Vec3([1.0, 0.5, 0.25]),
                UniformValue::Vec4([1.0; 4]),
            ]
        );
    }

    #[test]
    fn block_binding_resolves_index() {
        let mut ctx = ctx();
        ctx.gl_mut().declare_uniform_block("Matrices");
        let p = program(&mut ctx);
        p.set_uniform_block_binding(&mut ctx, "Matrices", 2);
        assert!(ctx.gl().calls().contains(&Call::UniformBlockBinding {
            program: p.handle(),
            block_index: 0,
            binding: 2,
        }));
    }

    #[test]
    fn destroy_releases_exactly_once() {
        let mut ctx = ctx();
        let p = program(&mut ctx);
        let raw = p.handle();
        p.bind(&mut ctx);
        ctx.destroy(p);
        assert_eq!(ctx.gl().release_count(raw), 1);
        assert_eq!(ctx.bound_program(), None);
        assert!(ctx.gl().invalid_releases().is_empty());
    }
}
