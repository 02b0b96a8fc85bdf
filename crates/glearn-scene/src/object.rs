use std::rc::Rc;

use glam::{Mat4, Vec3};
use glearn_engine::RenderContext;
use glearn_engine::gl::GlApi;
use glearn_engine::resource::ShaderProgram;

use crate::mesh::Mesh;

pub const MODEL_UNIFORM: &str = "uModelMatrix";
pub const VIEW_UNIFORM: &str = "uViewMatrix";
pub const PROJECTION_UNIFORM: &str = "uProjectionMatrix";

/// A mesh placed in the world: its geometry, the program that draws it and a
/// model matrix.
///
/// Several objects may share one program.
#[derive(Debug)]
pub struct Object {
    program: Rc<ShaderProgram>,
    mesh: Mesh,
    model: Mat4,
}

impl Object {
    /// Placed at the origin (identity model matrix).
    pub fn new(program: Rc<ShaderProgram>, mesh: Mesh) -> Self {
        Self::with_model(program, mesh, Mat4::IDENTITY)
    }

    pub fn with_model(program: Rc<ShaderProgram>, mesh: Mesh, model: Mat4) -> Self {
        Self { program, mesh, model }
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    /// Transforms below compose in object space, like `model * transform`.
    pub fn translate(&mut self, offset: Vec3) {
        self.model *= Mat4::from_translation(offset);
    }

    /// `angle` in radians around `axis`. A zero axis is ignored.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        if let Some(axis) = axis.try_normalize() {
            self.model *= Mat4::from_axis_angle(axis, angle);
        }
    }

    pub fn scale(&mut self, factors: Vec3) {
        self.model *= Mat4::from_scale(factors);
    }

    /// Uploads the model, view and projection matrices, then draws the mesh.
    ///
    /// A matrix uniform the program does not declare is reported on the
    /// context's warning channel and the draw still happens.
    pub fn draw<G: GlApi>(&self, ctx: &mut RenderContext<G>, view: &Mat4, projection: &Mat4) {
        self.program.set_mat4(ctx, MODEL_UNIFORM, &self.model);
        self.program.set_mat4(ctx, VIEW_UNIFORM, view);
        self.program.set_mat4(ctx, PROJECTION_UNIFORM, projection);
        self.mesh.draw(ctx, &self.program);
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}
