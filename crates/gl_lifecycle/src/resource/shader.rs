//! Shader programs built from a vertex and a fragment stage

use crate::backend::GpuApi;
use crate::error::{CompileStage, GfxError, GfxResult, ShaderCompileError};

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

impl ShaderStage {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => 0x8B31,
            Self::Fragment => 0x8B30,
        }
    }

    const fn compile_stage(self) -> CompileStage {
        match self {
            Self::Vertex => CompileStage::Vertex,
            Self::Fragment => CompileStage::Fragment,
        }
    }
}

/// Linked program together with the two shader objects it was built from
#[derive(Debug, PartialEq, Eq)]
pub struct ShaderProgram {
    program: u32,
    vertex: u32,
    fragment: u32,
}

impl ShaderProgram {
    /// Compile both stages and link them
    ///
    /// On failure every object created so far is deleted again and the
    /// driver's info log is returned in the error.
    pub(crate) fn compile<G: GpuApi>(gpu: &mut G, vertex_source: &str, fragment_source: &str) -> GfxResult<Self> {
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(GfxError::invalid_argument("shader source is empty"));
        }

        let vertex = compile_stage(gpu, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile_stage(gpu, ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                gpu.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = gpu.create_program();
        if program == 0 {
            gpu.delete_shader(vertex);
            gpu.delete_shader(fragment);
            return Err(GfxError::NativeCallFailed("glCreateProgram returned no name".to_string()));
        }

        gpu.attach_shader(program, vertex);
        gpu.attach_shader(program, fragment);
        if let Err(log) = gpu.link_program(program) {
            gpu.delete_shader(vertex);
            gpu.delete_shader(fragment);
            gpu.delete_program(program);
            return Err(ShaderCompileError::new(CompileStage::Link, log).into());
        }

        log::debug!("Linked shader program {}", program);
        Ok(Self {
            program,
            vertex,
            fragment,
        })
    }

    /// Native program name
    pub fn native_handle(&self) -> u32 {
        self.program
    }

    pub(crate) fn use_program<G: GpuApi>(&self, gpu: &mut G) {
        gpu.use_program(self.program);
    }

    /// Clears the active program, whichever it is
    pub(crate) fn stop_use<G: GpuApi>(&self, gpu: &mut G) {
        gpu.use_program(0);
    }

    pub(crate) fn uniform_location<G: GpuApi>(&self, gpu: &mut G, name: &str) -> GfxResult<i32> {
        if name.is_empty() || name.contains('\0') {
            return Err(GfxError::invalid_argument(format!("illegal uniform name {name:?}")));
        }
        Ok(gpu.uniform_location(self.program, name))
    }

    pub(crate) fn release<G: GpuApi>(&mut self, gpu: &mut G) {
        gpu.detach_shader(self.program, self.vertex);
        gpu.detach_shader(self.program, self.fragment);
        gpu.delete_shader(self.vertex);
        gpu.delete_shader(self.fragment);
        gpu.delete_program(self.program);
    }
}

fn compile_stage<G: GpuApi>(gpu: &mut G, stage: ShaderStage, source: &str) -> GfxResult<u32> {
    let shader = gpu.create_shader(stage);
    if shader == 0 {
        return Err(GfxError::NativeCallFailed(format!("glCreateShader({stage:?}) returned no name")));
    }
    if let Err(log) = gpu.compile_shader(shader, source) {
        gpu.delete_shader(shader);
        return Err(ShaderCompileError::new(stage.compile_stage(), log).into());
    }
    Ok(shader)
}
