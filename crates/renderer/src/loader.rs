use shaderfetch::{fetch_pair, ShaderLocations, SourceFetcher};
use tracing::{debug, error};

use crate::backend::{
    BlendMode, ProgramLayout, RenderBackend, ShaderStage, VertexLayout, POSITION_ATTRIBUTE,
};
use crate::driver::SetupError;

/// One oversized triangle covering the whole clip-space viewport.
pub const FULLSCREEN_TRIANGLE: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];

/// Vertices drawn per frame.
pub const FULLSCREEN_VERTEX_COUNT: u32 = 3;

/// Linked cloud program, ready to draw.
#[derive(Debug)]
pub struct ProgramHandle<P> {
    program: P,
    layout: ProgramLayout,
}

impl<P> ProgramHandle<P> {
    pub fn program(&self) -> &P {
        &self.program
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }
}

pub fn cloud_program_layout() -> ProgramLayout {
    ProgramLayout {
        position: POSITION_ATTRIBUTE,
        vertex: VertexLayout::packed_vec2(),
        blend: BlendMode::Alpha,
    }
}

/// Fetches, compiles and links the cloud program, then binds the full-screen
/// triangle and activates the program.
pub fn load_program<B, F>(
    backend: &mut B,
    fetcher: &F,
    locations: &ShaderLocations,
) -> Result<ProgramHandle<B::Program>, SetupError>
where
    B: RenderBackend,
    F: SourceFetcher + ?Sized,
{
    let sources = fetch_pair(fetcher, locations)?;
    debug!(
        vertex_bytes = sources.vertex.len(),
        fragment_bytes = sources.fragment.len(),
        "shader sources fetched"
    );

    let vertex = compile_stage(backend, ShaderStage::Vertex, &sources.vertex)?;
    let fragment = match compile_stage(backend, ShaderStage::Fragment, &sources.fragment) {
        Ok(shader) => shader,
        Err(err) => {
            backend.delete_shader(vertex);
            return Err(err);
        }
    };

    let layout = cloud_program_layout();
    let linked = backend.link_program(&vertex, &fragment, &layout);
    backend.delete_shader(vertex);
    backend.delete_shader(fragment);
    let program = linked.map_err(|log| {
        error!(%log, "program link error");
        SetupError::Link { log }
    })?;

    backend.use_program(&program);
    backend.upload_vertices(&FULLSCREEN_TRIANGLE);
    debug!("cloud program linked");

    Ok(ProgramHandle { program, layout })
}

fn compile_stage<B: RenderBackend>(
    backend: &mut B,
    stage: ShaderStage,
    source: &str,
) -> Result<B::Shader, SetupError> {
    backend.compile_shader(stage, source).map_err(|log| {
        error!(%stage, %log, "shader compile error");
        SetupError::Compile { stage, log }
    })
}
