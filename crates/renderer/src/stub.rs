//! Recording backend and in-memory fetcher used by unit tests.

use std::collections::HashMap;

use shaderfetch::{FetchError, FetchedText, SourceFetcher, FRAGMENT_SHADER_PATH, VERTEX_SHADER_PATH};

use crate::backend::{LayerStyle, ProgramLayout, RenderBackend, ShaderStage, Uniform, UniformValue};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StubCall {
    LayerStyle(LayerStyle),
    BackingStore(u32, u32),
    DisplaySize(f64, f64),
    Viewport(u32, u32, u32, u32),
    Compile(ShaderStage),
    DeleteShader(u32),
    Link(ProgramLayout),
    UploadVertices(Vec<f32>),
    UseProgram(u32),
    Clear([f32; 4]),
    SetUniform(Uniform, UniformValue),
    Draw(u32, u32),
}

#[derive(Debug, Default)]
pub(crate) struct StubBackend {
    pub calls: Vec<StubCall>,
    pub backing_store: (u32, u32),
    pub fail_compile: Option<ShaderStage>,
    pub fail_link: bool,
    next_id: u32,
}

impl StubBackend {
    /// Backend whose `stage` compile reports a syntax error.
    pub fn failing_compile(stage: ShaderStage) -> Self {
        Self {
            fail_compile: Some(stage),
            ..Self::default()
        }
    }

    pub fn failing_link() -> Self {
        Self {
            fail_link: true,
            ..Self::default()
        }
    }

    pub fn draws(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, StubCall::Draw(..)))
            .count()
    }

    pub fn last_uniform(&self, uniform: Uniform) -> Option<UniformValue> {
        self.calls.iter().rev().find_map(|call| match call {
            StubCall::SetUniform(name, value) if *name == uniform => Some(*value),
            _ => None,
        })
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderBackend for StubBackend {
    type Shader = u32;
    type Program = u32;

    fn apply_layer_style(&mut self, style: &LayerStyle) {
        self.calls.push(StubCall::LayerStyle(*style));
    }

    fn backing_store_size(&self) -> (u32, u32) {
        self.backing_store
    }

    fn set_backing_store_size(&mut self, width: u32, height: u32) {
        self.backing_store = (width, height);
        self.calls.push(StubCall::BackingStore(width, height));
    }

    fn set_display_size(&mut self, width: f64, height: f64) {
        self.calls.push(StubCall::DisplaySize(width, height));
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.calls.push(StubCall::Viewport(x, y, width, height));
    }

    fn compile_shader(&mut self, stage: ShaderStage, _source: &str) -> Result<u32, String> {
        self.calls.push(StubCall::Compile(stage));
        if self.fail_compile == Some(stage) {
            return Err(format!("ERROR: 0:1: '{stage}' : syntax error"));
        }
        Ok(self.allocate())
    }

    fn delete_shader(&mut self, shader: u32) {
        self.calls.push(StubCall::DeleteShader(shader));
    }

    fn link_program(
        &mut self,
        _vertex: &u32,
        _fragment: &u32,
        layout: &ProgramLayout,
    ) -> Result<u32, String> {
        self.calls.push(StubCall::Link(*layout));
        if self.fail_link {
            return Err("varying v_uv not written by vertex shader".into());
        }
        Ok(self.allocate())
    }

    fn upload_vertices(&mut self, vertices: &[f32]) {
        self.calls.push(StubCall::UploadVertices(vertices.to_vec()));
    }

    fn use_program(&mut self, program: &u32) {
        self.calls.push(StubCall::UseProgram(*program));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(StubCall::Clear(color));
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) {
        self.calls.push(StubCall::SetUniform(uniform, value));
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.calls.push(StubCall::Draw(first, count));
    }
}

/// Serves fixed responses; unknown paths answer 404.
pub(crate) struct MemoryFetcher {
    entries: HashMap<String, FetchedText>,
}

impl MemoryFetcher {
    pub fn cloud_sources() -> Self {
        Self::with(&[
            (VERTEX_SHADER_PATH, FetchedText::ok("attribute vec2 a_pos;")),
            (FRAGMENT_SHADER_PATH, FetchedText::ok("void main() {}")),
        ])
    }

    pub fn with(entries: &[(&str, FetchedText)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(path, text)| (path.to_string(), text.clone()))
                .collect(),
        }
    }
}

impl SourceFetcher for MemoryFetcher {
    fn fetch(&self, path: &str) -> Result<FetchedText, FetchError> {
        Ok(self
            .entries
            .get(path)
            .cloned()
            .unwrap_or_else(|| FetchedText::with_status(404)))
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
