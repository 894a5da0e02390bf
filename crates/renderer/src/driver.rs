//! Frame driver: owns the whole cloud layer and advances it once per
//! display refresh.
//!
//! `CloudBackground::setup` performs the one-shot work (layer style, program
//! load, initial resize) and returns the driver idle. `start` registers the
//! first refresh callback; afterwards the host calls `step` on every refresh
//! and the driver asks for the next one itself, whether or not the frame was
//! drawn.

use cloudconfig::CloudConfig;
use shaderfetch::{FetchError, ShaderLocations, SourceFetcher};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::backend::{RenderBackend, ShaderStage};
use crate::loader::{load_program, ProgramHandle, FULLSCREEN_VERTEX_COUNT};
use crate::runtime::Clock;
use crate::surface::{SurfaceManager, ViewportMetrics};
use crate::uniforms::FrameUniforms;

/// Reasons setup can abandon the background. None of them are retried.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no drawing context available")]
    NoContext,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{stage} shader compile error: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program link error: {log}")]
    Link { log: String },
}

/// Something that can invoke the driver again on the next display refresh.
pub trait RefreshScheduler {
    fn request_frame(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// Arrived before the frame interval elapsed; nothing was drawn.
    Skipped,
    /// The driver has not been started.
    Idle,
}

/// Accepts frames no closer together than `min_interval` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGate {
    min_interval: Option<f64>,
    last_accepted: Option<f64>,
}

impl FrameGate {
    pub fn new(min_interval: Option<f64>) -> Self {
        Self {
            min_interval,
            last_accepted: None,
        }
    }

    pub fn should_render(&self, t: f64) -> bool {
        match (self.min_interval, self.last_accepted) {
            (Some(interval), Some(last)) => t - last >= interval,
            _ => true,
        }
    }

    pub fn accept(&mut self, t: f64) {
        self.last_accepted = Some(t);
    }

    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }
}

/// Transparent clear colour used before every draw.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

pub struct CloudBackground<B: RenderBackend, C: Clock> {
    config: CloudConfig,
    backend: B,
    clock: C,
    surface: SurfaceManager,
    program: ProgramHandle<B::Program>,
    gate: FrameGate,
    start_millis: f64,
    state: DriverState,
}

impl<B: RenderBackend, C: Clock> CloudBackground<B, C> {
    /// Builds the layer on `backend`. A missing backend aborts quietly.
    pub fn setup<F>(
        config: CloudConfig,
        backend: Option<B>,
        fetcher: &F,
        locations: &ShaderLocations,
        clock: C,
        viewport: ViewportMetrics,
    ) -> Result<Self, SetupError>
    where
        F: SourceFetcher + ?Sized,
    {
        let Some(mut backend) = backend else {
            debug!(canvas = %config.canvas_id, "no drawing context; cloud layer disabled");
            return Err(SetupError::NoContext);
        };

        let mut surface = SurfaceManager::new(config.target_dpr, config.render_scale);
        surface.apply_style(&mut backend);
        surface.resize(&mut backend, viewport);

        let program = load_program(&mut backend, fetcher, locations)?;
        let start_millis = clock.now_millis();
        let gate = FrameGate::new(config.min_frame_time());

        info!(
            canvas = %config.canvas_id,
            width = backend.backing_store_size().0,
            height = backend.backing_store_size().1,
            target_fps = config.target_fps,
            "cloud layer ready"
        );

        Ok(Self {
            config,
            backend,
            clock,
            surface,
            program,
            gate,
            start_millis,
            state: DriverState::Idle,
        })
    }

    /// Registers the first refresh callback. Later calls do nothing.
    pub fn start<R: RefreshScheduler + ?Sized>(&mut self, refresh: &mut R) {
        if self.state == DriverState::Running {
            return;
        }
        self.state = DriverState::Running;
        refresh.request_frame();
    }

    /// Handles one refresh callback.
    pub fn step<R: RefreshScheduler + ?Sized>(
        &mut self,
        viewport: ViewportMetrics,
        refresh: &mut R,
    ) -> FrameOutcome {
        if self.state == DriverState::Idle {
            return FrameOutcome::Idle;
        }

        self.surface.resize(&mut self.backend, viewport);
        let t = self.elapsed_seconds();

        if !self.gate.should_render(t) {
            trace!(t, "frame skipped");
            refresh.request_frame();
            return FrameOutcome::Skipped;
        }

        self.backend.clear(CLEAR_COLOR);
        self.backend.use_program(self.program.program());
        let uniforms = FrameUniforms::compute(&self.config, t, self.backend.backing_store_size());
        uniforms.upload(&mut self.backend);
        self.backend.draw_triangles(0, FULLSCREEN_VERTEX_COUNT);
        self.gate.accept(t);
        refresh.request_frame();
        FrameOutcome::Drawn
    }

    /// Resize notification from the host.
    pub fn resize(&mut self, viewport: ViewportMetrics) -> bool {
        self.surface.resize(&mut self.backend, viewport)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        (self.clock.now_millis() - self.start_millis) / 1000.0
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn frame_gate(&self) -> &FrameGate {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use shaderfetch::{FetchedText, FRAGMENT_SHADER_PATH, VERTEX_SHADER_PATH};

    use super::*;
    use crate::backend::{Uniform, UniformValue};
    use crate::runtime::ManualClock;
    use crate::stub::{MemoryFetcher, StubBackend, StubCall};

    #[derive(Default)]
    struct CountingScheduler {
        requests: usize,
    }

    impl RefreshScheduler for CountingScheduler {
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }

    fn viewport() -> ViewportMetrics {
        ViewportMetrics::new(1024.0, 768.0, 2.0)
    }

    type StubDriver = CloudBackground<StubBackend, ManualClock>;

    fn running(config: CloudConfig) -> (StubDriver, ManualClock, CountingScheduler) {
        let clock = ManualClock::new(1_000.0);
        let mut driver = CloudBackground::setup(
            config,
            Some(StubBackend::default()),
            &MemoryFetcher::cloud_sources(),
            &ShaderLocations::default(),
            clock.clone(),
            viewport(),
        )
        .expect("setup succeeds");
        let mut scheduler = CountingScheduler::default();
        driver.start(&mut scheduler);
        driver.backend_mut().clear_calls();
        (driver, clock, scheduler)
    }

    fn setup_with(
        backend: Option<StubBackend>,
        fetcher: &MemoryFetcher,
    ) -> Result<StubDriver, SetupError> {
        CloudBackground::setup(
            CloudConfig::default(),
            backend,
            fetcher,
            &ShaderLocations::default(),
            ManualClock::default(),
            viewport(),
        )
    }

    #[test]
    fn capped_frame_rate_accepts_spaced_frames_only() {
        let config = CloudConfig {
            target_fps: 30.0,
            ..CloudConfig::default()
        };
        let (mut driver, clock, mut scheduler) = running(config);
        let start = scheduler.requests;

        let mut drawn = Vec::new();
        for t in [0.0, 0.01, 0.02, 0.034, 0.05] {
            clock.set_millis(1_000.0 + t * 1000.0);
            if driver.step(viewport(), &mut scheduler) == FrameOutcome::Drawn {
                drawn.push(t);
            }
        }

        assert_eq!(drawn, vec![0.0, 0.034]);
        assert_eq!(driver.backend().draws(), 2);
        assert_eq!(scheduler.requests - start, 5);
        assert_eq!(driver.config().min_frame_time(), Some(1.0 / 30.0));
        let last = driver.frame_gate().last_accepted().expect("a frame was accepted");
        assert!((last - 0.034).abs() < 1e-9);
    }

    #[test]
    fn uncapped_draws_every_frame() {
        let (mut driver, clock, mut scheduler) = running(CloudConfig::default());
        for _ in 0..10 {
            clock.advance_millis(1.0);
            assert_eq!(driver.step(viewport(), &mut scheduler), FrameOutcome::Drawn);
        }
        assert_eq!(driver.backend().draws(), 10);
    }

    #[test]
    fn accepted_frames_are_never_closer_than_interval() {
        let config = CloudConfig {
            target_fps: 24.0,
            ..CloudConfig::default()
        };
        let (mut driver, clock, mut scheduler) = running(config);
        let mut accepted: Vec<f64> = Vec::new();
        for _ in 0..500 {
            clock.advance_millis(7.0);
            if driver.step(viewport(), &mut scheduler) == FrameOutcome::Drawn {
                accepted.push(driver.elapsed_seconds());
            }
        }
        assert!(accepted.len() > 10);
        for pair in accepted.windows(2) {
            assert!(pair[1] - pair[0] >= 1.0 / 24.0);
        }
    }

    #[test]
    fn frame_clears_activates_then_uploads_and_draws() {
        let (mut driver, clock, mut scheduler) = running(CloudConfig::default());
        clock.set_millis(3_500.0);
        driver.step(viewport(), &mut scheduler);

        let calls = &driver.backend().calls;
        assert_eq!(calls[0], StubCall::Clear([0.0; 4]));
        assert!(matches!(calls[1], StubCall::UseProgram(_)));
        let uploads = &calls[2..calls.len() - 1];
        assert_eq!(uploads.len(), Uniform::ALL.len());
        assert!(uploads.iter().all(|call| matches!(call, StubCall::SetUniform(..))));
        assert_eq!(calls.last(), Some(&StubCall::Draw(0, 3)));

        let backend = driver.backend();
        assert_eq!(backend.last_uniform(Uniform::Time), Some(UniformValue::Float(2.5)));
        assert_eq!(
            backend.last_uniform(Uniform::Resolution),
            Some(UniformValue::Vec2([675.0, 506.0]))
        );
    }

    #[test]
    fn zero_wind_direction_uploads_speed_along_x() {
        let config = CloudConfig {
            wind_dir: [0.0, 0.0],
            wind_speed: 0.01,
            ..CloudConfig::default()
        };
        let (mut driver, _clock, mut scheduler) = running(config);
        driver.step(viewport(), &mut scheduler);
        assert_eq!(
            driver.backend().last_uniform(Uniform::Wind),
            Some(UniformValue::Vec2([0.01, 0.0]))
        );
    }

    #[test]
    fn step_resizes_before_drawing() {
        let (mut driver, _clock, mut scheduler) = running(CloudConfig::default());
        driver.step(ViewportMetrics::new(800.0, 600.0, 1.0), &mut scheduler);
        let calls = &driver.backend().calls;
        assert_eq!(calls[0], StubCall::BackingStore(528, 396));
        assert_eq!(
            driver.backend().last_uniform(Uniform::Resolution),
            Some(UniformValue::Vec2([528.0, 396.0]))
        );
    }

    #[test]
    fn idle_driver_does_not_draw() {
        let mut driver = setup_with(Some(StubBackend::default()), &MemoryFetcher::cloud_sources())
            .expect("setup succeeds");
        let mut scheduler = CountingScheduler::default();
        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.step(viewport(), &mut scheduler), FrameOutcome::Idle);
        assert_eq!(scheduler.requests, 0);

        driver.start(&mut scheduler);
        driver.start(&mut scheduler);
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(scheduler.requests, 1);
    }

    #[test]
    fn setup_applies_style_and_initial_size() {
        let driver = setup_with(Some(StubBackend::default()), &MemoryFetcher::cloud_sources())
            .expect("setup succeeds");
        let calls = &driver.backend().calls;
        assert!(matches!(calls[0], StubCall::LayerStyle(_)));
        assert_eq!(calls[1], StubCall::BackingStore(675, 506));
        assert_eq!(driver.backend().draws(), 0);
    }

    #[test]
    fn setup_aborts_without_context() {
        let err = setup_with(None, &MemoryFetcher::cloud_sources()).err();
        assert!(matches!(err, Some(SetupError::NoContext)));
    }

    #[test]
    fn setup_aborts_on_missing_resource() {
        let fetcher =
            MemoryFetcher::with(&[(FRAGMENT_SHADER_PATH, FetchedText::ok("void main() {}"))]);
        let err = setup_with(Some(StubBackend::default()), &fetcher).err();
        assert!(matches!(
            err,
            Some(SetupError::Fetch(FetchError::Status {
                vertex: 404,
                fragment: 200
            }))
        ));
    }

    #[test]
    fn setup_aborts_on_server_error() {
        let fetcher = MemoryFetcher::with(&[
            (VERTEX_SHADER_PATH, FetchedText::with_status(500)),
            (FRAGMENT_SHADER_PATH, FetchedText::ok("void main() {}")),
        ]);
        assert!(setup_with(Some(StubBackend::default()), &fetcher).is_err());
    }

    #[test]
    fn setup_aborts_on_compile_and_link_failures() {
        let backend = StubBackend::failing_compile(ShaderStage::Vertex);
        let err = setup_with(Some(backend), &MemoryFetcher::cloud_sources()).err();
        assert!(matches!(err, Some(SetupError::Compile { .. })));

        let backend = StubBackend::failing_link();
        let err = setup_with(Some(backend), &MemoryFetcher::cloud_sources()).err();
        assert!(matches!(err, Some(SetupError::Link { .. })));
    }

    #[test]
    fn frame_gate_without_interval_accepts_everything() {
        let mut gate = FrameGate::new(None);
        for t in [0.0, 0.0, 0.001] {
            assert!(gate.should_render(t));
            gate.accept(t);
        }
        assert_eq!(gate.last_accepted(), Some(0.001));
    }
}
