use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, trace};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::driver::{CloudBackground, RefreshScheduler, SetupError};
use crate::gpu::GpuBackend;
use crate::runtime::SystemClock;
use crate::surface::ViewportMetrics;
use crate::types::RendererConfig;

/// Used when the monitor does not report its refresh rate.
const FALLBACK_REFRESH_HZ: f64 = 60.0;

/// Owns the event loop that hosts the cloud layer.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the layer window and animates it until the window closes.
    ///
    /// A machine without a usable GPU leaves the layer disabled and returns
    /// `Ok`; any other setup failure is returned after it has been logged.
    pub fn run(self) -> Result<()> {
        let config = self.config;
        let event_loop = EventLoop::new().context("failed to initialize event loop")?;

        let mut builder = WindowBuilder::new()
            .with_title(config.layer_name())
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false);
        #[cfg(target_os = "linux")]
        {
            use winit::platform::wayland::WindowBuilderExtWayland;
            builder =
                WindowBuilderExtWayland::with_name(builder, "cloudpaper", config.layer_name());
        }
        if let Some(monitor) = event_loop.primary_monitor() {
            builder = builder.with_inner_size(monitor.size());
        }
        let window = Arc::new(
            builder
                .build(&event_loop)
                .map_err(|err| anyhow!("failed to create layer window: {err}"))?,
        );

        let fetcher = config.assets.fetcher()?;
        let backend = match GpuBackend::new(window.clone()) {
            Ok(backend) => Some(backend),
            Err(err) => {
                debug!(error = %err, "GPU backend unavailable");
                None
            }
        };

        let mut driver = match CloudBackground::setup(
            config.cloud.clone(),
            backend,
            fetcher.as_ref(),
            &config.locations,
            SystemClock::new(),
            viewport_metrics(&window),
        ) {
            Ok(driver) => driver,
            Err(SetupError::NoContext) => return Ok(()),
            Err(err) => return Err(err).context("cloud layer setup failed"),
        };

        let mut ticker = DisplayTicker::new(refresh_interval(&window));
        info!(interval_ms = ticker.interval.as_secs_f64() * 1000.0, "starting frame loop");
        driver.start(&mut ticker);

        event_loop
            .run(move |event, elwt| match event {
                Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::Resized(size) => {
                        driver.backend_mut().resize_swapchain(size);
                        driver.resize(viewport_metrics(&window));
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        driver.resize(viewport_metrics(&window));
                    }
                    WindowEvent::RedrawRequested => {
                        let outcome = driver.step(viewport_metrics(&window), &mut ticker);
                        trace!(?outcome, "frame");
                    }
                    _ => {}
                },
                Event::AboutToWait => match ticker.poll(Instant::now()) {
                    Tick::Fire => {
                        window.request_redraw();
                        elwt.set_control_flow(ControlFlow::Wait);
                    }
                    Tick::WaitUntil(deadline) => {
                        elwt.set_control_flow(ControlFlow::WaitUntil(deadline))
                    }
                    Tick::Idle => elwt.set_control_flow(ControlFlow::Wait),
                },
                _ => {}
            })
            .map_err(|err| anyhow!("window event loop error: {err}"))
    }
}

/// Logical window size plus the scale factor.
fn viewport_metrics(window: &Window) -> ViewportMetrics {
    let scale = window.scale_factor();
    let logical = window.inner_size().to_logical::<f64>(scale);
    ViewportMetrics::new(logical.width, logical.height, scale)
}

fn refresh_interval(window: &Window) -> Duration {
    let hz = window
        .current_monitor()
        .and_then(|monitor| monitor.refresh_rate_millihertz())
        .map(|millihertz| f64::from(millihertz) / 1000.0)
        .filter(|hz| *hz > 0.0)
        .unwrap_or(FALLBACK_REFRESH_HZ);
    Duration::from_secs_f64(1.0 / hz)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Fire,
    WaitUntil(Instant),
    Idle,
}

/// Paces redraw requests to the display refresh rate.
///
/// The driver asks for the next frame from inside every step; the ticker
/// releases that request once per refresh interval.
#[derive(Debug)]
struct DisplayTicker {
    interval: Duration,
    next_tick: Option<Instant>,
    requested: bool,
}

impl DisplayTicker {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_tick: None,
            requested: false,
        }
    }

    fn poll(&mut self, now: Instant) -> Tick {
        if !self.requested {
            return Tick::Idle;
        }
        let due = self.next_tick.unwrap_or(now);
        if now < due {
            return Tick::WaitUntil(due);
        }

        self.requested = false;
        // Resynchronise after a stall instead of firing a burst of catch-up ticks.
        self.next_tick = Some(if now.duration_since(due) >= self.interval {
            now + self.interval
        } else {
            due + self.interval
        });
        Tick::Fire
    }
}

impl RefreshScheduler for DisplayTicker {
    fn request_frame(&mut self) {
        self.requested = true;
    }
}
