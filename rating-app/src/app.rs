use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use rand_pcg::Pcg32;
use rating_core::{DisplayTarget, InputEvent, Key, PRIMARY_BUTTON, RatingResult};
use rating_experiment::{
    RatingSession, RecordingHost, ReplayScript, ResponseSimulator, RngRandomization,
    SimulationOptions, TrialHost, TrialParameters, after_layout, dispatch, render,
};
use rating_render::{Hit, SkiaRenderer};
use rating_timing::{HighPrecisionTimer, Timer};
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

type Simulator = ResponseSimulator<RngRandomization<Pcg32>>;

/// Desktop host for a single trial, driven by a participant or by a
/// visual simulation.
pub struct App {
    params: TrialParameters,
    font: Option<PathBuf>,
    simulation: Option<(Simulator, SimulationOptions)>,

    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    session: Option<RatingSession<HighPrecisionTimer>>,
    script: Option<ReplayScript>,
    host: RecordingHost,
    laid_out: bool,

    cursor: (f64, f64),
    buttons: u16,
    pressed_on_button: bool,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    should_exit: bool,
}

impl App {
    pub fn new(
        params: TrialParameters,
        font: Option<PathBuf>,
        simulation: Option<(Simulator, SimulationOptions)>,
    ) -> Result<Self> {
        Ok(Self {
            params,
            font,
            simulation,
            window: None,
            pixels: None,
            renderer: None,
            session: None,
            script: None,
            host: RecordingHost::new(),
            laid_out: false,
            cursor: (0.0, 0.0),
            buttons: 0,
            pressed_on_button: false,
            current_size: None,
            scale_factor: 1.0,
            refresh_rate: None,
            should_exit: false,
        })
    }

    /// Runs the event loop until the trial finishes or the window closes.
    pub fn run(mut self) -> Result<Option<RatingResult>> {
        let event_loop = EventLoop::new()?;
        log::info!("=== CONFIDENCE RATING ===");
        log::info!("Platform: {}", std::env::consts::OS);
        log::info!("Architecture: {}", std::env::consts::ARCH);
        if self.simulation.is_some() {
            log::info!("Visual simulation; press ESC to abort.");
        } else {
            log::info!("Click the scale to answer, arrows to adjust, ESC to exit.");
        }

        event_loop.run_app(&mut self)?;
        Ok(self.host.last().copied())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        self.refresh_rate = monitor
            .as_ref()
            .and_then(|m| m.refresh_rate_millihertz())
            .map(|rate| rate as f64 / 1000.0);

        let mut window_attributes = Window::default_attributes()
            .with_title("Confidence rating")
            .with_resizable(true);
        if let Some(monitor) = monitor {
            window_attributes =
                window_attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);
        self.scale_factor = window.scale_factor();

        log::info!(
            "Display: {}x{} at scale {:.2}",
            physical_size.width,
            physical_size.height,
            self.scale_factor
        );
        if let Some(refresh_rate) = self.refresh_rate {
            log::info!("Refresh rate: {:.1} Hz", refresh_rate);
        }

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let mut renderer =
            SkiaRenderer::new(physical_size.width, physical_size.height, &self.params.visual)?;
        match &self.font {
            Some(path) => {
                renderer = renderer
                    .with_font(path)
                    .with_context(|| format!("loading label font {}", path.display()))?;
            }
            None => log::warn!("No label font given; prompt and labels are not drawn"),
        }
        self.start_trial(renderer);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn start_trial(&mut self, mut renderer: SkiaRenderer) {
        let session = render(&mut renderer, &self.params, HighPrecisionTimer::new());
        self.host.trial_loaded();

        if let Some((simulator, options)) = &mut self.simulation {
            let target = simulator.create_simulation_data(&self.params, options);
            log::debug!(
                "Visual simulation targeting response {} at {} ms",
                target.tick,
                target.reaction_time_ms
            );
            self.script =
                Some(simulator.visual_script(session.scale(), &target, renderer.track_length()));
        }

        self.session = Some(session);
        self.renderer = Some(renderer);
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer), Some(session)) = (
            self.pixels.as_mut(),
            self.renderer.as_mut(),
            self.session.as_mut(),
        ) else {
            return Ok(());
        };

        if !self.laid_out {
            after_layout(session, renderer);
            self.laid_out = true;
        }
        if let Some(script) = &mut self.script {
            for event in script.poll(session.elapsed()) {
                dispatch(session, renderer, event, &mut self.host);
            }
        }

        let timer = session.timer().clone();
        let stats = renderer.render_frame(&session.view(), pixels.frame_mut(), &timer)?;
        let now = timer.now();
        pixels.render()?;
        let elapsed = timer.elapsed(now);

        log::trace!(
            "present {:.3}ms, draw {:.3}ms, copy {:.3}ms, total {:.3}ms",
            elapsed.as_secs_f64() * 1e3,
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3,
            stats.total.as_secs_f64() * 1e3,
        );

        if session.is_finished() {
            self.should_exit = true;
        }
        Ok(())
    }

    /// Participant input; ignored while a simulation drives the trial.
    fn send(&mut self, event: InputEvent) {
        if self.script.is_some() {
            return;
        }
        if let (Some(session), Some(renderer)) = (self.session.as_mut(), self.renderer.as_mut()) {
            let update = dispatch(session, renderer, event, &mut self.host);
            if update.needs_redraw() || session.is_finished() {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
        }
    }

    fn hit(&self) -> Hit {
        match &self.renderer {
            Some(renderer) => renderer.layout().hit(self.cursor.0, self.cursor.1),
            None => Hit::Outside,
        }
    }

    fn handle_cursor(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
        if let Hit::Track(point) = self.hit() {
            self.send(InputEvent::PointerMove {
                point,
                buttons: self.buttons,
            });
        }
    }

    fn handle_mouse(&mut self, state: ElementState, button: MouseButton) {
        let bit = button_bit(button);
        match state {
            ElementState::Pressed => {
                self.buttons |= bit;
                if bit != PRIMARY_BUTTON {
                    return;
                }
                match self.hit() {
                    Hit::Track(point) => self.send(InputEvent::PointerDown(point)),
                    Hit::Button => self.pressed_on_button = true,
                    Hit::Outside => {}
                }
            }
            ElementState::Released => {
                self.buttons &= !bit;
                if bit != PRIMARY_BUTTON {
                    return;
                }
                let clicked = self.pressed_on_button && self.hit() == Hit::Button;
                self.pressed_on_button = false;
                if clicked {
                    self.send(InputEvent::Submit);
                }
            }
        }
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        if let PhysicalKey::Code(k) = key {
            match k {
                KeyCode::ArrowLeft => self.send(InputEvent::Key(Key::ArrowLeft)),
                KeyCode::ArrowRight => self.send(InputEvent::Key(Key::ArrowRight)),
                KeyCode::Escape => self.cleanup_and_exit(event_loop),
                _ => self.send(InputEvent::Key(Key::Other)),
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                log::error!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                log::error!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                log::error!("Failed to resize canvas: {:#}", e);
            }
        }
        log::debug!("Display resized to: {}x{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = &mut self.session {
            if !session.is_finished() {
                session.teardown();
                log::info!("Trial aborted before submission");
            }
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

/// DOM-style bitmask bit for a mouse button.
fn button_bit(button: MouseButton) -> u16 {
    match button {
        MouseButton::Left => PRIMARY_BUTTON,
        MouseButton::Right => 2,
        MouseButton::Middle => 4,
        MouseButton::Back => 8,
        MouseButton::Forward => 16,
        MouseButton::Other(_) => 0,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("Failed to create window and surface: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    log::error!("Render failed: {:#}", e);
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if self.should_exit {
                    event_loop.exit();
                } else if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor(position.x, position.y),
            WindowEvent::MouseInput { state, button, .. } => self.handle_mouse(state, button),
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        log::debug!("Application resources cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_buttons_map_to_dom_bits() {
        assert_eq!(button_bit(MouseButton::Left), 1);
        assert_eq!(button_bit(MouseButton::Right), 2);
        assert_eq!(button_bit(MouseButton::Middle), 4);
        assert_eq!(button_bit(MouseButton::Other(9)), 0);
    }
}
