//! Entry points the host drives a confidence-rating trial through.

use super::config::TrialParameters;
use super::host::{CompletionSink, TrialHost};
use super::simulate::{Randomization, ResponseSimulator, SimulationMode, SimulationOptions};
use super::trial::{RatingSession, SessionUpdate};
use rating_core::{DisplayTarget, InputEvent, RatingResult, ScaleView};
use rating_timing::Timer;

pub const PLUGIN_NAME: &str = "confidence-rating";

/// Mounts a trial on `display` and returns the session that handles its input.
///
/// Timing starts here. A seeded thumb stays hidden until [`after_layout`].
pub fn render<T: Timer, D: DisplayTarget>(
    display: &mut D,
    params: &TrialParameters,
    timer: T,
) -> RatingSession<T> {
    let session = RatingSession::start(params, timer);
    display.present(&session.view());
    session
}

/// Follow-up for the first rendering pass after mount.
pub fn after_layout<T: Timer, D: DisplayTarget>(session: &mut RatingSession<T>, display: &mut D) {
    if session.after_layout() {
        display.present(&session.view());
    }
}

/// Routes one input to the session and redraws if anything visible changed.
pub fn dispatch<T, D, S>(
    session: &mut RatingSession<T>,
    display: &mut D,
    event: InputEvent,
    sink: &mut S,
) -> SessionUpdate
where
    T: Timer,
    D: DisplayTarget,
    S: CompletionSink,
{
    let update = session.handle(event, sink);
    if update.needs_redraw() {
        display.present(&session.view());
    }
    update
}

/// Produces a result without a participant.
///
/// `DataOnly` never touches `display`. `Visual` renders the trial on it and
/// replays synthetic input through the session, sleeping on `timer` between
/// steps. Returns `None` only if the visual session ends without submitting.
pub fn simulate<T, D, R, H>(
    mode: SimulationMode,
    params: &TrialParameters,
    options: &SimulationOptions,
    simulator: &mut ResponseSimulator<R>,
    display: &mut D,
    timer: T,
    host: &mut H,
) -> Option<RatingResult>
where
    T: Timer,
    D: DisplayTarget,
    R: Randomization,
    H: TrialHost,
{
    match mode {
        SimulationMode::DataOnly => Some(simulate_data_only(params, options, simulator, host)),
        SimulationMode::Visual => simulate_visual(params, options, simulator, display, timer, host),
    }
}

pub fn simulate_data_only<R: Randomization, H: TrialHost>(
    params: &TrialParameters,
    options: &SimulationOptions,
    simulator: &mut ResponseSimulator<R>,
    host: &mut H,
) -> RatingResult {
    host.trial_loaded();
    let result = simulator.create_simulation_data(params, options);
    log::debug!(
        "[{}] Data-only simulation: response {}, rt {} ms",
        PLUGIN_NAME,
        result.tick,
        result.reaction_time_ms
    );
    host.finish_trial(result);
    result
}

pub fn simulate_visual<T, D, R, H>(
    params: &TrialParameters,
    options: &SimulationOptions,
    simulator: &mut ResponseSimulator<R>,
    display: &mut D,
    timer: T,
    host: &mut H,
) -> Option<RatingResult>
where
    T: Timer,
    D: DisplayTarget,
    R: Randomization,
    H: TrialHost,
{
    let target = simulator.create_simulation_data(params, options);
    let mut session = render(display, params, timer);
    host.trial_loaded();
    after_layout(&mut session, display);

    let script = simulator.visual_script(session.scale(), &target, display.track_length());
    log::debug!(
        "[{}] Visual simulation targeting response {} at {} ms",
        PLUGIN_NAME,
        target.tick,
        target.reaction_time_ms
    );

    script.run(&mut session, host, |s, update| {
        if update.needs_redraw() {
            display.present(&s.view());
        }
    })
}

/// Display without pixels. Remembers every presented view.
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    pub track_length: f64,
    pub frames: Vec<ScaleView>,
}

impl HeadlessDisplay {
    pub fn new(track_length: f64) -> Self {
        Self {
            track_length,
            frames: Vec::new(),
        }
    }

    pub fn last_frame(&self) -> Option<&ScaleView> {
        self.frames.last()
    }
}

impl DisplayTarget for HeadlessDisplay {
    fn track_length(&self) -> f64 {
        self.track_length
    }

    fn present(&mut self, view: &ScaleView) {
        self.frames.push(view.clone());
    }
}
