use super::config::TrialParameters;
use super::host::CompletionSink;
use super::state::{SelectionState, Transition};
use rating_core::{InputEvent, RatingResult, Scale, ScaleLabels, ScaleView, Tick, VisualOptions};
use rating_timing::Timer;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// A result was handed to the completion sink.
    Finalized,
    /// Ended by the host without a result.
    TornDown,
}

/// Whether the thumb is drawn. A seeded start waits for the host's first
/// layout pass before it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThumbReveal {
    Hidden,
    AfterLayout,
    Shown,
}

/// Outcome of dispatching one input to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Selection input was applied. `redraw` is set when the view changed.
    Selection { transition: Transition, redraw: bool },
    Submitted(RatingResult),
    /// Submit pressed while a response is still required.
    SubmitGated,
    /// The session already ended; input is dropped.
    Closed,
}

impl SessionUpdate {
    pub fn needs_redraw(&self) -> bool {
        matches!(self, SessionUpdate::Selection { redraw: true, .. })
    }
}

/// Interaction session for one rendered trial. Owns the selection state
/// from render until the trial is submitted or torn down.
pub struct RatingSession<T: Timer> {
    scale: Scale,
    prompt: String,
    labels: ScaleLabels,
    button_label: String,
    visual: VisualOptions,
    state: SelectionState<T::Timestamp>,
    timer: T,
    status: SessionStatus,
    reveal: ThumbReveal,
}

impl<T: Timer> RatingSession<T> {
    /// Starts timing now. The selection state, seed included, is settled
    /// before this returns.
    pub fn start(params: &TrialParameters, timer: T) -> Self {
        let scale = params.scale();
        let seed = params.seed_tick(&scale);
        let state = SelectionState::start(&scale, seed, timer.now());

        Self {
            scale,
            prompt: params.prompt.clone(),
            labels: params.labels(&scale),
            button_label: params.button_label.clone(),
            visual: params.visual.clone(),
            state,
            timer,
            status: SessionStatus::Active,
            reveal: if seed.is_some() {
                ThumbReveal::AfterLayout
            } else {
                ThumbReveal::Hidden
            },
        }
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn state(&self) -> &SelectionState<T::Timestamp> {
        &self.state
    }

    pub fn current_tick(&self) -> Tick {
        self.state.current_tick
    }

    pub fn is_answered(&self) -> bool {
        self.state.is_answered()
    }

    pub fn submit_enabled(&self) -> bool {
        self.status == SessionStatus::Active && self.state.submit_enabled(&self.scale)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != SessionStatus::Active
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Time since the trial was rendered.
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed(self.state.started_at)
    }

    pub fn view(&self) -> ScaleView {
        ScaleView {
            prompt: self.prompt.clone(),
            labels: self.labels.clone(),
            scale: self.scale,
            thumb: (self.reveal == ThumbReveal::Shown).then_some(self.state.current_tick),
            submit_enabled: self.submit_enabled(),
            button_label: self.button_label.clone(),
            visual: self.visual.clone(),
        }
    }

    /// Shows a seeded thumb once layout has settled. Returns `true` when
    /// the view changed.
    pub fn after_layout(&mut self) -> bool {
        if self.reveal == ThumbReveal::AfterLayout {
            self.reveal = ThumbReveal::Shown;
            true
        } else {
            false
        }
    }

    pub fn handle<S: CompletionSink>(&mut self, event: InputEvent, sink: &mut S) -> SessionUpdate {
        if self.is_finished() {
            return SessionUpdate::Closed;
        }
        if let InputEvent::Submit = event {
            return match self.submit(sink) {
                Some(result) => SessionUpdate::Submitted(result),
                None => SessionUpdate::SubmitGated,
            };
        }

        let (state, transition) = self.state.apply(&self.scale, &event);
        self.state = state;
        match transition {
            Transition::FirstSelection(tick) => {
                log::debug!("[confidence-rating] First selection: tick {}", tick);
            }
            Transition::Moved { from, to } => {
                log::trace!("[confidence-rating] Selection moved {} -> {}", from, to);
            }
            Transition::Unchanged => {}
            Transition::Ignored => {
                return SessionUpdate::Selection {
                    transition,
                    redraw: false,
                };
            }
        }
        // Accepted input means the surface is laid out, so a pending seed thumb can show too.
        let revealed = self.reveal != ThumbReveal::Shown;
        self.reveal = ThumbReveal::Shown;
        SessionUpdate::Selection {
            transition,
            redraw: revealed || transition != Transition::Unchanged,
        }
    }

    /// Finalizes the trial and hands the result to `sink`. Does nothing
    /// while submission is gated or after the session has ended.
    pub fn submit<S: CompletionSink>(&mut self, sink: &mut S) -> Option<RatingResult> {
        if !self.submit_enabled() {
            log::debug!("[confidence-rating] Submit ignored: {:?}", self.status);
            return None;
        }

        let result = RatingResult {
            tick: self.state.current_tick,
            reaction_time_ms: round_ms(self.elapsed()),
            point_count: self.scale.point_count(),
        };
        self.status = SessionStatus::Finalized;
        sink.finish_trial(result);
        Some(result)
    }

    /// Ends the session without a result, e.g. on a trial timeout.
    pub fn teardown(&mut self) {
        if self.status == SessionStatus::Active {
            log::debug!("[confidence-rating] Session torn down before submit");
            self.status = SessionStatus::TornDown;
        }
    }
}

fn round_ms(d: Duration) -> u64 {
    (d.as_secs_f64() * 1000.0).round() as u64
}
