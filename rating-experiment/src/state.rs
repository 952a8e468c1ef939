//! Selection state machine for a single rating trial.
//!
//! A session starts `Unanswered` and moves to `Answered` on the first pointer
//! selection on the track (a press, or a drag with the primary button held).
//! Once answered, further presses and drags move the selection and the arrow
//! keys step it one tick at a time. Arrow keys do nothing before the first
//! selection.
//!
//! Transitions take the state by value and hand back the next state, so they
//! can be exercised without any display attached.

use rating_core::input::primary_only;
use rating_core::{InputEvent, Key, Scale, Tick, TrackPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Unanswered,
    Answered,
}

/// What an input did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Unanswered -> Answered.
    FirstSelection(Tick),
    Moved { from: Tick, to: Tick },
    /// Accepted, but the tick stayed where it was.
    Unchanged,
    /// Not accepted in the current phase.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState<T> {
    pub current_tick: Tick,
    pub phase: SelectionPhase,
    pub started_at: T,
}

impl<T: Copy> SelectionState<T> {
    /// Initial state. A seed tick answers the trial straight away.
    pub fn start(scale: &Scale, seed: Option<Tick>, started_at: T) -> Self {
        match seed {
            Some(tick) => Self {
                current_tick: tick,
                phase: SelectionPhase::Answered,
                started_at,
            },
            None => Self {
                current_tick: scale.first(),
                phase: SelectionPhase::Unanswered,
                started_at,
            },
        }
    }

    pub fn is_answered(&self) -> bool {
        self.phase == SelectionPhase::Answered
    }

    /// Submission is gated only when the scale requires a response.
    pub fn submit_enabled(&self, scale: &Scale) -> bool {
        !scale.require_response() || self.is_answered()
    }

    /// Applies one input. Submit clicks are not selection input and are
    /// always `Ignored` here.
    pub fn apply(self, scale: &Scale, event: &InputEvent) -> (Self, Transition) {
        match (self.phase, event) {
            (_, InputEvent::PointerDown(point)) => self.select(scale, point),
            (_, InputEvent::PointerMove { point, buttons }) if primary_only(*buttons) => {
                self.select(scale, point)
            }
            (_, InputEvent::PointerMove { .. }) => (self, Transition::Ignored),
            (SelectionPhase::Unanswered, InputEvent::Key(_)) => (self, Transition::Ignored),
            (SelectionPhase::Answered, InputEvent::Key(Key::ArrowLeft)) => {
                let to = scale.step_down(self.current_tick);
                self.move_to(to)
            }
            (SelectionPhase::Answered, InputEvent::Key(Key::ArrowRight)) => {
                let to = scale.step_up(self.current_tick);
                self.move_to(to)
            }
            (SelectionPhase::Answered, InputEvent::Key(Key::Other)) => (self, Transition::Ignored),
            (_, InputEvent::Submit) => (self, Transition::Ignored),
        }
    }

    fn select(self, scale: &Scale, point: &TrackPoint) -> (Self, Transition) {
        let tick = scale.position_to_tick(point.offset, point.track_length);
        match self.phase {
            SelectionPhase::Unanswered => (
                Self {
                    current_tick: tick,
                    phase: SelectionPhase::Answered,
                    ..self
                },
                Transition::FirstSelection(tick),
            ),
            SelectionPhase::Answered => self.move_to(tick),
        }
    }

    fn move_to(self, to: Tick) -> (Self, Transition) {
        if to == self.current_tick {
            return (self, Transition::Unchanged);
        }
        let from = self.current_tick;
        (
            Self {
                current_tick: to,
                ..self
            },
            Transition::Moved { from, to },
        )
    }
}
