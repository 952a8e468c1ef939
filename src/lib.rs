//! Confidence-rating trial: a discrete rating scale a participant answers by
//! clicking or dragging along a track, with keyboard fine adjustment and
//! simulated participants for pipeline testing.
//!
//! The work is split across the workspace crates, re-exported here:
//! [`core`] for the scale and its geometry, [`timing`] for clocks,
//! [`experiment`] for the session and simulator, and [`render`] for drawing.

pub use rating_core as core;
pub use rating_experiment as experiment;
pub use rating_render as render;
pub use rating_timing as timing;

pub use rating_core::{InputEvent, Key, RatingResult, Scale, ScaleView, Tick};
pub use rating_experiment::{
    RatingSession, RecordingHost, ResponseSimulator, RngRandomization, SimulationConfig,
    SimulationMode, SimulationOptions, TrialHost, TrialParameters, after_layout, dispatch,
    render as render_trial, simulate,
};
