pub mod config;
pub mod host;
pub mod plugin;
pub mod simulate;
pub mod state;
pub mod trial;
pub use config::{SimulationConfig, TrialParameters};
pub use host::{CompletionSink, RecordingHost, TrialHost};
pub use plugin::{HeadlessDisplay, after_layout, dispatch, render, simulate};
pub use simulate::{
    DraftResult, Randomization, ReplayScript, ResponseSimulator, RngRandomization,
    ScheduledInput, SimulationData, SimulationMode, SimulationOptions,
};
pub use state::{SelectionPhase, SelectionState, Transition};
pub use trial::{RatingSession, SessionStatus, SessionUpdate};
