use rating_core::RatingResult;

/// Receives the single result a trial session produces.
pub trait CompletionSink {
    fn finish_trial(&mut self, result: RatingResult);
}

impl CompletionSink for Vec<RatingResult> {
    fn finish_trial(&mut self, result: RatingResult) {
        self.push(result);
    }
}

/// Host running the trial sequence.
pub trait TrialHost: CompletionSink {
    /// Called once the trial has loaded and, in visual mode, is on screen.
    fn trial_loaded(&mut self) {}
}

/// Host that keeps every finished result, in order.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub results: Vec<RatingResult>,
    pub loads: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&RatingResult> {
        self.results.last()
    }
}

impl CompletionSink for RecordingHost {
    fn finish_trial(&mut self, result: RatingResult) {
        log::info!(
            "Trial finished: response {} of {}, rt {} ms",
            result.tick,
            result.point_count,
            result.reaction_time_ms
        );
        self.results.push(result);
    }
}

impl TrialHost for RecordingHost {
    fn trial_loaded(&mut self) {
        self.loads += 1;
    }
}
