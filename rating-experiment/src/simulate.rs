//! Simulated participants.
//!
//! `DataOnly` builds a result without touching the display. `Visual` renders
//! the scale and replays a pointer press and a submit click through the same
//! session a participant would use, so the two differ only in timing.

use super::config::{SimulationConfig, TrialParameters};
use super::host::CompletionSink;
use super::trial::{RatingSession, SessionUpdate};
use rand::Rng;
use rating_core::{InputEvent, RatingResult, Scale};
use rating_timing::Timer;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::str::FromStr;
use std::time::Duration;

const EX_GAUSSIAN_MAX_DRAWS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationMode {
    DataOnly,
    Visual,
}

impl FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data-only" => Ok(SimulationMode::DataOnly),
            "visual" => Ok(SimulationMode::Visual),
            other => Err(format!("unknown simulation mode: {other}")),
        }
    }
}

/// Randomization service used by the simulator.
pub trait Randomization {
    /// Uniform integer in `lo..=hi`.
    fn random_int(&mut self, lo: i64, hi: i64) -> i64;

    /// Ex-Gaussian draw: normal(`mu`, `sigma`) plus exponential(`rate`).
    /// With `positive`, draws repeat until the sample is above zero.
    fn sample_ex_gaussian(&mut self, mu: f64, sigma: f64, rate: f64, positive: bool) -> f64;
}

/// [`Randomization`] over any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngRandomization<R: Rng> {
    rng: R,
}

impl<R: Rng> RngRandomization<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn standard_normal(&mut self) -> f64 {
        // Box-Muller; u1 in (0, 1] keeps ln finite.
        let u1 = 1.0 - self.rng.random::<f64>();
        let u2 = self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
    }

    fn exponential(&mut self, rate: f64) -> f64 {
        let u = 1.0 - self.rng.random::<f64>();
        -u.ln() / rate
    }
}

impl<R: Rng> Randomization for RngRandomization<R> {
    fn random_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    fn sample_ex_gaussian(&mut self, mu: f64, sigma: f64, rate: f64, positive: bool) -> f64 {
        for _ in 0..EX_GAUSSIAN_MAX_DRAWS {
            let x = mu + sigma * self.standard_normal() + self.exponential(rate);
            if !positive || x > 0.0 {
                return x;
            }
        }
        log::warn!("ex-Gaussian draw stayed non-positive; using mean {}", mu);
        mu.max(0.0)
    }
}

/// Caller-supplied values that replace generated simulation data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationData {
    #[serde(alias = "tick")]
    pub response: Option<i64>,
    #[serde(alias = "reactionTimeMs")]
    pub rt: Option<i64>,
    #[serde(alias = "pointCount")]
    pub n_points: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    pub data: SimulationData,
}

impl SimulationOptions {
    pub fn with_response(mut self, response: i64) -> Self {
        self.data.response = Some(response);
        self
    }

    pub fn with_rt(mut self, rt: i64) -> Self {
        self.data.rt = Some(rt);
        self
    }
}

/// Simulation record before it is checked against the trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftResult {
    pub response: i64,
    pub rt: i64,
    pub n_points: i64,
}

/// Overlays the supplied fields of `overrides` on `defaults`.
pub fn merge_simulation_data(defaults: DraftResult, overrides: &SimulationData) -> DraftResult {
    DraftResult {
        response: overrides.response.unwrap_or(defaults.response),
        rt: overrides.rt.unwrap_or(defaults.rt),
        n_points: overrides.n_points.unwrap_or(defaults.n_points),
    }
}

/// Brings a merged record in line with the trial's scale. Nothing here
/// fails; each correction is logged.
pub fn ensure_simulation_data_consistency(scale: &Scale, draft: DraftResult) -> RatingResult {
    let n = scale.point_count();
    if draft.n_points != n as i64 {
        log::warn!(
            "[confidence-rating] Simulated n_points {} does not match trial ({}); using {}",
            draft.n_points,
            n,
            n
        );
    }
    let tick = scale.clamp_tick(draft.response);
    if tick.get() as i64 != draft.response {
        log::warn!(
            "[confidence-rating] Simulated response {} outside 1..{}; clamped to {}",
            draft.response,
            n,
            tick
        );
    }
    if draft.rt < 0 {
        log::warn!("[confidence-rating] Simulated rt {} is negative; using 0", draft.rt);
    }
    RatingResult {
        tick,
        reaction_time_ms: draft.rt.max(0) as u64,
        point_count: n,
    }
}

/// Generates target responses for simulated participants.
pub struct ResponseSimulator<R: Randomization> {
    pub config: SimulationConfig,
    rng: R,
}

impl<R: Randomization> ResponseSimulator<R> {
    pub fn new(config: SimulationConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Target tick drawn uniformly from the scale, latency from the
    /// ex-Gaussian shifted up by the latency floor.
    pub fn default_data(&mut self, scale: &Scale) -> DraftResult {
        let n = scale.point_count() as i64;
        let response = self.rng.random_int(1, n);
        let latency = self.rng.sample_ex_gaussian(
            self.config.ex_gaussian_mu,
            self.config.ex_gaussian_sigma,
            self.config.ex_gaussian_rate,
            true,
        );
        let rt = (self.config.latency_floor_ms as f64 + latency).round() as i64;
        DraftResult {
            response,
            rt,
            n_points: n,
        }
    }

    /// Generated data with `options` merged over it, checked against the trial.
    pub fn create_simulation_data(
        &mut self,
        params: &TrialParameters,
        options: &SimulationOptions,
    ) -> RatingResult {
        let scale = params.scale();
        let defaults = self.default_data(&scale);
        let merged = merge_simulation_data(defaults, &options.data);
        ensure_simulation_data_consistency(&scale, merged)
    }

    /// Input script that makes a session produce `target`.
    pub fn visual_script(
        &self,
        scale: &Scale,
        target: &RatingResult,
        track_length: f64,
    ) -> ReplayScript {
        ReplayScript::for_target(scale, target, track_length, &self.config)
    }
}

/// One input and when to dispatch it, relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledInput {
    pub at: Duration,
    pub event: InputEvent,
}

/// Time-ordered synthetic input for a visual simulation.
#[derive(Debug, Clone, Default)]
pub struct ReplayScript {
    steps: VecDeque<ScheduledInput>,
}

impl ReplayScript {
    /// Press on the centre of the target tick, then click submit once the
    /// target reaction time has passed. The press never lands after the click.
    pub fn for_target(
        scale: &Scale,
        target: &RatingResult,
        track_length: f64,
        config: &SimulationConfig,
    ) -> Self {
        let tick = scale.clamp_tick(target.tick.get() as i64);
        let offset = scale.tick_to_offset(tick, track_length);
        let rt = target.reaction_time_ms;
        let press_at = config.pointer_down_delay_ms.min(rt);

        Self::from_steps([
            ScheduledInput {
                at: Duration::from_millis(press_at),
                event: InputEvent::pointer_down(offset, track_length),
            },
            ScheduledInput {
                at: Duration::from_millis(rt),
                event: InputEvent::Submit,
            },
        ])
    }

    pub fn from_steps(steps: impl IntoIterator<Item = ScheduledInput>) -> Self {
        let mut steps: Vec<ScheduledInput> = steps.into_iter().collect();
        steps.sort_by_key(|s| s.at);
        Self {
            steps: steps.into(),
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = &ScheduledInput> {
        self.steps.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// When the next step becomes due.
    pub fn next_due(&self) -> Option<Duration> {
        self.steps.front().map(|s| s.at)
    }

    /// Removes and returns every step due at `elapsed`, in order. For hosts
    /// that poll from their own event loop.
    pub fn poll(&mut self, elapsed: Duration) -> Vec<InputEvent> {
        let mut due = Vec::new();
        while let Some(step) = self.steps.front() {
            if step.at > elapsed {
                break;
            }
            due.push(step.event);
            self.steps.pop_front();
        }
        due
    }

    /// Drives `session` through the script, sleeping on the session's timer
    /// between steps. `on_update` sees every dispatched update.
    pub fn run<T, S, F>(
        mut self,
        session: &mut RatingSession<T>,
        sink: &mut S,
        mut on_update: F,
    ) -> Option<RatingResult>
    where
        T: Timer,
        S: CompletionSink,
        F: FnMut(&RatingSession<T>, &SessionUpdate),
    {
        while let Some(step) = self.steps.pop_front() {
            let elapsed = session.elapsed();
            if step.at > elapsed {
                session.timer().sleep(step.at - elapsed);
            }
            let update = session.handle(step.event, sink);
            on_update(session, &update);
            if let SessionUpdate::Submitted(result) = update {
                return Some(result);
            }
            if session.is_finished() {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use rating_timing::ManualTimer;

    fn simulator(seed: u64) -> ResponseSimulator<RngRandomization<Pcg32>> {
        ResponseSimulator::new(
            SimulationConfig::default(),
            RngRandomization::new(Pcg32::seed_from_u64(seed)),
        )
    }

    /// Always returns the same values.
    struct FixedRandomization {
        int: i64,
        latency: f64,
    }

    impl Randomization for FixedRandomization {
        fn random_int(&mut self, _lo: i64, _hi: i64) -> i64 {
            self.int
        }
        fn sample_ex_gaussian(
            &mut self,
            _mu: f64,
            _sigma: f64,
            _rate: f64,
            _positive: bool,
        ) -> f64 {
            self.latency
        }
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("data-only".parse::<SimulationMode>(), Ok(SimulationMode::DataOnly));
        assert_eq!("visual".parse::<SimulationMode>(), Ok(SimulationMode::Visual));
        assert!("fast".parse::<SimulationMode>().is_err());
    }

    #[test]
    fn random_int_stays_in_bounds() {
        let mut rng = RngRandomization::new(Pcg32::seed_from_u64(7));
        for _ in 0..2000 {
            let v = rng.random_int(1, 10);
            assert!((1..=10).contains(&v));
        }
        assert_eq!(rng.random_int(3, 3), 3);
    }

    #[test]
    fn positive_ex_gaussian_is_positive() {
        let mut rng = RngRandomization::new(Pcg32::seed_from_u64(11));
        for _ in 0..2000 {
            assert!(rng.sample_ex_gaussian(10.0, 400.0, 1.0 / 200.0, true) > 0.0);
        }
    }

    #[test]
    fn ex_gaussian_mean_is_mu_plus_tau() {
        let mut rng = RngRandomization::new(Pcg32::seed_from_u64(3));
        let draws = 20_000;
        let mean = (0..draws)
            .map(|_| rng.sample_ex_gaussian(1500.0, 400.0, 1.0 / 200.0, true))
            .sum::<f64>()
            / draws as f64;
        assert!((mean - 1700.0).abs() < 30.0, "mean was {mean}");
    }

    #[test]
    fn default_data_respects_scale_and_floor() {
        let mut sim = simulator(42);
        let scale = Scale::new(10, true);
        for _ in 0..500 {
            let draft = sim.default_data(&scale);
            assert!((1..=10).contains(&draft.response));
            assert!(draft.rt >= 1000);
            assert_eq!(draft.n_points, 10);
        }
    }

    #[test]
    fn same_seed_same_data() {
        let params = TrialParameters::default();
        let options = SimulationOptions::default();
        let a = simulator(5).create_simulation_data(&params, &options);
        let b = simulator(5).create_simulation_data(&params, &options);
        assert_eq!(a, b);
    }

    #[test]
    fn overrides_replace_generated_fields() {
        let defaults = DraftResult {
            response: 2,
            rt: 1800,
            n_points: 6,
        };
        let merged = merge_simulation_data(
            defaults,
            &SimulationData {
                response: Some(5),
                rt: None,
                n_points: None,
            },
        );
        assert_eq!(
            merged,
            DraftResult {
                response: 5,
                rt: 1800,
                n_points: 6
            }
        );
    }

    #[test]
    fn consistency_clamps_out_of_range_values() {
        let scale = Scale::new(6, true);
        let result = ensure_simulation_data_consistency(
            &scale,
            DraftResult {
                response: 17,
                rt: -40,
                n_points: 3,
            },
        );
        assert_eq!(result.tick.get(), 6);
        assert_eq!(result.reaction_time_ms, 0);
        assert_eq!(result.point_count, 6);

        let low = ensure_simulation_data_consistency(
            &scale,
            DraftResult {
                response: -3,
                rt: 900,
                n_points: 6,
            },
        );
        assert_eq!(low.tick.get(), 1);
    }

    #[test]
    fn fixed_randomization_drives_defaults() {
        let mut sim = ResponseSimulator::new(
            SimulationConfig::default(),
            FixedRandomization {
                int: 3,
                latency: 250.4,
            },
        );
        let result = sim.create_simulation_data(
            &TrialParameters::default(),
            &SimulationOptions::default(),
        );
        assert_eq!(result.tick.get(), 3);
        assert_eq!(result.reaction_time_ms, 1250);
    }

    #[test]
    fn options_parse_from_json() {
        let options: SimulationOptions =
            serde_json::from_str(r#"{"data": {"response": 4, "rt": 900}}"#).unwrap();
        assert_eq!(options.data.response, Some(4));
        assert_eq!(options.data.rt, Some(900));
        assert_eq!(options.data.n_points, None);
    }

    #[test]
    fn script_presses_target_then_submits() {
        let scale = Scale::new(8, true);
        let target = RatingResult {
            tick: scale.tick(5).unwrap(),
            reaction_time_ms: 1400,
            point_count: 8,
        };
        let script = ReplayScript::for_target(&scale, &target, 700.0, &SimulationConfig::default());
        let steps: Vec<ScheduledInput> = script.steps().copied().collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].at, Duration::from_millis(300));
        match steps[0].event {
            InputEvent::PointerDown(point) => {
                assert!((point.offset - 400.0).abs() < 1e-9);
                assert_eq!(point.track_length, 700.0);
            }
            other => panic!("expected a pointer press, got {other:?}"),
        }
        assert_eq!(steps[1].at, Duration::from_millis(1400));
        assert_eq!(steps[1].event, InputEvent::Submit);
    }

    #[test]
    fn short_reaction_time_moves_press_before_submit() {
        let scale = Scale::new(4, true);
        let target = RatingResult {
            tick: scale.tick(2).unwrap(),
            reaction_time_ms: 120,
            point_count: 4,
        };
        let script = ReplayScript::for_target(&scale, &target, 300.0, &SimulationConfig::default());
        let steps: Vec<ScheduledInput> = script.steps().copied().collect();
        assert_eq!(steps[0].at, Duration::from_millis(120));
        assert!(matches!(steps[0].event, InputEvent::PointerDown(_)));
        assert_eq!(steps[1].event, InputEvent::Submit);
    }

    #[test]
    fn poll_releases_due_steps_in_order() {
        let scale = Scale::new(4, true);
        let target = RatingResult {
            tick: scale.last(),
            reaction_time_ms: 1000,
            point_count: 4,
        };
        let mut script =
            ReplayScript::for_target(&scale, &target, 300.0, &SimulationConfig::default());
        assert!(script.poll(Duration::from_millis(299)).is_empty());
        assert_eq!(script.next_due(), Some(Duration::from_millis(300)));
        assert_eq!(
            script.poll(Duration::from_millis(999)),
            vec![InputEvent::pointer_down(300.0, 300.0)]
        );
        assert_eq!(script.poll(Duration::from_secs(5)), vec![InputEvent::Submit]);
        assert!(script.is_empty());
    }

    #[test]
    fn run_replays_through_the_session() {
        let params = TrialParameters::default().with_points(8);
        let timer = ManualTimer::new();
        let mut session = RatingSession::start(&params, timer);
        let scale = *session.scale();
        let target = RatingResult {
            tick: scale.tick(5).unwrap(),
            reaction_time_ms: 1750,
            point_count: 8,
        };
        let script = ReplayScript::for_target(&scale, &target, 640.0, &SimulationConfig::default());
        let mut sink: Vec<RatingResult> = Vec::new();
        let mut ticks_before_submit = Vec::new();

        let result = script.run(&mut session, &mut sink, |s, update| {
            if !matches!(update, SessionUpdate::Submitted(_)) {
                ticks_before_submit.push(s.current_tick().get());
            }
        });

        assert_eq!(result, Some(target));
        assert_eq!(ticks_before_submit, vec![5]);
        assert_eq!(sink, vec![target]);
    }
}
