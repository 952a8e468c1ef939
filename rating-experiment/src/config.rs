use rating_core::{Scale, ScaleLabels, Tick, VisualOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameter bundle for one confidence-rating trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialParameters {
    /// Title above the scale.
    pub prompt: String,
    /// Anchors under the ends of the track. Ignored when `tick_labels` is given.
    #[serde(alias = "leftLabel")]
    pub left_label: String,
    #[serde(alias = "rightLabel")]
    pub right_label: String,
    /// Optional label markup for every tick.
    #[serde(alias = "tickLabels")]
    pub tick_labels: Option<Vec<String>>,
    /// Number of discrete points; values below 2 are raised to 2.
    #[serde(alias = "pointCount", deserialize_with = "point_count_from_json")]
    pub n_points: i64,
    /// Keep submit disabled until the first selection.
    #[serde(alias = "requireResponse")]
    pub require_response: bool,
    #[serde(alias = "buttonLabel")]
    pub button_label: String,
    /// Starting tick. Anything but an integer on the scale is ignored.
    #[serde(alias = "startValue")]
    pub start_value: Option<Value>,
    #[serde(flatten)]
    pub visual: VisualOptions,
}

impl Default for TrialParameters {
    fn default() -> Self {
        Self {
            prompt: "Rate your confidence:".to_string(),
            left_label: "Guessing".to_string(),
            right_label: "Certain".to_string(),
            tick_labels: None,
            n_points: 6,
            require_response: true,
            button_label: "Submit".to_string(),
            start_value: None,
            visual: VisualOptions::default(),
        }
    }
}

impl TrialParameters {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_points(mut self, n_points: i64) -> Self {
        self.n_points = n_points;
        self
    }

    pub fn with_require_response(mut self, require_response: bool) -> Self {
        self.require_response = require_response;
        self
    }

    pub fn with_start_value(mut self, start_value: impl Into<Value>) -> Self {
        self.start_value = Some(start_value.into());
        self
    }

    pub fn scale(&self) -> Scale {
        Scale::new(self.n_points, self.require_response)
    }

    pub fn labels(&self, scale: &Scale) -> ScaleLabels {
        ScaleLabels::reconcile(
            scale,
            &self.left_label,
            &self.right_label,
            self.tick_labels.as_deref(),
        )
    }

    /// The starting tick, if one was supplied and lies on `scale`.
    pub fn seed_tick(&self, scale: &Scale) -> Option<Tick> {
        let value = match &self.start_value {
            None | Some(Value::Null) => {
                log::debug!("[confidence-rating] No start value provided; thumb will start hidden");
                return None;
            }
            Some(value) => value,
        };

        match integral(value).and_then(|v| scale.tick(v)) {
            Some(tick) => {
                log::info!(
                    "[confidence-rating] Applying start value {} of {}",
                    tick,
                    scale.point_count()
                );
                Some(tick)
            }
            None => {
                log::warn!(
                    "[confidence-rating] Ignoring invalid start value {}, valid range is 1..{}",
                    value,
                    scale.point_count()
                );
                None
            }
        }
    }
}

/// Integer value of a JSON number with no fractional part.
fn integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Reads a point count the way a host coerces it to an integer: numbers and
/// numeric strings truncate toward zero, anything else counts as 0 and ends
/// up raised to the minimum by [`Scale::new`].
fn point_count_from_json<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let truncated = |f: f64| f.is_finite().then(|| f.trunc() as i64);
    let count = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncated)),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(truncated),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    Ok(count.unwrap_or_else(|| {
        log::warn!(
            "[confidence-rating] Point count {} is not a number; treating it as 0",
            value
        );
        0
    }))
}

/// Constants the response simulator draws on.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Delay before the synthetic pointer-down in visual mode.
    pub pointer_down_delay_ms: u64,
    /// Simulated latencies never fall below this.
    pub latency_floor_ms: u64,
    pub ex_gaussian_mu: f64,
    pub ex_gaussian_sigma: f64,
    pub ex_gaussian_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pointer_down_delay_ms: 300,
            latency_floor_ms: 1000,
            ex_gaussian_mu: 1500.0,
            ex_gaussian_sigma: 400.0,
            ex_gaussian_rate: 1.0 / 200.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_stock_trial() {
        let params = TrialParameters::default();
        assert_eq!(params.prompt, "Rate your confidence:");
        assert_eq!(params.scale().point_count(), 6);
        assert!(params.scale().require_response());
        assert_eq!(params.button_label, "Submit");
        assert_eq!(params.visual.width_px, 980);
    }

    #[test]
    fn parses_snake_and_camel_case_keys() {
        let snake = TrialParameters::from_json_str(
            r#"{"n_points": 4, "require_response": false, "left_label": "no", "width_px": 500}"#,
        )
        .unwrap();
        assert_eq!(snake.scale().point_count(), 4);
        assert!(!snake.scale().require_response());
        assert_eq!(snake.left_label, "no");
        assert_eq!(snake.visual.width_px, 500);

        let camel = TrialParameters::from_json_str(
            r#"{"pointCount": 9, "requireResponse": true, "tickLabels": ["a"], "startValue": 3}"#,
        )
        .unwrap();
        assert_eq!(camel.scale().point_count(), 9);
        assert_eq!(camel.tick_labels.as_deref(), Some(&["a".to_string()][..]));
        assert_eq!(camel.seed_tick(&camel.scale()).map(Tick::get), Some(3));
    }

    #[test]
    fn point_count_accepts_numeric_json() {
        let points = |v: Value| {
            let params: TrialParameters = serde_json::from_value(json!({ "n_points": v })).unwrap();
            params.scale().point_count()
        };
        assert_eq!(points(json!(6.0)), 6);
        assert_eq!(points(json!(6.7)), 6);
        assert_eq!(points(json!("6")), 6);
        assert_eq!(points(json!(" 8 ")), 8);
        assert_eq!(points(json!("abc")), 2);
        assert_eq!(points(json!(null)), 2);
        assert_eq!(points(json!([7])), 2);

        let camel = TrialParameters::from_json_str(r#"{"pointCount": "5", "prompt": "Sure?"}"#)
            .unwrap();
        assert_eq!(camel.n_points, 5);
        assert_eq!(camel.prompt, "Sure?");
    }

    #[test]
    fn point_count_below_two_is_raised() {
        let params = TrialParameters::default().with_points(1);
        assert_eq!(params.scale().point_count(), 2);
    }

    #[test]
    fn seed_accepts_integral_numbers_on_the_scale() {
        let scale = Scale::new(5, true);
        let seed = |v: Value| TrialParameters::default().with_start_value(v).seed_tick(&scale);
        assert_eq!(seed(json!(1)).map(Tick::get), Some(1));
        assert_eq!(seed(json!(5)).map(Tick::get), Some(5));
        assert_eq!(seed(json!(3.0)).map(Tick::get), Some(3));
    }

    #[test]
    fn seed_rejects_everything_else() {
        let scale = Scale::new(5, true);
        let seed = |v: Value| TrialParameters::default().with_start_value(v).seed_tick(&scale);
        assert_eq!(seed(json!(0)), None);
        assert_eq!(seed(json!(6)), None);
        assert_eq!(seed(json!(-2)), None);
        assert_eq!(seed(json!(2.5)), None);
        assert_eq!(seed(json!("3")), None);
        assert_eq!(seed(json!(null)), None);
        assert_eq!(TrialParameters::default().seed_tick(&scale), None);
    }
}
