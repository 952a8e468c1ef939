use crate::{MIN_POINT_COUNT, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorded outcome of one rating trial.
///
/// Serialized with the field names the host's data pipeline records:
/// `response`, `rt` and `n_points`. Reading one back rejects a response
/// that does not fit its own scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordedResult")]
pub struct RatingResult {
    #[serde(rename = "response")]
    pub tick: Tick,
    #[serde(rename = "rt")]
    pub reaction_time_ms: u64,
    #[serde(rename = "n_points")]
    pub point_count: u32,
}

#[derive(Deserialize)]
struct RecordedResult {
    response: Tick,
    rt: u64,
    n_points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidResult {
    TooFewPoints(u32),
    ResponseOffScale { response: u32, point_count: u32 },
}

impl fmt::Display for InvalidResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints(n) => {
                write!(f, "n_points {n} is below the minimum of {MIN_POINT_COUNT}")
            }
            Self::ResponseOffScale {
                response,
                point_count,
            } => write!(f, "response {response} is off a {point_count}-point scale"),
        }
    }
}

impl std::error::Error for InvalidResult {}

impl TryFrom<RecordedResult> for RatingResult {
    type Error = InvalidResult;

    fn try_from(raw: RecordedResult) -> Result<Self, Self::Error> {
        if raw.n_points < MIN_POINT_COUNT {
            return Err(InvalidResult::TooFewPoints(raw.n_points));
        }
        if raw.response.get() > raw.n_points {
            return Err(InvalidResult::ResponseOffScale {
                response: raw.response.get(),
                point_count: raw.n_points,
            });
        }
        Ok(Self {
            tick: raw.response,
            reaction_time_ms: raw.rt,
            point_count: raw.n_points,
        })
    }
}
