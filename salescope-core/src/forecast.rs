//! Adaptive exponential-smoothing forecaster.
//!
//! The model is picked from the length of the monthly history:
//!
//! - fewer than 2 months: no forecast
//! - 2 to 23 months: additive trend, no seasonality (Holt)
//! - 24 months or more: additive trend plus additive 12-month seasonality (Holt-Winters)
//!
//! Smoothing weights are estimated by minimising the one-step-ahead squared error with
//! every weight kept inside [0, 1]. The fitted state is then projected six months ahead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::MonthlySeries;
use crate::month::YearMonth;
use crate::normalize::DatasetFingerprint;

pub const FORECAST_HORIZON: usize = 6;
pub const SEASONAL_PERIOD: usize = 12;
/// Two full seasonal cycles.
pub const SEASONAL_MIN_HISTORY: usize = 2 * SEASONAL_PERIOD;
pub const MIN_HISTORY: usize = 2;

/// Grid resolution of the first search pass.
const GRID_STEPS: usize = 10;
const REFINE_START_STEP: f64 = 0.05;
const REFINE_MIN_STEP: f64 = 1e-4;
const REFINE_MAX_ROUNDS: usize = 400;

// ============================================================================
// Model selection
// ============================================================================

/// Forecasting regime, chosen from the number of months of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Not enough history for any trend estimate.
    Unavailable,
    /// Additive trend, no seasonal term.
    Trend,
    /// Additive trend and additive seasonality of `period` months.
    TrendSeasonal { period: usize },
}

impl ModelSpec {
    pub fn select(months: usize) -> Self {
        if months < MIN_HISTORY {
            ModelSpec::Unavailable
        } else if months < SEASONAL_MIN_HISTORY {
            ModelSpec::Trend
        } else {
            ModelSpec::TrendSeasonal {
                period: SEASONAL_PERIOD,
            }
        }
    }

    fn period(&self) -> Option<usize> {
        match self {
            ModelSpec::TrendSeasonal { period } => Some(*period),
            _ => None,
        }
    }

    /// Number of smoothing weights the model estimates.
    fn weights(&self) -> usize {
        match self {
            ModelSpec::Unavailable => 0,
            ModelSpec::Trend => 2,
            ModelSpec::TrendSeasonal { .. } => 3,
        }
    }
}

/// Fitted smoothing weights, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Level
    pub alpha: f64,
    /// Trend
    pub beta: f64,
    /// Seasonal; absent for the trend-only model
    pub gamma: Option<f64>,
}

impl SmoothingParams {
    fn from_slice(w: &[f64]) -> Self {
        Self {
            alpha: w[0],
            beta: w[1],
            gamma: w.get(2).copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month: YearMonth,
    pub value: f64,
}

/// Why no forecast was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnavailableReason {
    InsufficientHistory { months: usize },
    FitFailed { detail: String },
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::InsufficientHistory { months } => write!(
                f,
                "not enough data (need at least {MIN_HISTORY} months, have {months})"
            ),
            UnavailableReason::FitFailed { detail } => write!(f, "model fit failed: {detail}"),
        }
    }
}

/// Either a full six-month projection or an explicit absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Forecast {
    Available {
        model: ModelSpec,
        params: SmoothingParams,
        /// In-sample sum of squared one-step errors at the chosen weights
        sse: f64,
        points: Vec<ForecastPoint>,
        #[serde(skip)]
        source: Option<DatasetFingerprint>,
    },
    Unavailable {
        reason: UnavailableReason,
        #[serde(skip)]
        source: Option<DatasetFingerprint>,
    },
}

impl Forecast {
    pub fn is_available(&self) -> bool {
        matches!(self, Forecast::Available { .. })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        match self {
            Forecast::Available { points, .. } => points,
            Forecast::Unavailable { .. } => &[],
        }
    }

    pub fn model(&self) -> ModelSpec {
        match self {
            Forecast::Available { model, .. } => *model,
            Forecast::Unavailable { .. } => ModelSpec::Unavailable,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&UnavailableReason> {
        match self {
            Forecast::Available { .. } => None,
            Forecast::Unavailable { reason, .. } => Some(reason),
        }
    }

    pub fn source(&self) -> Option<DatasetFingerprint> {
        match self {
            Forecast::Available { source, .. } | Forecast::Unavailable { source, .. } => *source,
        }
    }
}

// ============================================================================
// Smoothing recursions
// ============================================================================

/// Smoothing state just before the first observation that is scored.
#[derive(Debug, Clone, PartialEq)]
struct State {
    level: f64,
    trend: f64,
    /// Empty for the trend-only model; otherwise one slot per season position.
    seasonal: Vec<f64>,
}

/// Initial state plus the index of the first scored observation.
fn initial_state(spec: ModelSpec, data: &[f64]) -> (State, usize) {
    match spec.period() {
        None => (
            State {
                level: data[0],
                trend: data[1] - data[0],
                seasonal: Vec::new(),
            },
            1,
        ),
        Some(p) => {
            let cycles = data.len() / p;
            let means: Vec<f64> = (0..cycles)
                .map(|c| data[c * p..(c + 1) * p].iter().sum::<f64>() / p as f64)
                .collect();

            // Slope between the first and last complete cycle.
            let trend = (means[cycles - 1] - means[0]) / ((cycles - 1) * p) as f64;
            let centre = (p as f64 - 1.0) / 2.0;

            let mut seasonal = vec![0.0; p];
            for (i, s) in seasonal.iter_mut().enumerate() {
                let offset = trend * (i as f64 - centre);
                *s = (0..cycles)
                    .map(|c| data[c * p + i] - (means[c] + offset))
                    .sum::<f64>()
                    / cycles as f64;
            }
            let mean_s = seasonal.iter().sum::<f64>() / p as f64;
            for s in &mut seasonal {
                *s -= mean_s;
            }

            // Level one step before t = 0 on the first cycle's trend line.
            let level = means[0] - trend * (centre + 1.0);
            (
                State {
                    level,
                    trend,
                    seasonal,
                },
                0,
            )
        }
    }
}

/// Run the recursions over `data[start..]`, returning the SSE and the final state.
fn smooth(data: &[f64], init: &State, start: usize, params: &SmoothingParams) -> (f64, State) {
    let mut state = init.clone();
    let mut sse = 0.0;
    let p = state.seasonal.len();
    let (alpha, beta) = (params.alpha, params.beta);
    let gamma = params.gamma.unwrap_or(0.0);

    for (t, &y) in data.iter().enumerate().skip(start) {
        let season = if p > 0 { state.seasonal[t % p] } else { 0.0 };
        let predicted = state.level + state.trend + season;
        let err = y - predicted;
        sse += err * err;

        let prev_level = state.level;
        state.level = alpha * (y - season) + (1.0 - alpha) * (state.level + state.trend);
        state.trend = beta * (state.level - prev_level) + (1.0 - beta) * state.trend;
        if p > 0 {
            state.seasonal[t % p] = gamma * (y - state.level) + (1.0 - gamma) * season;
        }
    }

    (sse, state)
}

/// Project `horizon` steps past an observation count of `n`.
fn project(state: &State, n: usize, horizon: usize) -> Vec<f64> {
    let p = state.seasonal.len();
    (1..=horizon)
        .map(|h| {
            let season = if p > 0 {
                state.seasonal[(n + h - 1) % p]
            } else {
                0.0
            };
            state.level + h as f64 * state.trend + season
        })
        .collect()
}

// ============================================================================
// Parameter estimation
// ============================================================================

fn score(objective: &impl Fn(&[f64]) -> f64, w: &[f64]) -> f64 {
    let v = objective(w);
    if v.is_finite() { v } else { f64::INFINITY }
}

/// Minimise `objective` over the unit hypercube of dimension `dims`.
///
/// A coarse grid picks the starting point, then a compass search shrinks around it.
/// Ties keep the earlier candidate, so the result is deterministic.
fn minimise_unit_box(dims: usize, objective: impl Fn(&[f64]) -> f64) -> (Vec<f64>, f64) {
    let mut best = vec![0.0; dims];
    let mut best_score = f64::INFINITY;

    let mut idx = vec![0usize; dims];
    loop {
        let w: Vec<f64> = idx.iter().map(|&i| i as f64 / GRID_STEPS as f64).collect();
        let s = score(&objective, &w);
        if s < best_score {
            best_score = s;
            best = w;
        }

        // odometer increment
        let mut d = 0;
        while d < dims {
            idx[d] += 1;
            if idx[d] <= GRID_STEPS {
                break;
            }
            idx[d] = 0;
            d += 1;
        }
        if d == dims {
            break;
        }
    }

    if !best_score.is_finite() {
        return (best, best_score);
    }

    let mut step = REFINE_START_STEP;
    let mut rounds = 0;
    while step >= REFINE_MIN_STEP && rounds < REFINE_MAX_ROUNDS {
        rounds += 1;
        let mut improved = false;
        for d in 0..dims {
            for delta in [step, -step] {
                let mut w = best.clone();
                w[d] = (w[d] + delta).clamp(0.0, 1.0);
                if w[d] == best[d] {
                    continue;
                }
                let s = score(&objective, &w);
                if s < best_score {
                    best_score = s;
                    best = w;
                    improved = true;
                }
            }
        }
        if !improved {
            step /= 2.0;
        }
    }

    (best, best_score)
}

// ============================================================================
// Entry point
// ============================================================================

/// Forecast the next six months of `series`.
///
/// Never fails: short histories and numerical breakdowns both come back as
/// `Forecast::Unavailable` with the cause attached.
pub fn forecast(series: &MonthlySeries) -> Forecast {
    let source = series.source();
    let n = series.len();
    let spec = ModelSpec::select(n);
    debug!(months = n, model = ?spec, "selected smoothing model");

    let unavailable = |reason: UnavailableReason| Forecast::Unavailable { reason, source };

    let last = match (spec, series.last_month()) {
        (ModelSpec::Unavailable, _) | (_, None) => {
            return unavailable(UnavailableReason::InsufficientHistory { months: n });
        }
        (_, Some(last)) => last,
    };

    let data = series.values();
    if let Some(bad) = data.iter().position(|v| !v.is_finite()) {
        warn!(index = bad, "non-finite monthly total, skipping forecast");
        return unavailable(UnavailableReason::FitFailed {
            detail: format!("non-finite value at month {}", series.points()[bad].month),
        });
    }

    let (init, start) = initial_state(spec, &data);
    let (weights, sse) = minimise_unit_box(spec.weights(), |w| {
        smooth(&data, &init, start, &SmoothingParams::from_slice(w)).0
    });

    if !sse.is_finite() {
        warn!(model = ?spec, "smoothing fit did not converge");
        return unavailable(UnavailableReason::FitFailed {
            detail: "sum of squared errors is not finite".to_string(),
        });
    }

    let params = SmoothingParams::from_slice(&weights);
    let (_, fitted) = smooth(&data, &init, start, &params);
    let values = project(&fitted, n, FORECAST_HORIZON);

    if values.iter().any(|v| !v.is_finite()) {
        warn!(model = ?spec, "smoothing projection produced non-finite values");
        return unavailable(UnavailableReason::FitFailed {
            detail: "projection is not finite".to_string(),
        });
    }

    debug!(
        alpha = params.alpha,
        beta = params.beta,
        gamma = ?params.gamma,
        sse,
        "fitted smoothing model"
    );

    let mut month = last;
    let points = values
        .into_iter()
        .map(|value| {
            month = month.succ();
            ForecastPoint { month, value }
        })
        .collect();

    Forecast::Available {
        model: spec,
        params,
        sse,
        points,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_select_by_history_length() {
        assert_eq!(ModelSpec::select(0), ModelSpec::Unavailable);
        assert_eq!(ModelSpec::select(1), ModelSpec::Unavailable);
        assert_eq!(ModelSpec::select(2), ModelSpec::Trend);
        assert_eq!(ModelSpec::select(23), ModelSpec::Trend);
        assert_eq!(ModelSpec::select(24), ModelSpec::TrendSeasonal { period: 12 });
        assert_eq!(ModelSpec::select(60), ModelSpec::TrendSeasonal { period: 12 });
    }

    #[test]
    fn test_short_history_is_unavailable() {
        for values in [vec![], vec![1200.0]] {
            let series = MonthlySeries::from_values(ym(2023, 1), &values);
            let fc = forecast(&series);
            assert!(!fc.is_available());
            assert!(fc.points().is_empty());
            assert_eq!(
                fc.unavailable_reason(),
                Some(&UnavailableReason::InsufficientHistory { months: values.len() })
            );
        }
    }

    #[test]
    fn test_two_months_gives_six_finite_points() {
        let series = MonthlySeries::from_values(ym(2023, 1), &[1200.0, 700.0]);
        let fc = forecast(&series);

        assert_eq!(fc.model(), ModelSpec::Trend);
        let points = fc.points();
        assert_eq!(points.len(), FORECAST_HORIZON);
        assert_eq!(points[0].month, ym(2023, 3));
        assert_eq!(points[5].month, ym(2023, 8));
        assert!(points.iter().all(|p| p.value.is_finite()));
    }

    #[test]
    fn test_linear_trend_is_extrapolated() {
        let values: Vec<f64> = (0..12).map(|t| 100.0 + 10.0 * t as f64).collect();
        let series = MonthlySeries::from_values(ym(2022, 11), &values);
        let fc = forecast(&series);

        let points = fc.points();
        assert_eq!(points[0].month, ym(2023, 11));
        for (h, p) in points.iter().enumerate() {
            let expected = 210.0 + 10.0 * (h + 1) as f64;
            assert!((p.value - expected).abs() < 1e-6, "h={h}: {} vs {expected}", p.value);
        }
    }

    #[test]
    fn test_constant_series_forecasts_flat() {
        let series = MonthlySeries::from_values(ym(2023, 1), &[500.0; 8]);
        let fc = forecast(&series);
        assert!(fc.is_available());
        assert!(fc.points().iter().all(|p| (p.value - 500.0).abs() < 1e-9));
    }

    #[test]
    fn test_weights_stay_in_unit_interval() {
        let values = [120.0, 80.0, 150.0, 95.0, 170.0, 60.0, 140.0, 130.0, 90.0, 200.0];
        let series = MonthlySeries::from_values(ym(2023, 1), &values);
        match forecast(&series) {
            Forecast::Available { params, sse, .. } => {
                assert!((0.0..=1.0).contains(&params.alpha));
                assert!((0.0..=1.0).contains(&params.beta));
                assert_eq!(params.gamma, None);
                assert!(sse.is_finite());
            }
            other => panic!("expected a forecast, got {other:?}"),
        }
    }

    #[test]
    fn test_seasonal_shape_is_preserved() {
        // Three years with a March peak and a May trough on a rising base.
        let values: Vec<f64> = (0..36)
            .map(|t| {
                let bump = match t % 12 {
                    2 => 400.0,
                    4 => -400.0,
                    _ => 0.0,
                };
                1000.0 + 5.0 * t as f64 + bump
            })
            .collect();
        let series = MonthlySeries::from_values(ym(2021, 1), &values);
        let fc = forecast(&series);

        assert_eq!(fc.model(), ModelSpec::TrendSeasonal { period: 12 });
        let v: Vec<f64> = fc.points().iter().map(|p| p.value).collect();
        assert_eq!(v.len(), 6);
        assert_eq!(fc.points()[0].month, ym(2024, 1));
        // March (index 2) above its neighbours, May (index 4) below
        assert!(v[2] > v[1] && v[2] > v[3], "{v:?}");
        assert!(v[4] < v[3] && v[4] < v[5], "{v:?}");
        assert!((v[0] - 1180.0).abs() < 50.0, "{v:?}");
    }

    #[test]
    fn test_non_finite_input_is_fit_failure() {
        let series = MonthlySeries::from_values(ym(2023, 1), &[1.0, f64::NAN, 3.0]);
        let fc = forecast(&series);
        assert!(matches!(
            fc.unavailable_reason(),
            Some(UnavailableReason::FitFailed { .. })
        ));
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let values: Vec<f64> = (0..30).map(|t| ((t * 37) % 11) as f64 * 13.0 + t as f64).collect();
        let series = MonthlySeries::from_values(ym(2020, 6), &values);
        assert_eq!(forecast(&series), forecast(&series));
    }

    #[test]
    fn test_minimiser_finds_interior_minimum() {
        let (w, s) = minimise_unit_box(2, |w| (w[0] - 0.37).powi(2) + (w[1] - 0.81).powi(2));
        assert!((w[0] - 0.37).abs() < 1e-3);
        assert!((w[1] - 0.81).abs() < 1e-3);
        assert!(s < 1e-6);
    }
}
