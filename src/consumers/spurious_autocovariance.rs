//! Running multi-lag autocovariance
//!
//! For every lag `l < lag_length` the accumulator tracks
//!
//! ```text
//! γ(l) = 1/(n-l) Σ_{t=1}^{n-l} (x_{t+l} - x̄)·(x_t - x̄)
//! ```
//!
//! For vector samples this is the trace of the lagged cross-covariance
//! matrix rather than the full matrix, hence "spurious". For scalar samples
//! it is the ordinary sample autocovariance.
//!
//! Expanding the product splits `γ(l)` into parts that only depend on the
//! sample pairs at lag `l`:
//!
//! ```text
//! α(l) = mean of x_{t+l}·x_t          (scalar)
//! β(l) = mean of x_{t+l} + x_t        (vector)
//! γ(l) = α(l) - x̄·β(l) + x̄·x̄
//! ```
//!
//! Each new sample `x_n` contributes exactly one new pair per lag, so `α`,
//! `β` and `x̄` are updated with the incremental mean recurrence
//! `v += (pair - v) / pairs` using only the last `lag_length` samples.

use crate::config::StatsConfig;
use crate::error::FlowError;
use crate::flow::{Connection, Consumer};
use crate::sample::{AuxiliaryData, Sample, Scalar};
use crate::window::LagWindow;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Consistent view of a [`SpuriousAutocovariance`] taken under its lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocovarianceSnapshot<T: Scalar> {
    pub sample_count: u64,
    pub lag_length: usize,
    pub values: Vec<T>,
}

/// Row-major `lag_length × dim` matrix of running pair sums.
#[derive(Debug, Clone)]
struct LagMatrix<T> {
    values: Vec<T>,
    cols: usize,
}

impl<T: Scalar> LagMatrix<T> {
    fn zeros(rows: usize, cols: usize) -> Self {
        LagMatrix {
            values: vec![T::default(); rows * cols],
            cols,
        }
    }

    fn row(&self, row: usize) -> &[T] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.values[row * self.cols..(row + 1) * self.cols]
    }
}

/// Shape-dependent state, created from the first sample.
#[derive(Debug)]
struct LagMoments<S: Sample> {
    mean: S,
    alpha: Vec<S::Scalar>,
    beta: LagMatrix<S::Scalar>,
    recent: LagWindow<S>,
}

impl<S: Sample> LagMoments<S> {
    fn new(first: &S, lag_length: usize) -> Self {
        let mut mean = first.clone();
        for j in 0..mean.dim() {
            *mean.component_mut(j) = S::Scalar::default();
        }

        LagMoments {
            mean,
            alpha: vec![S::Scalar::default(); lag_length],
            beta: LagMatrix::zeros(lag_length, first.dim()),
            recent: LagWindow::new(lag_length),
        }
    }

    fn dim(&self) -> usize {
        self.mean.dim()
    }
}

#[derive(Debug)]
struct AutocovarianceState<S: Sample> {
    sample_count: u64,
    moments: Option<LagMoments<S>>,
}

/// Accumulator for the running autocovariance at lags `0..lag_length`.
///
/// `consume` and `get` are serialized by one lock per instance; the
/// recurrences are only valid when applied in strict sequence.
#[derive(Debug)]
pub struct SpuriousAutocovariance<S: Sample> {
    lag_length: usize,
    state: Mutex<AutocovarianceState<S>>,
    connection: Connection,
}

impl<S: Sample> SpuriousAutocovariance<S> {
    /// Creates an accumulator for lags `0..lag_length`
    ///
    /// # Panics
    /// Panics if `lag_length` is 0
    pub fn new(lag_length: usize) -> Self {
        assert!(lag_length > 0, "lag_length must be greater than 0");
        SpuriousAutocovariance {
            lag_length,
            state: Mutex::new(AutocovarianceState {
                sample_count: 0,
                moments: None,
            }),
            connection: Connection::new(),
        }
    }

    /// Creates an accumulator from a validated configuration.
    pub fn from_config(config: &StatsConfig) -> Result<Self, FlowError> {
        config.validate()?;
        Ok(Self::new(config.lag_length))
    }

    fn lock_state(&self) -> MutexGuard<'_, AutocovarianceState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of lags tracked, as given at construction.
    pub fn lag_length(&self) -> usize {
        self.lag_length
    }

    /// Number of samples consumed so far.
    pub fn sample_count(&self) -> u64 {
        self.lock_state().sample_count
    }

    /// Number of samples currently retained for pairing.
    pub fn window_len(&self) -> usize {
        self.lock_state()
            .moments
            .as_ref()
            .map_or(0, |moments| moments.recent.len())
    }

    /// Autocovariance at lags `0..lag_length`.
    ///
    /// Lags without any sample pair yet (all lags before the first sample,
    /// lags `>= n` afterwards) are reported as zero.
    pub fn get(&self) -> Vec<S::Scalar> {
        let state = self.lock_state();
        self.estimate(&state)
    }

    /// Sample count and autocovariance read under a single lock acquisition.
    pub fn snapshot(&self) -> AutocovarianceSnapshot<S::Scalar> {
        let state = self.lock_state();
        AutocovarianceSnapshot {
            sample_count: state.sample_count,
            lag_length: self.lag_length,
            values: self.estimate(&state),
        }
    }

    fn estimate(&self, state: &AutocovarianceState<S>) -> Vec<S::Scalar> {
        let mut values = vec![S::Scalar::default(); self.lag_length];
        let Some(moments) = &state.moments else {
            return values;
        };

        let valid = (state.sample_count as usize).min(self.lag_length);
        let mean_sq = moments.mean.dot(&moments.mean);
        for (lag, value) in values.iter_mut().enumerate().take(valid) {
            let cross = moments
                .beta
                .row(lag)
                .iter()
                .enumerate()
                .fold(S::Scalar::default(), |acc, (j, &b)| {
                    acc + moments.mean.component(j) * b
                });
            *value = moments.alpha[lag] - cross + mean_sq;
        }
        values
    }
}

impl<S: Sample> Consumer<S> for SpuriousAutocovariance<S> {
    fn name(&self) -> &'static str {
        "spurious_autocovariance"
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn consume(&self, sample: S, _aux: AuxiliaryData) -> Result<(), FlowError> {
        let mut guard = self.lock_state();
        let state = &mut *guard;

        let moments = state.moments.get_or_insert_with(|| {
            debug!(
                dim = sample.dim(),
                lag_length = self.lag_length,
                "initializing autocovariance state"
            );
            LagMoments::new(&sample, self.lag_length)
        });
        if moments.dim() != sample.dim() {
            return Err(FlowError::DimensionMismatch {
                stage: self.name(),
                expected: moments.dim(),
                found: sample.dim(),
            });
        }

        state.sample_count += 1;
        let n = state.sample_count;

        // recent[i] is the sample i steps back; recent[0] is the new one.
        moments.recent.push(sample.clone());
        for (lag, earlier) in moments.recent.iter().enumerate() {
            let pairs = S::Scalar::from_count(n - lag as u64);

            let alpha = &mut moments.alpha[lag];
            *alpha = *alpha + (sample.dot(earlier) - *alpha) / pairs;

            for (j, beta) in moments.beta.row_mut(lag).iter_mut().enumerate() {
                let pair_sum = sample.component(j) + earlier.component(j);
                *beta = *beta + (pair_sum - *beta) / pairs;
            }
        }

        let mut update = sample;
        update.sub_assign_sample(&moments.mean);
        update.div_assign_scalar(S::Scalar::from_count(n));
        moments.mean.add_assign_sample(&update);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct evaluation of γ(l) over the full history.
    fn reference(samples: &[Vec<f64>], lag_length: usize) -> Vec<f64> {
        let n = samples.len();
        let dim = samples[0].len();
        let mean: Vec<f64> = (0..dim)
            .map(|j| samples.iter().map(|s| s[j]).sum::<f64>() / n as f64)
            .collect();

        (0..lag_length)
            .map(|lag| {
                if lag >= n {
                    return 0.0;
                }
                let sum: f64 = (0..n - lag)
                    .map(|t| {
                        (0..dim)
                            .map(|j| (samples[t + lag][j] - mean[j]) * (samples[t][j] - mean[j]))
                            .sum::<f64>()
                    })
                    .sum();
                sum / (n - lag) as f64
            })
            .collect()
    }

    fn lcg_samples(count: usize, dim: usize) -> Vec<Vec<f64>> {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        let mut previous = vec![0.0; dim];
        (0..count)
            .map(|_| {
                previous = previous.iter().map(|p| 0.7 * p + next() - 0.5).collect();
                previous.clone()
            })
            .collect()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (lag, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a - e).abs() < 1e-9 * e.abs().max(1.0),
                "lag {}: got {}, expected {}",
                lag,
                a,
                e
            );
        }
    }

    #[test]
    fn empty_accumulator_reports_zeros() {
        let acc: SpuriousAutocovariance<Vec<f64>> = SpuriousAutocovariance::new(4);
        assert_eq!(acc.get(), vec![0.0; 4]);
        assert_eq!(acc.window_len(), 0);
    }

    #[test]
    fn single_sample_has_zero_autocovariance() {
        let acc: SpuriousAutocovariance<Vec<f64>> = SpuriousAutocovariance::new(3);
        acc.consume(vec![2.0, -1.0], AuxiliaryData::new()).unwrap();
        assert_close(&acc.get(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn scalar_ramp_matches_hand_computation() {
        let acc: SpuriousAutocovariance<f64> = SpuriousAutocovariance::new(5);
        for x in [1.0, 2.0, 3.0, 4.0] {
            acc.consume(x, AuxiliaryData::new()).unwrap();
        }
        assert_close(&acc.get(), &[1.25, 1.25 / 3.0, -0.75, -2.25, 0.0]);
    }

    #[test]
    fn lag_zero_is_population_variance() {
        let samples = lcg_samples(200, 1);
        let acc = SpuriousAutocovariance::new(3);
        for s in &samples {
            acc.consume(s[0], AuxiliaryData::new()).unwrap();
        }

        let mean = samples.iter().map(|s| s[0]).sum::<f64>() / samples.len() as f64;
        let variance = samples
            .iter()
            .map(|s| (s[0] - mean).powi(2))
            .sum::<f64>()
            / samples.len() as f64;
        assert!((acc.get()[0] - variance).abs() < 1e-12);
    }

    #[test]
    fn matches_full_history_evaluation() {
        let samples = lcg_samples(500, 3);
        let acc = SpuriousAutocovariance::new(10);
        for (i, s) in samples.iter().enumerate() {
            acc.consume(s.clone(), AuxiliaryData::new()).unwrap();
            if i % 97 == 0 || i < 12 {
                assert_close(&acc.get(), &reference(&samples[..=i], 10));
            }
        }
        assert_close(&acc.get(), &reference(&samples, 10));
    }

    #[test]
    fn shifted_pair_sequence_matches_reference() {
        // (1,2), (2,3), ..., (20,21)
        let samples: Vec<Vec<f64>> = (1..=20).map(|k| vec![k as f64, k as f64 + 1.0]).collect();
        let acc = SpuriousAutocovariance::new(10);
        for s in &samples {
            acc.consume(s.clone(), AuxiliaryData::new()).unwrap();
        }
        let values = acc.get();
        assert_close(&values, &reference(&samples, 10));
        assert!((values[0] - 66.5).abs() < 1e-9);
    }

    #[test]
    fn window_never_exceeds_lag_length() {
        let acc = SpuriousAutocovariance::new(4);
        for i in 0..100 {
            acc.consume(vec![i as f64], AuxiliaryData::new()).unwrap();
            assert!(acc.window_len() <= 4);
        }
        assert_eq!(acc.window_len(), 4);
        assert_eq!(acc.sample_count(), 100);
    }

    #[test]
    fn dimension_change_is_rejected() {
        let acc: SpuriousAutocovariance<Vec<f64>> = SpuriousAutocovariance::new(2);
        acc.consume(vec![1.0, 2.0], AuxiliaryData::new()).unwrap();
        let before = acc.get();

        let err = acc.consume(vec![1.0], AuxiliaryData::new()).unwrap_err();
        assert!(matches!(err, FlowError::DimensionMismatch { expected: 2, found: 1, .. }));
        assert_eq!(acc.get(), before);
        assert_eq!(acc.sample_count(), 1);
    }

    #[test]
    #[should_panic(expected = "lag_length must be greater than 0")]
    fn zero_lag_length_panics() {
        let _acc: SpuriousAutocovariance<f64> = SpuriousAutocovariance::new(0);
    }

    #[test]
    fn single_precision_samples_are_supported() {
        let acc: SpuriousAutocovariance<[f32; 2]> = SpuriousAutocovariance::new(2);
        for k in 0..4 {
            acc.consume([k as f32, 0.0], AuxiliaryData::new()).unwrap();
        }
        let values = acc.get();
        assert!((values[0] - 1.25).abs() < 1e-5);
    }

    #[test]
    fn snapshot_is_serializable() {
        let acc = SpuriousAutocovariance::new(2);
        acc.consume(1.0_f64, AuxiliaryData::new()).unwrap();
        acc.consume(3.0_f64, AuxiliaryData::new()).unwrap();

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.sample_count, 2);
        assert_eq!(snapshot.lag_length, 2);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["values"][0], 1.0);
        assert_eq!(json["values"][1], -1.0);
    }
}
