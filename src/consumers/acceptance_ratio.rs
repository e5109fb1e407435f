use crate::error::FlowError;
use crate::flow::{Connection, Consumer};
use crate::sample::{AuxiliaryData, Sample};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Consistent view of an [`AcceptanceRatio`] taken under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcceptanceSnapshot {
    pub sample_count: u64,
    pub accepted_count: u64,
    pub ratio: f64,
}

#[derive(Debug)]
struct AcceptanceState<S> {
    sample_count: u64,
    accepted_count: u64,
    previous_sample: Option<S>,
}

/// Running acceptance ratio of a chain-based sampler.
///
/// A sample counts as accepted when it differs from its predecessor in any
/// component. This assumes the sampler never proposes a point equal to the
/// current one, so a repeated sample always means a rejected proposal. The
/// first sample is always accepted.
///
/// `consume` and `get` are serialized by one lock per instance.
#[derive(Debug)]
pub struct AcceptanceRatio<S: Sample> {
    state: Mutex<AcceptanceState<S>>,
    connection: Connection,
}

impl<S: Sample> Default for AcceptanceRatio<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample> AcceptanceRatio<S> {
    /// Creates an accumulator that has seen no samples.
    pub fn new() -> Self {
        AcceptanceRatio {
            state: Mutex::new(AcceptanceState {
                sample_count: 0,
                accepted_count: 0,
                previous_sample: None,
            }),
            connection: Connection::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AcceptanceState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepted samples divided by samples seen.
    ///
    /// Returns `NaN` before the first sample has been consumed.
    pub fn get(&self) -> f64 {
        let state = self.lock_state();
        state.accepted_count as f64 / state.sample_count as f64
    }

    /// Number of samples consumed so far.
    pub fn sample_count(&self) -> u64 {
        self.lock_state().sample_count
    }

    /// Number of samples that differed from their predecessor, the first included.
    pub fn accepted_count(&self) -> u64 {
        self.lock_state().accepted_count
    }

    /// Counts and ratio read under a single lock acquisition.
    ///
    /// `ratio` is `NaN` while `sample_count` is 0.
    pub fn snapshot(&self) -> AcceptanceSnapshot {
        let state = self.lock_state();
        AcceptanceSnapshot {
            sample_count: state.sample_count,
            accepted_count: state.accepted_count,
            ratio: state.accepted_count as f64 / state.sample_count as f64,
        }
    }
}

impl<S: Sample> Consumer<S> for AcceptanceRatio<S> {
    fn name(&self) -> &'static str {
        "acceptance_ratio"
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn consume(&self, sample: S, _aux: AuxiliaryData) -> Result<(), FlowError> {
        let mut state = self.lock_state();

        let accepted = match &state.previous_sample {
            None => true,
            Some(previous) => {
                if previous.dim() != sample.dim() {
                    return Err(FlowError::DimensionMismatch {
                        stage: self.name(),
                        expected: previous.dim(),
                        found: sample.dim(),
                    });
                }
                sample.differs_from(previous)
            }
        };

        state.sample_count += 1;
        if accepted {
            state.accepted_count += 1;
        }
        state.previous_sample = Some(sample);
        Ok(())
    }
}
