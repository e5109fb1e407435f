use crate::error::FlowError;
use crate::flow::{Connection, Consumer};
use crate::sample::{AuxiliaryData, Sample};
use std::sync::{Mutex, PoisonError};

/// Keeps the most recent sample.
#[derive(Debug)]
pub struct LastSample<S: Sample> {
    last: Mutex<Option<S>>,
    connection: Connection,
}

impl<S: Sample> Default for LastSample<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample> LastSample<S> {
    pub fn new() -> Self {
        LastSample {
            last: Mutex::new(None),
            connection: Connection::new(),
        }
    }

    /// The last sample seen, or `None` before the first one arrives.
    pub fn get(&self) -> Option<S> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: Sample> Consumer<S> for LastSample<S> {
    fn name(&self) -> &'static str {
        "last_sample"
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn consume(&self, sample: S, _aux: AuxiliaryData) -> Result<(), FlowError> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(sample);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_latest_sample() {
        let last: LastSample<f64> = LastSample::new();
        assert_eq!(last.get(), None);

        for x in [1.0, 2.0, 9.0] {
            last.consume(x, AuxiliaryData::new()).unwrap();
        }
        assert_eq!(last.get(), Some(9.0));
    }
}
