use crate::error::FlowError;
use crate::flow::{Consumer, SampleChannel};
use crate::sample::{AuxiliaryData, Sample};
use std::sync::Arc;
use tracing::debug;

/// Producer that emits a given sequence of samples, one at a time.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sampleflow::consumers::LastSample;
/// use sampleflow::producers::Range;
///
/// let producer: Range<f64> = Range::new();
/// let last = Arc::new(LastSample::new());
/// producer.attach(last.clone()).unwrap();
///
/// producer.sample(1..=9_i32).unwrap();
/// assert_eq!(last.get(), Some(9.0));
/// ```
#[derive(Debug, Default)]
pub struct Range<S: Sample> {
    channel: SampleChannel<S>,
}

impl<S: Sample> Range<S> {
    pub fn new() -> Self {
        Range {
            channel: SampleChannel::new(),
        }
    }

    pub fn attach<C>(&self, consumer: Arc<C>) -> Result<(), FlowError>
    where
        C: Consumer<S> + 'static,
    {
        self.channel.attach(consumer)
    }

    /// Emits every value of `samples` with empty auxiliary data
    ///
    /// Stops at the first delivery error and returns it.
    ///
    /// # Returns
    /// Number of samples emitted
    pub fn sample<I>(&self, samples: I) -> Result<u64, FlowError>
    where
        I: IntoIterator,
        I::Item: Into<S>,
    {
        let mut emitted = 0;
        for sample in samples {
            self.channel.emit(sample.into(), AuxiliaryData::new())?;
            emitted += 1;
        }
        debug!(emitted, consumers = self.channel.consumer_count(), "range exhausted");
        Ok(emitted)
    }

    pub fn channel(&self) -> &SampleChannel<S> {
        &self.channel
    }
}
