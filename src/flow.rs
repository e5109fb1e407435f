//! Producer → filter → consumer connection model
//!
//! A [`SampleChannel`] fans every emitted sample out to the stages attached to
//! it, in attachment order, on the calling thread. Filters are wrapped in a
//! [`FilterStage`], which is itself a consumer owning a channel for its
//! derived samples, so chains of any depth are delivered before `emit`
//! returns.

use crate::error::FlowError;
use crate::sample::{AuxiliaryData, Sample};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace, warn};

/// Upstream slot of a stage.
///
/// A stage may be attached to exactly one upstream source; attaching it a
/// second time fails with [`FlowError::AlreadyAttached`].
#[derive(Debug, Default)]
pub struct Connection {
    attached: AtomicBool,
}

impl Connection {
    /// Creates a free slot.
    pub fn new() -> Self {
        Connection {
            attached: AtomicBool::new(false),
        }
    }

    /// Marks the slot as taken by an upstream source.
    pub fn claim(&self, stage: &'static str) -> Result<(), FlowError> {
        if self.attached.swap(true, Ordering::AcqRel) {
            return Err(FlowError::AlreadyAttached { stage });
        }
        Ok(())
    }

    /// True once an upstream source has claimed the slot.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

/// A stage that receives samples from an upstream source.
pub trait Consumer<S: Sample>: Send + Sync {
    /// Stage name used in logs and errors.
    fn name(&self) -> &'static str;

    /// The stage's upstream slot.
    fn connection(&self) -> &Connection;

    /// Processes one sample. Errors propagate back to the emitting producer.
    fn consume(&self, sample: S, aux: AuxiliaryData) -> Result<(), FlowError>;
}

/// One-to-many synchronous publisher.
pub struct SampleChannel<S: Sample> {
    consumers: RwLock<Vec<Arc<dyn Consumer<S>>>>,
}

impl<S: Sample> Default for SampleChannel<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample> std::fmt::Debug for SampleChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleChannel")
            .field("consumers", &self.consumer_count())
            .finish()
    }
}

impl<S: Sample> SampleChannel<S> {
    pub fn new() -> Self {
        SampleChannel {
            consumers: RwLock::new(Vec::new()),
        }
    }

    /// Registers `consumer` to receive every subsequently emitted sample
    ///
    /// # Errors
    /// - `AlreadyAttached` if the consumer already has an upstream source
    pub fn attach<C>(&self, consumer: Arc<C>) -> Result<(), FlowError>
    where
        C: Consumer<S> + 'static,
    {
        consumer.connection().claim(consumer.name())?;

        let mut consumers = self
            .consumers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        consumers.push(consumer);
        debug!(
            stage = consumers[consumers.len() - 1].name(),
            position = consumers.len(),
            "stage attached"
        );
        Ok(())
    }

    /// Delivers a sample to every attached stage, in attachment order
    ///
    /// Returns once all stages (and, through filters, their own attachments)
    /// have processed the sample. The first failing stage aborts delivery and
    /// its error is returned; stages that already consumed the sample keep
    /// their updated state.
    pub fn emit(&self, sample: S, aux: AuxiliaryData) -> Result<(), FlowError> {
        // Deliver from a snapshot so stages may attach further consumers
        // without contending on the registry lock.
        let consumers: Vec<Arc<dyn Consumer<S>>> = self
            .consumers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let Some((last, rest)) = consumers.split_last() else {
            return Ok(());
        };
        for consumer in rest {
            deliver(consumer.as_ref(), sample.clone(), aux.clone())?;
        }
        deliver(last.as_ref(), sample, aux)
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn deliver<S: Sample>(
    consumer: &dyn Consumer<S>,
    sample: S,
    aux: AuxiliaryData,
) -> Result<(), FlowError> {
    trace!(stage = consumer.name(), "delivering sample");
    consumer.consume(sample, aux).map_err(|err| {
        warn!(stage = consumer.name(), error = %err, "sample delivery failed");
        err
    })
}

/// Maps an incoming sample to zero or one outgoing sample.
pub trait Filter<In: Sample>: Send + Sync {
    type Output: Sample;

    fn name(&self) -> &'static str;

    fn filter(&self, sample: In, aux: AuxiliaryData) -> Option<(Self::Output, AuxiliaryData)>;
}

/// Consumer wrapper that runs a [`Filter`] and re-publishes its output.
pub struct FilterStage<In: Sample, F: Filter<In>> {
    filter: F,
    downstream: SampleChannel<F::Output>,
    connection: Connection,
    _input: PhantomData<fn(In)>,
}

impl<In: Sample, F: Filter<In>> FilterStage<In, F> {
    pub fn new(filter: F) -> Self {
        FilterStage {
            filter,
            downstream: SampleChannel::new(),
            connection: Connection::new(),
            _input: PhantomData,
        }
    }

    /// Attaches a stage to the filter's output.
    pub fn attach<C>(&self, consumer: Arc<C>) -> Result<(), FlowError>
    where
        C: Consumer<F::Output> + 'static,
    {
        self.downstream.attach(consumer)
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn downstream(&self) -> &SampleChannel<F::Output> {
        &self.downstream
    }
}

impl<In: Sample, F: Filter<In>> Consumer<In> for FilterStage<In, F> {
    fn name(&self) -> &'static str {
        self.filter.name()
    }

    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn consume(&self, sample: In, aux: AuxiliaryData) -> Result<(), FlowError> {
        match self.filter.filter(sample, aux) {
            Some((derived, aux)) => self.downstream.emit(derived, aux),
            None => {
                trace!(stage = self.filter.name(), "sample dropped by filter");
                Ok(())
            }
        }
    }
}
