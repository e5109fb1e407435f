//! Sample capabilities and the auxiliary payload that travels with each sample.
//!
//! Accumulators are written against [`Sample`] only: any container that offers
//! indexed access to a fixed number of [`Scalar`] components can flow through a
//! pipeline. Element-wise arithmetic is provided in terms of that access, so a
//! new container type only has to describe its shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Floating-point component type of a sample.
pub trait Scalar:
    Copy
    + PartialEq
    + PartialOrd
    + Default
    + fmt::Debug
    + Serialize
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Converts a sample count into the scalar type.
    fn from_count(count: u64) -> Self;
}

impl Scalar for f64 {
    fn from_count(count: u64) -> Self {
        count as f64
    }
}

impl Scalar for f32 {
    fn from_count(count: u64) -> Self {
        count as f32
    }
}

/// A vector-like sample value.
///
/// The dimension is fixed for the lifetime of a pipeline but only known at
/// runtime, once the first sample arrives.
pub trait Sample: Clone + Send + Sync + 'static {
    type Scalar: Scalar;

    /// Number of components.
    fn dim(&self) -> usize;

    /// Returns component `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.dim()`.
    fn component(&self, index: usize) -> Self::Scalar;

    /// Returns a mutable reference to component `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.dim()`.
    fn component_mut(&mut self, index: usize) -> &mut Self::Scalar;

    /// Element-wise `self += other`.
    fn add_assign_sample(&mut self, other: &Self) {
        for i in 0..self.dim() {
            let value = self.component(i) + other.component(i);
            *self.component_mut(i) = value;
        }
    }

    /// Element-wise `self -= other`.
    fn sub_assign_sample(&mut self, other: &Self) {
        for i in 0..self.dim() {
            let value = self.component(i) - other.component(i);
            *self.component_mut(i) = value;
        }
    }

    /// Divides every component by `divisor`.
    fn div_assign_scalar(&mut self, divisor: Self::Scalar) {
        for i in 0..self.dim() {
            let value = self.component(i) / divisor;
            *self.component_mut(i) = value;
        }
    }

    /// Inner product of two samples of equal dimension.
    fn dot(&self, other: &Self) -> Self::Scalar {
        (0..self.dim()).fold(Self::Scalar::default(), |acc, i| {
            acc + self.component(i) * other.component(i)
        })
    }

    /// True when any component differs from the corresponding one in `other`.
    fn differs_from(&self, other: &Self) -> bool {
        (0..self.dim()).any(|i| self.component(i) != other.component(i))
    }
}

macro_rules! scalar_sample {
    ($($ty:ty),*) => {
        $(
            impl Sample for $ty {
                type Scalar = $ty;

                fn dim(&self) -> usize {
                    1
                }

                fn component(&self, index: usize) -> $ty {
                    assert!(index == 0, "scalar sample has a single component, got index {}", index);
                    *self
                }

                fn component_mut(&mut self, index: usize) -> &mut $ty {
                    assert!(index == 0, "scalar sample has a single component, got index {}", index);
                    self
                }
            }
        )*
    };
}

scalar_sample!(f32, f64);

impl<T: Scalar> Sample for Vec<T> {
    type Scalar = T;

    fn dim(&self) -> usize {
        self.len()
    }

    fn component(&self, index: usize) -> T {
        self[index]
    }

    fn component_mut(&mut self, index: usize) -> &mut T {
        &mut self[index]
    }
}

impl<T: Scalar, const N: usize> Sample for [T; N] {
    type Scalar = T;

    fn dim(&self) -> usize {
        N
    }

    fn component(&self, index: usize) -> T {
        self[index]
    }

    fn component_mut(&mut self, index: usize) -> &mut T {
        &mut self[index]
    }
}

/// Opaque per-sample metadata (acceptance flags, weights, ...).
///
/// Nothing in the pipeline inspects the entries; filters forward the bag
/// unchanged and accumulators ignore it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryData(BTreeMap<String, serde_json::Value>);

impl AuxiliaryData {
    /// Creates an empty bag.
    pub fn new() -> Self {
        AuxiliaryData(BTreeMap::new())
    }

    /// Stores `value` under `key`, returning the previous entry if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Option<serde_json::Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the entry stored under `key`.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
