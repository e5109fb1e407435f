use crate::flow::{Filter, FilterStage};
use crate::sample::{AuxiliaryData, Sample};

/// Extracts two fixed components of every sample as a 2-element sample.
///
/// Useful for feeding a pair of components into a statistic of its own, e.g.
/// their joint autocovariance. The auxiliary data is forwarded untouched. The
/// configured indices are immutable, so the filter can be shared across
/// threads without locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentPairSplitter {
    components: [usize; 2],
}

impl ComponentPairSplitter {
    pub fn new(first: usize, second: usize) -> Self {
        ComponentPairSplitter {
            components: [first, second],
        }
    }

    pub fn components(&self) -> [usize; 2] {
        self.components
    }

    /// Wraps the splitter in a stage that can be attached to a channel.
    pub fn into_stage<S: Sample>(self) -> FilterStage<S, Self> {
        FilterStage::new(self)
    }
}

impl<S: Sample> Filter<S> for ComponentPairSplitter {
    type Output = [S::Scalar; 2];

    fn name(&self) -> &'static str {
        "component_pair_splitter"
    }

    /// # Panics
    /// Panics if either configured index is out of range for `sample`.
    fn filter(&self, sample: S, aux: AuxiliaryData) -> Option<([S::Scalar; 2], AuxiliaryData)> {
        let [first, second] = self.components;
        assert!(
            first < sample.dim() && second < sample.dim(),
            "component indices ({}, {}) out of range for sample of dimension {}",
            first,
            second,
            sample.dim()
        );

        Some(([sample.component(first), sample.component(second)], aux))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_components_in_configured_order() {
        let splitter = ComponentPairSplitter::new(1, 3);
        let mut aux = AuxiliaryData::new();
        aux.insert("accepted", true);

        let (pair, forwarded) = splitter
            .filter(vec![10.0_f64, 20.0, 30.0, 40.0], aux.clone())
            .unwrap();
        assert_eq!(pair, [20.0, 40.0]);
        assert_eq!(forwarded, aux);
    }

    #[test]
    fn reversed_and_repeated_indices() {
        let sample = [1.0_f64, 2.0, 3.0];
        let reversed = ComponentPairSplitter::new(2, 0)
            .filter(sample, AuxiliaryData::new())
            .unwrap();
        assert_eq!(reversed.0, [3.0, 1.0]);

        let repeated = ComponentPairSplitter::new(1, 1)
            .filter(sample, AuxiliaryData::new())
            .unwrap();
        assert_eq!(repeated.0, [2.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_index_fails_fast() {
        let _ = ComponentPairSplitter::new(0, 4).filter(vec![1.0_f64, 2.0], AuxiliaryData::new());
    }
}
