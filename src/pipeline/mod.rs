//! Operator pipelines
//!
//! A pipeline is an ordered, append-only sequence of operators evaluated as
//! a short-circuiting left fold. Appending produces a new pipeline that
//! shares the existing operator instances, so a derived pipeline never
//! observes operators appended to a sibling.

pub mod optimizer;

use std::fmt;
use std::sync::Arc;

use crate::operator::Operator;

pub use optimizer::{commutative, optimize};

pub struct Pipeline<T> {
    operators: Vec<Arc<Operator<T>>>,
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            operators: self.operators.clone(),
        }
    }
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<T> Pipeline<T> {
    pub fn new() -> Self {
        Self {
            operators: Vec::new(),
        }
    }

    /// A copy of this pipeline with `operator` appended.
    pub fn with(&self, operator: Operator<T>) -> Self {
        let mut operators = Vec::with_capacity(self.operators.len() + 1);
        operators.extend(self.operators.iter().cloned());
        operators.push(Arc::new(operator));
        Self { operators }
    }

    /// The cost-optimized ordering of this pipeline.
    pub fn optimized(&self) -> Self {
        Self {
            operators: optimize(&self.operators),
        }
    }

    /// Run `element` through every operator, stopping at the first one
    /// that rejects it.
    pub fn apply(&self, element: T) -> Option<T> {
        let mut current = element;
        for operator in &self.operators {
            let (next, keep) = operator.apply(current);
            if !keep {
                return None;
            }
            current = next;
        }
        Some(current)
    }

    /// Whether some operator can no longer keep any element, so pulling
    /// more input cannot change the result.
    pub fn is_saturated(&self) -> bool {
        self.operators.iter().any(|operator| operator.is_saturated())
    }

    pub fn operators(&self) -> &[Arc<Operator<T>>] {
        &self.operators
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|operator| operator.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn empty_pipeline_is_identity() {
        let pipeline = Pipeline::<i32>::new();
        assert_eq!(pipeline.apply(3), Some(3));
        assert!(pipeline.is_empty());
    }

    #[test]
    fn rejected_elements_never_reach_downstream() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let pipeline = Pipeline::new()
            .with(Operator::filter(|x: &i32| *x > 2))
            .with(Operator::peek(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        let kept: Vec<_> = (1..=5).filter_map(|x| pipeline.apply(x)).collect();
        assert_eq!(kept, vec![3, 4, 5]);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn siblings_do_not_share_appended_operators() {
        let base = Pipeline::new().with(Operator::map(|x: i32| x + 1));
        let left = base.with(Operator::filter(|x: &i32| x % 2 == 0));
        let right = base.with(Operator::map(|x: i32| x * 10));

        assert_eq!(base.names(), vec!["map"]);
        assert_eq!(left.names(), vec!["map", "filter"]);
        assert_eq!(right.names(), vec!["map", "map"]);
        assert_eq!(left.apply(2), None);
        assert_eq!(right.apply(2), Some(30));
    }

    #[test]
    fn saturation_follows_limit() {
        let pipeline = Pipeline::new().with(Operator::limit(1).unwrap());
        assert!(!pipeline.is_saturated());
        assert_eq!(pipeline.apply(9), Some(9));
        assert!(pipeline.is_saturated());
    }
}
