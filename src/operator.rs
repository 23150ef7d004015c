//! Pipeline operators
//!
//! An operator is one step of a pipeline: it receives an element and
//! returns the (possibly transformed) element together with a flag telling
//! whether downstream operators should see it. Stateful operators keep
//! their state behind atomics or a mutex so a single instance can be shared
//! by every worker of a concurrent terminal operation.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{StreamError, StreamResult};

const FILTER_COST: u32 = 1;
const DISTINCT_COST: u32 = 2;
const DEFAULT_COST: u32 = 1;

/// The closed set of operators a stream can append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Filter,
    Map,
    Limit,
    Skip,
    Distinct,
    Peek,
}

impl OperatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Filter => "filter",
            OperatorKind::Map => "map",
            OperatorKind::Limit => "limit",
            OperatorKind::Skip => "skip",
            OperatorKind::Distinct => "distinct",
            OperatorKind::Peek => "peek",
        }
    }

    /// Relative evaluation cost used by the optimizer.
    pub fn cost(&self) -> u32 {
        match self {
            OperatorKind::Filter => FILTER_COST,
            OperatorKind::Distinct => DISTINCT_COST,
            _ => DEFAULT_COST,
        }
    }

    pub fn is_stateful(&self) -> bool {
        matches!(
            self,
            OperatorKind::Limit | OperatorKind::Skip | OperatorKind::Distinct
        )
    }

    /// Whether swapping two adjacent operators of these kinds leaves the
    /// accepted element set unchanged. Only `{filter, distinct}` commutes.
    pub fn commutes_with(&self, other: &OperatorKind) -> bool {
        matches!(
            (self, other),
            (OperatorKind::Filter, OperatorKind::Distinct)
                | (OperatorKind::Distinct, OperatorKind::Filter)
        )
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type ApplyFn<T> = Box<dyn Fn(T) -> (T, bool) + Send + Sync>;
type SaturatedFn = Box<dyn Fn() -> bool + Send + Sync>;

/// A single pipeline step.
pub struct Operator<T> {
    kind: OperatorKind,
    apply: ApplyFn<T>,
    saturated: Option<SaturatedFn>,
}

impl<T> fmt::Debug for Operator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.kind.name())
            .field("cost", &self.kind.cost())
            .field("stateful", &self.kind.is_stateful())
            .finish()
    }
}

impl<T> Operator<T> {
    fn new<F>(kind: OperatorKind, apply: F) -> Self
    where
        F: Fn(T) -> (T, bool) + Send + Sync + 'static,
    {
        Self {
            kind,
            apply: Box::new(apply),
            saturated: None,
        }
    }

    /// Keeps the elements matching `predicate`.
    pub fn filter<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::new(OperatorKind::Filter, move |x| {
            let keep = predicate(&x);
            (x, keep)
        })
    }

    /// Replaces every element with `transform(element)`.
    pub fn map<F>(transform: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        Self::new(OperatorKind::Map, move |x| (transform(x), true))
    }

    /// Invokes `action` on every element reaching this step.
    pub fn peek<F>(action: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::new(OperatorKind::Peek, move |x| {
            action(&x);
            (x, true)
        })
    }

    /// Keeps the first `n` elements that reach this step.
    pub fn limit(n: i64) -> StreamResult<Self> {
        let n = usize::try_from(n).map_err(|_| StreamError::illegal_argument("Limit", n))?;
        let admitted = Arc::new(AtomicUsize::new(0));
        let counter = admitted.clone();
        let mut operator = Self::new(OperatorKind::Limit, move |x| {
            let keep = counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| (c < n).then_some(c + 1))
                .is_ok();
            (x, keep)
        });
        operator.saturated = Some(Box::new(move || admitted.load(Ordering::SeqCst) >= n));
        Ok(operator)
    }

    /// Rejects the first `n` elements that reach this step.
    pub fn skip(n: i64) -> StreamResult<Self> {
        let n = usize::try_from(n).map_err(|_| StreamError::illegal_argument("Skip", n))?;
        let skipped = AtomicUsize::new(0);
        Ok(Self::new(OperatorKind::Skip, move |x| {
            let skipping = skipped
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| (c < n).then_some(c + 1))
                .is_ok();
            (x, !skipping)
        }))
    }

    /// Keeps the first occurrence of each element, comparing with the
    /// caller supplied `equals`/`hash` pair.
    pub fn distinct<E, H>(equals: E, hash: H) -> Self
    where
        T: Clone + Send + 'static,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
        H: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        let seen = Membership::new(equals);
        Self::new(OperatorKind::Distinct, move |x| {
            let keep = seen.insert(hash(&x), &x);
            (x, keep)
        })
    }

    /// [`Operator::distinct`] using the element's own `Eq` and `Hash`.
    ///
    /// `already_distinct` asserts the input is unique under that same
    /// equality, in which case every element passes through untracked.
    pub fn distinct_by_value(already_distinct: bool) -> Self
    where
        T: Clone + Eq + Hash + Send + 'static,
    {
        if already_distinct {
            return Self::new(OperatorKind::Distinct, |x| (x, true));
        }
        let state = RandomState::new();
        Self::distinct(|a: &T, b: &T| a == b, move |x: &T| state.hash_one(x))
    }

    pub fn apply(&self, element: T) -> (T, bool) {
        (self.apply)(element)
    }

    /// Whether no further element can ever be kept by this operator.
    pub fn is_saturated(&self) -> bool {
        self.saturated.as_ref().is_some_and(|saturated| saturated())
    }

    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn cost(&self) -> u32 {
        self.kind.cost()
    }

    pub fn is_stateful(&self) -> bool {
        self.kind.is_stateful()
    }
}

/// Membership set keyed by a caller supplied hash, resolving collisions
/// with the caller supplied equality.
struct Membership<T, E> {
    equals: E,
    buckets: Mutex<HashMap<u64, Vec<T>>>,
}

impl<T: Clone, E: Fn(&T, &T) -> bool> Membership<T, E> {
    fn new(equals: E) -> Self {
        Self {
            equals,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Test-and-insert. Returns `true` when `value` was not yet a member.
    fn insert(&self, hash: u64, value: &T) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(hash).or_default();
        if bucket.iter().any(|member| (self.equals)(member, value)) {
            return false;
        }
        bucket.push(value.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept<T>(operator: &Operator<T>, input: Vec<T>) -> Vec<T> {
        input
            .into_iter()
            .filter_map(|x| match operator.apply(x) {
                (y, true) => Some(y),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn filter_keeps_matching() {
        let op = Operator::filter(|x: &i32| x % 2 == 0);
        assert_eq!(kept(&op, (1..=6).collect()), vec![2, 4, 6]);
        assert_eq!(op.cost(), 1);
        assert!(!op.is_stateful());
    }

    #[test]
    fn limit_counts_only_elements_reaching_it() {
        let op = Operator::limit(2).unwrap();
        assert!(!op.is_saturated());
        assert_eq!(kept(&op, vec![5, 6, 7, 8]), vec![5, 6]);
        assert!(op.is_saturated());
        assert!(op.is_stateful());
    }

    #[test]
    fn limit_zero_is_saturated_immediately() {
        let op = Operator::<i32>::limit(0).unwrap();
        assert!(op.is_saturated());
        assert!(kept(&op, vec![1, 2]).is_empty());
    }

    #[test]
    fn negative_counts_are_illegal() {
        let err = Operator::<i32>::limit(-1).unwrap_err();
        assert_eq!(err, StreamError::illegal_argument("Limit", -1));
        let err = Operator::<i32>::skip(-5).unwrap_err();
        assert_eq!(err, StreamError::illegal_argument("Skip", -5));
    }

    #[test]
    fn skip_rejects_first_n() {
        let op = Operator::skip(3).unwrap();
        assert_eq!(kept(&op, (1..=5).collect()), vec![4, 5]);
    }

    #[test]
    fn distinct_uses_caller_equality() {
        // Case-insensitive equality with a hash consistent with it.
        let op = Operator::distinct(
            |a: &String, b: &String| a.eq_ignore_ascii_case(b),
            |x: &String| x.len() as u64,
        );
        let input = vec!["a".to_string(), "A".to_string(), "bb".to_string(), "Bb".to_string(), "c".to_string()];
        assert_eq!(kept(&op, input), vec!["a".to_string(), "bb".to_string(), "c".to_string()]);
    }

    #[test]
    fn distinct_collisions_are_resolved_by_equality() {
        let op = Operator::distinct(|a: &i32, b: &i32| a == b, |_| 0);
        assert_eq!(kept(&op, vec![1, 2, 1, 3, 2]), vec![1, 2, 3]);
    }

    #[test]
    fn already_distinct_short_circuits() {
        let op = Operator::distinct_by_value(true);
        assert_eq!(kept(&op, vec![1, 1, 1]), vec![1, 1, 1]);
    }

    #[test]
    fn only_filter_and_distinct_commute() {
        use OperatorKind::*;
        assert!(Filter.commutes_with(&Distinct));
        assert!(Distinct.commutes_with(&Filter));
        for (a, b) in [(Filter, Filter), (Filter, Limit), (Skip, Distinct), (Map, Filter), (Peek, Distinct)] {
            assert!(!a.commutes_with(&b), "{} / {}", a, b);
        }
    }
}
