//! Commutativity-based pipeline reordering
//!
//! Adjacent operators that commute form a run. Each run is stable-sorted
//! by ascending cost; operators outside a run keep their position. Passes
//! repeat until nothing moves, so the result is a fixed point and
//! optimizing an optimized pipeline is a no-op.

use std::sync::Arc;

use crate::operator::Operator;

/// Whether `a` followed by `b` accepts the same element set as `b` followed by `a`.
pub fn commutative<T>(a: &Operator<T>, b: &Operator<T>) -> bool {
    a.kind().commutes_with(&b.kind())
}

pub fn optimize<T>(operators: &[Arc<Operator<T>>]) -> Vec<Arc<Operator<T>>> {
    let mut sorted = operators.to_vec();
    while sort_runs(&mut sorted) {}
    sorted
}

/// One left-to-right pass. Returns whether any operator moved.
fn sort_runs<T>(operators: &mut [Arc<Operator<T>>]) -> bool {
    let mut moved = false;
    let mut start = 0;
    while start < operators.len() {
        let mut end = start + 1;
        while end < operators.len() && commutative(&operators[end - 1], &operators[end]) {
            end += 1;
        }
        let run = &mut operators[start..end];
        if run.len() > 1 && !is_sorted_by_cost(run) {
            let before: Vec<_> = run.iter().map(|op| op.name()).collect();
            run.sort_by_key(|op| op.cost());
            let after: Vec<_> = run.iter().map(|op| op.name()).collect();
            log::debug!("Reordered operators {}..{}: {:?} -> {:?}", start, end, before, after);
            moved = true;
        }
        start = end;
    }
    moved
}

fn is_sorted_by_cost<T>(run: &[Arc<Operator<T>>]) -> bool {
    run.windows(2).all(|pair| pair[0].cost() <= pair[1].cost())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(kinds: &[&str]) -> Vec<Arc<Operator<i32>>> {
        kinds
            .iter()
            .map(|kind| {
                Arc::new(match *kind {
                    "filter" => Operator::filter(|_| true),
                    "distinct" => Operator::distinct_by_value(false),
                    "map" => Operator::map(|x| x),
                    "limit" => Operator::limit(10).unwrap(),
                    "skip" => Operator::skip(0).unwrap(),
                    _ => Operator::peek(|_| {}),
                })
            })
            .collect()
    }

    fn names(operators: &[Arc<Operator<i32>>]) -> Vec<&'static str> {
        operators.iter().map(|op| op.name()).collect()
    }

    #[test]
    fn filter_moves_ahead_of_distinct() {
        let optimized = optimize(&ops(&["distinct", "filter"]));
        assert_eq!(names(&optimized), vec!["filter", "distinct"]);
    }

    #[test]
    fn position_sensitive_operators_break_runs() {
        let input = ops(&["distinct", "limit", "filter", "map", "distinct", "skip", "filter"]);
        let optimized = optimize(&input);
        assert_eq!(
            names(&optimized),
            vec!["distinct", "limit", "filter", "map", "distinct", "skip", "filter"]
        );
    }

    #[test]
    fn runs_sort_to_a_fixed_point() {
        let optimized = optimize(&ops(&["distinct", "filter", "filter", "map", "distinct", "filter"]));
        assert_eq!(
            names(&optimized),
            vec!["filter", "filter", "distinct", "map", "filter", "distinct"]
        );
    }

    #[test]
    fn optimizing_twice_changes_nothing() {
        let once = optimize(&ops(&["distinct", "filter", "distinct", "filter", "peek"]));
        let twice = optimize(&once);
        assert!(once.iter().zip(twice.iter()).all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn ties_keep_original_order() {
        let input = ops(&["filter", "distinct", "filter"]);
        let optimized = optimize(&input);
        assert!(Arc::ptr_eq(&optimized[0], &input[0]));
        assert!(Arc::ptr_eq(&optimized[1], &input[2]));
        assert!(Arc::ptr_eq(&optimized[2], &input[1]));
    }
}
