use crate::errors::Error;

/// One edgebound triple: a half-open interval `[lb, rb)` on the axis
/// orthogonal to `line`. In a diagonal-mode set `line` is an anti-diagonal
/// index `d = i + j` and the interval is over `k = i`; in a row-mode set
/// `line` is a row index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bound {
    pub line: usize,
    pub lb: usize,
    pub rb: usize,
}

/// A diagonal-mode edgebound set: the cloud emitted by one direction of
/// cloud search, ordered ascending by anti-diagonal.
#[derive(Clone, Debug, Default)]
pub struct CloudBoundGroup {
    pub bounds: Vec<Bound>,
    pub target_length: usize,
    pub profile_length: usize,
}

impl CloudBoundGroup {
    pub fn new(target_length: usize, profile_length: usize) -> Self {
        Self {
            bounds: Vec::new(),
            target_length,
            profile_length,
        }
    }

    pub fn reuse(&mut self, target_length: usize, profile_length: usize) {
        self.bounds.clear();
        self.target_length = target_length;
        self.profile_length = profile_length;
    }

    pub fn append(&mut self, bound: Bound) {
        self.bounds.push(bound);
    }

    /// Flip a backward-search set into ascending anti-diagonal order.
    pub fn reverse(&mut self) {
        self.bounds.reverse();
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Number of cells covered by the set.
    pub fn num_cells(&self) -> usize {
        self.bounds.iter().map(|b| b.rb - b.lb).sum()
    }

    /// Check the set invariants: ascending lines, and per line disjoint
    /// non-empty intervals in ascending order.
    pub fn valid(&self) -> bool {
        self.bounds.windows(2).all(|pair| {
            pair[0].line < pair[1].line
                || (pair[0].line == pair[1].line && pair[0].rb <= pair[1].lb)
        }) && self.bounds.iter().all(|b| b.lb < b.rb)
    }

    /// Union of two diagonal-mode sets, merged into `forward`.
    ///
    /// Walks both lists in parallel by anti-diagonal; intervals whose
    /// closures overlap or abut within `tol` cells collapse to one.
    /// Idempotent on already-merged input.
    pub fn join_bounds(
        forward: &mut CloudBoundGroup,
        backward: &CloudBoundGroup,
        tol: usize,
    ) -> Result<(), Error> {
        if forward.is_empty() && backward.is_empty() {
            return Err(Error::CloudEmpty {
                reason: "both cloud searches produced empty bounds".to_string(),
            });
        }

        let mut merged: Vec<Bound> = Vec::with_capacity(forward.bounds.len());
        let mut line_bounds: Vec<Bound> = Vec::new();

        let a = &forward.bounds;
        let b = &backward.bounds;
        let (mut ai, mut bi) = (0usize, 0usize);

        while ai < a.len() || bi < b.len() {
            let line = match (a.get(ai), b.get(bi)) {
                (Some(x), Some(y)) => x.line.min(y.line),
                (Some(x), None) => x.line,
                (None, Some(y)) => y.line,
                (None, None) => break,
            };

            line_bounds.clear();
            while ai < a.len() && a[ai].line == line {
                line_bounds.push(a[ai]);
                ai += 1;
            }
            while bi < b.len() && b[bi].line == line {
                line_bounds.push(b[bi]);
                bi += 1;
            }

            line_bounds.sort_by_key(|bound| bound.lb);
            let mut current = line_bounds[0];
            for &bound in &line_bounds[1..] {
                if bound.lb <= current.rb + tol {
                    current.rb = current.rb.max(bound.rb);
                } else {
                    merged.push(current);
                    current = bound;
                }
            }
            merged.push(current);
        }

        forward.bounds = merged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(bounds: &[(usize, usize, usize)]) -> CloudBoundGroup {
        CloudBoundGroup {
            bounds: bounds
                .iter()
                .map(|&(line, lb, rb)| Bound { line, lb, rb })
                .collect(),
            target_length: 10,
            profile_length: 10,
        }
    }

    #[test]
    fn overlapping_bounds_merge() {
        let mut fwd = group(&[(5, 0, 3)]);
        let bck = group(&[(5, 2, 6), (6, 0, 2)]);

        CloudBoundGroup::join_bounds(&mut fwd, &bck, 0).unwrap();
        assert_eq!(
            fwd.bounds,
            vec![
                Bound { line: 5, lb: 0, rb: 6 },
                Bound { line: 6, lb: 0, rb: 2 }
            ]
        );
        assert!(fwd.valid());
    }

    #[test]
    fn disjoint_bounds_stay_apart() {
        let mut fwd = group(&[(4, 0, 2)]);
        let bck = group(&[(4, 5, 7)]);

        CloudBoundGroup::join_bounds(&mut fwd, &bck, 0).unwrap();
        assert_eq!(fwd.bounds.len(), 2);
        assert!(fwd.valid());
    }

    #[test]
    fn abutting_bounds_merge_at_zero_tolerance() {
        // closures [0,2] and [2,4] touch
        let mut fwd = group(&[(4, 0, 2)]);
        let bck = group(&[(4, 2, 4)]);

        CloudBoundGroup::join_bounds(&mut fwd, &bck, 0).unwrap();
        assert_eq!(fwd.bounds, vec![Bound { line: 4, lb: 0, rb: 4 }]);
    }

    #[test]
    fn union_is_idempotent() {
        let mut fwd = group(&[(5, 0, 6), (6, 0, 2)]);
        let copy = fwd.clone();

        CloudBoundGroup::join_bounds(&mut fwd, &copy, 0).unwrap();
        assert_eq!(fwd.bounds, copy.bounds);
    }

    #[test]
    fn union_count_is_bounded_by_inputs() {
        let a = group(&[(3, 0, 4), (4, 1, 5)]);
        let b = group(&[(3, 2, 6), (5, 0, 3)]);

        let mut joined = a.clone();
        CloudBoundGroup::join_bounds(&mut joined, &b, 0).unwrap();

        let count = joined.num_cells();
        assert!(count >= a.num_cells().max(b.num_cells()));
        assert!(count <= a.num_cells() + b.num_cells());
    }

    #[test]
    fn empty_inputs_error() {
        let mut fwd = group(&[]);
        let bck = group(&[]);
        assert!(matches!(
            CloudBoundGroup::join_bounds(&mut fwd, &bck, 0),
            Err(Error::CloudEmpty { .. })
        ));
    }
}
