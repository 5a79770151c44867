use crate::align::bounded::structs::cloud_bound::CloudBoundGroup;
use crate::errors::Error;

/// A half-open column interval `[lb, rb)` on one row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Interval {
    pub lb: usize,
    pub rb: usize,
}

/// A row-mode edgebound set: the merged cloud, reoriented so the bounded
/// row-wise passes can walk it. Rows may hold any number of disjoint
/// intervals (the cloud can fork).
#[derive(Clone, Debug, Default)]
pub struct RowBounds {
    pub target_length: usize,
    pub profile_length: usize,
    /// First and last row with any cells (inclusive).
    pub target_start: usize,
    pub target_end: usize,
    /// Bounding columns over all rows, half-open.
    pub profile_start: usize,
    pub profile_end: usize,
    rows: Vec<Vec<Interval>>,
}

impl RowBounds {
    pub fn new(bounds: &CloudBoundGroup) -> Self {
        let mut row_bounds = Self::default();
        row_bounds.reuse_from(bounds);
        row_bounds
    }

    fn reset(&mut self, target_length: usize, profile_length: usize) {
        self.target_length = target_length;
        self.profile_length = profile_length;
        self.target_start = 0;
        self.target_end = 0;
        self.profile_start = 0;
        self.profile_end = 0;

        if self.rows.len() < target_length + 1 {
            self.rows.resize(target_length + 1, Vec::new());
        }
        for row in self.rows.iter_mut() {
            row.clear();
        }
    }

    /// Reorient a diagonal-mode set into this row-mode set, covering the
    /// exact same cells. For each row the diagonals are scanned in order
    /// and an interval opens/closes wherever coverage flips.
    pub fn reuse_from(&mut self, bounds: &CloudBoundGroup) {
        self.reset(bounds.target_length, bounds.profile_length);

        let profile_length = self.profile_length;
        for row in 0..=self.target_length {
            let mut in_cloud = false;
            let mut current = Interval::default();

            let mut idx = 0;
            let diag_bounds = &bounds.bounds;
            while idx < diag_bounds.len() {
                let diag = diag_bounds[idx].line;

                let mut covered = false;
                while idx < diag_bounds.len() && diag_bounds[idx].line == diag {
                    covered |= diag_bounds[idx].lb <= row && row < diag_bounds[idx].rb;
                    idx += 1;
                }

                if diag < row {
                    continue;
                }
                let col = diag - row;
                if col > profile_length {
                    break;
                }

                if covered {
                    if in_cloud && col == current.rb {
                        current.rb = col + 1;
                    } else if in_cloud {
                        // a skipped anti-diagonal splits the row interval
                        self.rows[row].push(current);
                        current = Interval { lb: col, rb: col + 1 };
                    } else {
                        in_cloud = true;
                        current = Interval { lb: col, rb: col + 1 };
                    }
                } else if in_cloud {
                    self.rows[row].push(current);
                    in_cloud = false;
                }
            }

            if in_cloud {
                self.rows[row].push(current);
            }
        }

        self.recompute_ranges();
    }

    /// Cover the full (Q+1) x (T+1) matrix: the `run_full` bypass.
    pub fn cover_matrix(&mut self, target_length: usize, profile_length: usize) {
        self.reset(target_length, profile_length);
        for row in 0..=target_length {
            self.rows[row].push(Interval {
                lb: 0,
                rb: profile_length + 1,
            });
        }
        self.recompute_ranges();
    }

    fn recompute_ranges(&mut self) {
        let mut first_row = None;
        let mut last_row = 0;
        let mut min_col = usize::MAX;
        let mut max_col = 0;

        for (row, intervals) in self.rows[..=self.target_length].iter().enumerate() {
            if intervals.is_empty() {
                continue;
            }
            first_row.get_or_insert(row);
            last_row = row;
            for interval in intervals {
                min_col = min_col.min(interval.lb);
                max_col = max_col.max(interval.rb);
            }
        }

        self.target_start = first_row.unwrap_or(0);
        self.target_end = last_row;
        self.profile_start = if min_col == usize::MAX { 0 } else { min_col };
        self.profile_end = max_col.min(self.profile_length + 1);
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[Interval] {
        &self.rows[row]
    }

    pub fn num_cells(&self) -> usize {
        self.rows[..=self.target_length]
            .iter()
            .flatten()
            .map(|interval| interval.rb - interval.lb)
            .sum()
    }

    pub fn valid(&self) -> bool {
        self.num_cells() > 0 && self.target_start <= self.target_end
    }

    pub fn error_if_empty(&self) -> Result<(), Error> {
        if self.valid() {
            Ok(())
        } else {
            Err(Error::CloudEmpty {
                reason: "row bounds cover no cells".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::bounded::structs::cloud_bound::Bound;

    fn diag_group(q: usize, t: usize, bounds: &[(usize, usize, usize)]) -> CloudBoundGroup {
        CloudBoundGroup {
            bounds: bounds
                .iter()
                .map(|&(line, lb, rb)| Bound { line, lb, rb })
                .collect(),
            target_length: q,
            profile_length: t,
        }
    }

    /// Brute-force reference: mark each (i, j) covered by the diagonal set.
    fn reference_cells(q: usize, t: usize, group: &CloudBoundGroup) -> Vec<(usize, usize)> {
        let mut cells = vec![];
        for i in 0..=q {
            for j in 0..=t {
                let d = i + j;
                if group
                    .bounds
                    .iter()
                    .any(|b| b.line == d && b.lb <= i && i < b.rb)
                {
                    cells.push((i, j));
                }
            }
        }
        cells
    }

    fn row_cells(rows: &RowBounds) -> Vec<(usize, usize)> {
        let mut cells = vec![];
        for i in 0..=rows.target_length {
            for interval in rows.row(i) {
                for j in interval.lb..interval.rb {
                    cells.push((i, j));
                }
            }
        }
        cells
    }

    #[test]
    fn reorient_covers_the_same_cells() {
        let group = diag_group(3, 3, &[(2, 0, 2), (3, 1, 3)]);
        let rows = RowBounds::new(&group);

        assert_eq!(row_cells(&rows), reference_cells(3, 3, &group));
        assert_eq!(rows.num_cells(), group.num_cells());
    }

    #[test]
    fn reorient_preserves_count_for_a_band() {
        let group = diag_group(
            8,
            8,
            &[(4, 1, 4), (5, 1, 5), (6, 2, 5), (7, 2, 6), (8, 3, 6)],
        );
        let rows = RowBounds::new(&group);

        assert_eq!(rows.num_cells(), group.num_cells());
        assert_eq!(row_cells(&rows), reference_cells(8, 8, &group));
    }

    #[test]
    fn skipped_diagonal_splits_a_row() {
        let group = diag_group(6, 6, &[(4, 2, 3), (8, 2, 3)]);
        let rows = RowBounds::new(&group);

        assert_eq!(
            rows.row(2),
            &[Interval { lb: 2, rb: 3 }, Interval { lb: 6, rb: 7 }][..]
        );
    }

    #[test]
    fn cover_matrix_counts_every_cell() {
        let mut rows = RowBounds::default();
        rows.cover_matrix(4, 7);
        assert_eq!(rows.num_cells(), 5 * 8);
        assert_eq!(rows.target_start, 0);
        assert_eq!(rows.target_end, 4);
    }
}
