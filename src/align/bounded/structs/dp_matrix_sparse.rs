use crate::align::bounded::structs::row_bounds::RowBounds;
use crate::structs::profile::{Special, NUM_SPECIALS};

#[derive(Clone, Copy, Debug, Default)]
struct SparseInterval {
    /// Padded bounds: one halo cell of -inf on each side of the cloud
    /// interval so neighbour reads are always defined.
    lb: usize,
    rb: usize,
    offset: usize,
}

/// Sparse row matrix: M/I/D values only at the cells a row-mode edgebound
/// set names (plus halo cells), and a dense 5 x (Q+1) special-state plane.
/// Reads outside the cloud return -inf.
#[derive(Clone, Debug, Default)]
pub struct DpMatrixSparse {
    pub target_length: usize,
    pub profile_length: usize,
    rows: Vec<Vec<SparseInterval>>,
    data: Vec<f32>,
    specials: Vec<f32>,
}

const MATCH: usize = 0;
const INSERT: usize = 1;
const DELETE: usize = 2;

impl DpMatrixSparse {
    pub fn new(target_length: usize, profile_length: usize, bounds: &RowBounds) -> Self {
        let mut matrix = Self::default();
        matrix.reuse(target_length, profile_length, bounds);
        matrix
    }

    /// Reshape for a new pair: rebuild the interval index from `bounds`,
    /// growing the backing buffers only when needed, and reset every
    /// readable cell to -inf.
    pub fn reuse(&mut self, target_length: usize, profile_length: usize, bounds: &RowBounds) {
        self.target_length = target_length;
        self.profile_length = profile_length;

        if self.rows.len() < target_length + 1 {
            self.rows.resize(target_length + 1, Vec::new());
        }

        let mut offset = 0usize;
        for row in 0..=target_length {
            self.rows[row].clear();
            for interval in bounds.row(row) {
                let lb = interval.lb.saturating_sub(1);
                let rb = (interval.rb + 1).min(profile_length + 2);

                // halos of adjacent intervals may touch; collapse them
                match self.rows[row].last_mut() {
                    Some(prev) if lb <= prev.rb => {
                        let grown = rb.max(prev.rb) - prev.rb;
                        prev.rb = rb.max(prev.rb);
                        offset += 3 * grown;
                    }
                    _ => {
                        self.rows[row].push(SparseInterval { lb, rb, offset });
                        offset += 3 * (rb - lb);
                    }
                }
            }
        }

        if self.data.len() < offset {
            self.data.resize(offset, -f32::INFINITY);
        }
        self.data[..offset].fill(-f32::INFINITY);

        let special_size = NUM_SPECIALS * (target_length + 1);
        if self.specials.len() < special_size {
            self.specials.resize(special_size, -f32::INFINITY);
        }
        self.specials[..special_size].fill(-f32::INFINITY);
    }

    #[inline]
    fn idx(&self, state: usize, row: usize, col: usize) -> Option<usize> {
        self.rows[row]
            .iter()
            .find(|interval| interval.lb <= col && col < interval.rb)
            .map(|interval| interval.offset + 3 * (col - interval.lb) + state)
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row <= self.target_length && self.idx(MATCH, row, col).is_some()
    }

    #[inline]
    fn get(&self, state: usize, row: usize, col: usize) -> f32 {
        match self.idx(state, row, col) {
            Some(idx) => self.data[idx],
            None => -f32::INFINITY,
        }
    }

    #[inline]
    fn set(&mut self, state: usize, row: usize, col: usize, value: f32) {
        if let Some(idx) = self.idx(state, row, col) {
            self.data[idx] = value;
        } else {
            debug_assert!(false, "write outside sparse bounds at ({row}, {col})");
        }
    }

    #[inline]
    pub fn get_match(&self, row: usize, col: usize) -> f32 {
        self.get(MATCH, row, col)
    }

    #[inline]
    pub fn set_match(&mut self, row: usize, col: usize, value: f32) {
        self.set(MATCH, row, col, value);
    }

    #[inline]
    pub fn get_insert(&self, row: usize, col: usize) -> f32 {
        self.get(INSERT, row, col)
    }

    #[inline]
    pub fn set_insert(&mut self, row: usize, col: usize, value: f32) {
        self.set(INSERT, row, col, value);
    }

    #[inline]
    pub fn get_delete(&self, row: usize, col: usize) -> f32 {
        self.get(DELETE, row, col)
    }

    #[inline]
    pub fn set_delete(&mut self, row: usize, col: usize, value: f32) {
        self.set(DELETE, row, col, value);
    }

    #[inline]
    pub fn get_special(&self, special: Special, row: usize) -> f32 {
        self.specials[special as usize * (self.target_length + 1) + row]
    }

    #[inline]
    pub fn set_special(&mut self, special: Special, row: usize, value: f32) {
        self.specials[special as usize * (self.target_length + 1) + row] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::bounded::structs::cloud_bound::{Bound, CloudBoundGroup};

    fn bounds_for(q: usize, t: usize, diag: &[(usize, usize, usize)]) -> RowBounds {
        let group = CloudBoundGroup {
            bounds: diag
                .iter()
                .map(|&(line, lb, rb)| Bound { line, lb, rb })
                .collect(),
            target_length: q,
            profile_length: t,
        };
        RowBounds::new(&group)
    }

    #[test]
    fn reads_outside_the_cloud_are_unreachable() {
        let bounds = bounds_for(4, 4, &[(4, 2, 3)]);
        let mut matrix = DpMatrixSparse::new(4, 4, &bounds);

        // (2, 2) is in the cloud, (0, 0) is not
        matrix.set_match(2, 2, 1.0);
        assert_eq!(matrix.get_match(2, 2), 1.0);
        assert_eq!(matrix.get_match(0, 0), -f32::INFINITY);
        assert!(!matrix.contains(0, 0));
    }

    #[test]
    fn halo_cells_read_as_unreachable_but_exist() {
        let bounds = bounds_for(4, 4, &[(4, 2, 3)]);
        let matrix = DpMatrixSparse::new(4, 4, &bounds);

        // cloud cell is (2, 2); halos at (2, 1) and (2, 3)
        assert!(matrix.contains(2, 1));
        assert!(matrix.contains(2, 3));
        assert_eq!(matrix.get_match(2, 1), -f32::INFINITY);
    }

    #[test]
    fn reuse_clears_previous_values() {
        let bounds = bounds_for(4, 4, &[(4, 2, 3)]);
        let mut matrix = DpMatrixSparse::new(4, 4, &bounds);
        matrix.set_insert(2, 2, 0.5);
        matrix.set_special(Special::N, 3, 0.25);

        matrix.reuse(4, 4, &bounds);
        assert_eq!(matrix.get_insert(2, 2), -f32::INFINITY);
        assert_eq!(matrix.get_special(Special::N, 3), -f32::INFINITY);
    }
}
