/// Striped linear DP storage for anti-diagonal cloud search.
///
/// Cell (i, j) on anti-diagonal d lives at stripe `d % 3`, index `k = i`;
/// only the current, previous and two-previous anti-diagonals are ever
/// live. This is deliberately a separate type from the dense matrix so the
/// cloud pass and the bounded passes cannot read each other's storage.
#[derive(Clone, Debug, Default)]
pub struct CloudMatrixLinear {
    pub target_length: usize,
    stripe_width: usize,
    data: Vec<f32>,
}

const MATCH: usize = 0;
const INSERT: usize = 1;
const DELETE: usize = 2;

impl CloudMatrixLinear {
    pub fn new(target_length: usize) -> Self {
        let mut matrix = Self::default();
        matrix.reuse(target_length);
        matrix
    }

    pub fn reuse(&mut self, target_length: usize) {
        self.target_length = target_length;
        self.stripe_width = target_length + 1;

        let size = 3 * 3 * self.stripe_width;
        if self.data.len() < size {
            self.data.resize(size, -f32::INFINITY);
        }
        self.data[..size].fill(-f32::INFINITY);
    }

    #[inline]
    fn idx(&self, stripe: usize, state: usize, cell: usize) -> usize {
        (stripe * 3 + state) * self.stripe_width + cell
    }

    #[inline]
    pub fn get_match(&self, stripe: usize, cell: usize) -> f32 {
        self.data[self.idx(stripe, MATCH, cell)]
    }

    #[inline]
    pub fn set_match(&mut self, stripe: usize, cell: usize, value: f32) {
        let idx = self.idx(stripe, MATCH, cell);
        self.data[idx] = value;
    }

    #[inline]
    pub fn get_insert(&self, stripe: usize, cell: usize) -> f32 {
        self.data[self.idx(stripe, INSERT, cell)]
    }

    #[inline]
    pub fn set_insert(&mut self, stripe: usize, cell: usize, value: f32) {
        let idx = self.idx(stripe, INSERT, cell);
        self.data[idx] = value;
    }

    #[inline]
    pub fn get_delete(&self, stripe: usize, cell: usize) -> f32 {
        self.data[self.idx(stripe, DELETE, cell)]
    }

    #[inline]
    pub fn set_delete(&mut self, stripe: usize, cell: usize, value: f32) {
        let idx = self.idx(stripe, DELETE, cell);
        self.data[idx] = value;
    }

    /// Max of the three states at one cell; what pruning compares.
    #[inline]
    pub fn cell_max(&self, stripe: usize, cell: usize) -> f32 {
        self.get_match(stripe, cell)
            .max(self.get_insert(stripe, cell))
            .max(self.get_delete(stripe, cell))
    }

    /// Rewrite one stripe's `[lb, rb)` window to -inf so it can serve as
    /// the next anti-diagonal.
    pub fn scrub(&mut self, stripe: usize, lb: usize, rb: usize) {
        for cell in lb..rb {
            self.set_match(stripe, cell, -f32::INFINITY);
            self.set_insert(stripe, cell, -f32::INFINITY);
            self.set_delete(stripe, cell, -f32::INFINITY);
        }
    }
}
