use std::ops::Range;

/// Sum of squared deviations from the segment mean, summed over dimensions.
///
/// Prefix sums make every segment query O(dimensions).
#[derive(Debug, Clone)]
pub struct L2Cost<const D: usize> {
    sums: Vec<[f64; D]>,
    squares: Vec<[f64; D]>,
}

impl<const D: usize> L2Cost<D> {
    pub fn fit(signal: &[[f64; D]]) -> Self {
        let mut sums = Vec::with_capacity(signal.len() + 1);
        let mut squares = Vec::with_capacity(signal.len() + 1);
        sums.push([0.0; D]);
        squares.push([0.0; D]);
        for sample in signal {
            let (prev_sum, prev_sq) = (sums[sums.len() - 1], squares[squares.len() - 1]);
            let mut sum = prev_sum;
            let mut sq = prev_sq;
            for d in 0..D {
                sum[d] += sample[d];
                sq[d] += sample[d] * sample[d];
            }
            sums.push(sum);
            squares.push(sq);
        }
        Self { sums, squares }
    }

    pub fn len(&self) -> usize {
        self.sums.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn error(&self, start: usize, end: usize) -> f64 {
        if end <= start {
            return 0.0;
        }
        let n = (end - start) as f64;
        (0..D)
            .map(|d| {
                let s = self.sums[end][d] - self.sums[start][d];
                let q = self.squares[end][d] - self.squares[start][d];
                (q - s * s / n).max(0.0)
            })
            .sum()
    }

    /// Total cost of the segmentation closed by `breakpoints` (sorted, last = len).
    pub fn sum_of_costs(&self, breakpoints: &[usize]) -> f64 {
        let mut start = 0;
        let mut total = 0.0;
        for &end in breakpoints {
            total += self.error(start, end);
            start = end;
        }
        total
    }
}

/// Ordered change points of a series, closed by the series length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoints {
    indices: Vec<usize>,
}

impl Breakpoints {
    /// `indices` must be strictly increasing and end with the series length.
    pub fn from_indices(indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Self { indices }
    }

    /// All indices including the closing sentinel.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Indices where the behaviour changes, without the sentinel.
    pub fn changes(&self) -> &[usize] {
        &self.indices[..self.indices.len().saturating_sub(1)]
    }

    pub fn series_len(&self) -> usize {
        self.indices.last().copied().unwrap_or(0)
    }

    pub fn segments(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let starts = std::iter::once(0).chain(self.indices.iter().copied());
        starts.zip(self.indices.iter().copied()).map(|(s, e)| s..e)
    }

    /// Rescales indices detected on a series sampled every `stride` frames back
    /// to frame indices; the sentinel becomes `total_frames`.
    pub fn to_frames(&self, stride: usize, total_frames: usize) -> Self {
        let mut indices: Vec<usize> = self
            .changes()
            .iter()
            .map(|&k| k * stride)
            .filter(|&f| f > 0 && f < total_frames)
            .collect();
        indices.push(total_frames);
        indices.dedup();
        Self { indices }
    }
}

/// Sliding-window change-point detection with a linear penalty.
///
/// Every `jump`-th sample `k` with a full half-window on each side is scored by
/// how much splitting the window at `k` reduces its cost. Strict local maxima of
/// that score are tried in descending order and kept while each one lowers the
/// total segmentation cost by more than `penalty`.
#[derive(Debug, Clone, Copy)]
pub struct WindowDetector {
    pub width: usize,
    pub jump: usize,
    pub penalty: f64,
}

impl WindowDetector {
    pub const DEFAULT_JUMP: usize = 5;

    pub fn new(width: usize, penalty: f64) -> Self {
        Self {
            width,
            jump: Self::DEFAULT_JUMP,
            penalty,
        }
    }

    pub fn detect<const D: usize>(&self, signal: &[[f64; D]]) -> Breakpoints {
        let n = signal.len();
        if signal.iter().all(|sample| sample == &signal[0]) {
            return Breakpoints::from_indices(vec![n]);
        }
        let cost = L2Cost::fit(signal);
        let (positions, scores) = self.scores(&cost);
        let order = self.width.max(2) / (2 * self.jump.max(1));

        let mut candidates: Vec<(f64, usize)> = relative_maxima(&scores, order.max(1))
            .into_iter()
            .map(|i| (scores[i], positions[i]))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut breakpoints = vec![n];
        let mut error = cost.sum_of_costs(&breakpoints);
        while let Some((_, candidate)) = candidates.pop() {
            let mut trial = breakpoints.clone();
            trial.push(candidate);
            trial.sort_unstable();
            let trial_error = cost.sum_of_costs(&trial);
            if error - trial_error > self.penalty {
                breakpoints = trial;
                error = trial_error;
            } else {
                break;
            }
        }

        Breakpoints::from_indices(breakpoints)
    }

    fn scores<const D: usize>(&self, cost: &L2Cost<D>) -> (Vec<usize>, Vec<f64>) {
        let n = cost.len();
        let half = self.width / 2;
        if n < 2 * half || half == 0 {
            return (Vec::new(), Vec::new());
        }
        (0..n)
            .step_by(self.jump.max(1))
            .filter(|&k| k >= half && k < n - half)
            .map(|k| {
                let (start, end) = (k - half, k + half);
                let gain = cost.error(start, end) - cost.error(start, k) - cost.error(k, end);
                (k, gain)
            })
            .unzip()
    }
}

/// Indices strictly greater than every neighbour within `order` positions,
/// comparing cyclically at the edges.
fn relative_maxima(values: &[f64], order: usize) -> Vec<usize> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .filter(|&i| {
            (1..=order).all(|shift| {
                let plus = values[(i + shift) % n];
                let minus = values[(i + n - shift % n) % n];
                values[i] > plus && values[i] > minus
            })
        })
        .collect()
}
