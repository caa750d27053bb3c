use crate::core::models::table::AngleTable;
use nalgebra::{DMatrix, DVector};

/// Columns whose mean-centred sine norm falls below this are treated as constant.
const DEGENERATE_NORM: f64 = 1e-8;

/// Circular mean (radians) of angles given in degrees: the direction of the mean
/// unit vector. Returns `None` for an empty sample.
pub fn circular_mean(degrees: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (mut s, mut c, mut n) = (0.0, 0.0, 0usize);
    for value in degrees {
        let (sin, cos) = value.to_radians().sin_cos();
        s += sin;
        c += cos;
        n += 1;
    }
    (n > 0).then(|| s.atan2(c))
}

/// Per-column circular means (radians) computed in a single pass over the rows.
pub fn column_circular_means(table: &AngleTable) -> DVector<f64> {
    let cols = table.n_cols();
    let mut sums = vec![(0.0f64, 0.0f64); cols];
    for row in table.rows().take(table.n_rows()) {
        for (acc, &value) in sums.iter_mut().zip(row) {
            let (sin, cos) = value.to_radians().sin_cos();
            acc.0 += sin;
            acc.1 += cos;
        }
    }
    DVector::from_iterator(cols, sums.into_iter().map(|(s, c)| s.atan2(c)))
}

/// Circular correlation between every pair of columns.
///
/// Entry `(i, j)` is `Σ sin(θi − μi)·sin(θj − μj) / sqrt(Σ sin²(θi − μi) · Σ sin²(θj − μj))`
/// where `μ` is the column's circular mean. The numerator for all pairs is one
/// Gram matrix, accumulated over blocks of `block_rows` rows so only one block
/// of mean-centred sines is held at a time. Pairs involving a constant column
/// are reported as 0.
pub fn circular_correlation_matrix(table: &AngleTable, block_rows: usize) -> DMatrix<f64> {
    let cols = table.n_cols();
    let rows = table.n_rows();
    let block_rows = block_rows.max(1);
    let means = column_circular_means(table);

    let mut gram = DMatrix::<f64>::zeros(cols, cols);
    let mut start = 0;
    while start < rows {
        let end = (start + block_rows).min(rows);
        let centred = DMatrix::from_fn(end - start, cols, |r, c| {
            (table.value(start + r, c).to_radians() - means[c]).sin()
        });
        gram += centred.tr_mul(&centred);
        start = end;
    }

    let norms = gram.diagonal().map(|sum_sq| {
        let norm = sum_sq.sqrt();
        if norm > DEGENERATE_NORM { norm } else { 0.0 }
    });
    let denominators = &norms * norms.transpose();
    gram.zip_map(&denominators, |numerator, denominator| {
        if denominator > 0.0 {
            (numerator / denominator).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    })
}

/// Indices of columns whose values never move away from their circular mean.
pub fn degenerate_columns(matrix: &DMatrix<f64>) -> Vec<usize> {
    (0..matrix.nrows())
        .filter(|&i| matrix[(i, i)] == 0.0)
        .collect()
}

/// Removes the artificial ±360° jumps of a periodic series.
///
/// The first sample is kept as the anchor; each later step larger than 180° in
/// magnitude is shifted by 360° toward zero, then the steps are accumulated.
pub fn unwrap_degrees(series: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    let Some(&first) = series.first() else {
        return out;
    };
    out.push(first);
    let mut current = first;
    for window in series.windows(2) {
        let mut step = window[1] - window[0];
        if step > 180.0 {
            step -= 360.0;
        } else if step < -180.0 {
            step += 360.0;
        }
        current += step;
        out.push(current);
    }
    out
}

/// Folds an unwrapped value back into `(-360, 360)` keeping its sign.
///
/// Long trajectories can unwrap into values far from the periodic domain; this
/// bounds them at the price of reintroducing a jump whenever a value crosses a
/// multiple of 360°.
pub fn rewrap_degrees(value: f64) -> f64 {
    if value > 0.0 {
        value.rem_euclid(360.0)
    } else if value < 0.0 {
        -(-value).rem_euclid(360.0)
    } else {
        0.0
    }
}
