// src/analysis/curve_fit.rs
//
// Quadratic lane boundary fitting: x = a·y² + b·y + c.
//
// y is the independent variable (image rows grow downward) and x the
// dependent one, so the fit minimizes horizontal residuals.
//
// Ordinary least squares is the default. The normal equations are solved in
// a centered and scaled y-space for conditioning, and the coefficients are
// mapped back to pixel space before returning.
//
// RANSAC is available as an opt-in (`FitStrategy::Ransac`). It samples
// 3-point minimal sets with a seeded RNG, keeps the model with the most
// inliers, then re-fits least squares on those inliers.

use crate::types::{EdgeMap, FitConfig, FitStrategy, LanePixelSet, PolynomialCurve, RansacConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Smallest point count a quadratic can be fitted to.
pub const MIN_FIT_POINTS: usize = 3;

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Fit one lane side. `None` when the set is below `min_points` or the
/// system is degenerate (e.g. every point on one row).
pub fn fit_lane_curve(pixels: &LanePixelSet, config: &FitConfig) -> Option<PolynomialCurve> {
    let min_points = config.min_points.max(MIN_FIT_POINTS);
    if pixels.len() < min_points {
        debug!(
            "  Fit skipped: {} points < {} required",
            pixels.len(),
            min_points
        );
        return None;
    }

    let points = pixels.to_points();
    let curve = match config.strategy {
        FitStrategy::LeastSquares => fit_least_squares(&points),
        FitStrategy::Ransac => fit_ransac(&points, &config.ransac),
    };

    match &curve {
        Some(c) => debug!(
            "  📐 Fit: a={:.6} b={:.4} c={:.1} | RMSE={:.2}px | pts={}",
            c.a, c.b, c.c, c.rmse_px, c.num_points
        ),
        None => debug!("  Fit rejected: degenerate point set ({} points)", points.len()),
    }

    curve
}

/// Fit a single curve through every active cell of `edges`, no window search.
pub fn fit_all_active(edges: &EdgeMap, config: &FitConfig) -> Option<PolynomialCurve> {
    let mut pixels = LanePixelSet::new();
    for (x, y, px) in edges.enumerate_pixels() {
        if px[0] != 0 {
            pixels.push(x, y);
        }
    }
    fit_lane_curve(&pixels, config)
}

// ============================================================================
// LEAST SQUARES
// ============================================================================

/// Ordinary least squares on `(x, y)` points.
pub fn fit_least_squares(points: &[(f64, f64)]) -> Option<PolynomialCurve> {
    if points.len() < MIN_FIT_POINTS {
        return None;
    }

    let n = points.len() as f64;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;
    let y_scale = points
        .iter()
        .map(|p| (p.1 - y_mean).abs())
        .fold(0.0f64, f64::max);

    if y_scale < 1e-9 {
        return None; // All points on one row
    }

    let s0 = n;
    let mut s1 = 0.0f64;
    let mut s2 = 0.0f64;
    let mut s3 = 0.0f64;
    let mut s4 = 0.0f64;
    let mut sx0 = 0.0f64;
    let mut sx1 = 0.0f64;
    let mut sx2 = 0.0f64;

    for &(x, y) in points {
        let u = (y - y_mean) / y_scale; // u ∈ [-1, 1]
        let u2 = u * u;

        s1 += u;
        s2 += u2;
        s3 += u2 * u;
        s4 += u2 * u2;
        sx0 += x;
        sx1 += x * u;
        sx2 += x * u2;
    }

    //   | s4 s3 s2 | | A |   | sx2 |
    //   | s3 s2 s1 | | B | = | sx1 |
    //   | s2 s1 s0 | | C |   | sx0 |
    let (qa, qb, qc) = solve_3x3([s4, s3, s2, s3, s2, s1, s2, s1, s0], [sx2, sx1, sx0])?;

    // x = A·u² + B·u + C with u = (y − m)/s, expanded back to powers of y
    let m = y_mean;
    let s = y_scale;
    let a = qa / (s * s);
    let b = qb / s - 2.0 * qa * m / (s * s);
    let c = qa * m * m / (s * s) - qb * m / s + qc;

    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return None;
    }

    let mut curve = PolynomialCurve {
        a,
        b,
        c,
        num_points: points.len(),
        rmse_px: 0.0,
    };
    curve.rmse_px = rmse(&curve, points);
    Some(curve)
}

fn rmse(curve: &PolynomialCurve, points: &[(f64, f64)]) -> f64 {
    let sse: f64 = points
        .iter()
        .map(|&(x, y)| {
            let r = x - curve.eval(y);
            r * r
        })
        .sum();
    (sse / points.len() as f64).sqrt()
}

/// Solve a 3×3 linear system Ax = b using Gaussian elimination with partial pivoting.
/// Matrix is row-major: [a00, a01, a02, a10, a11, a12, a20, a21, a22].
/// Returns None if the system is singular.
fn solve_3x3(mat: [f64; 9], rhs: [f64; 3]) -> Option<(f64, f64, f64)> {
    let mut m = [
        [mat[0], mat[1], mat[2], rhs[0]],
        [mat[3], mat[4], mat[5], rhs[1]],
        [mat[6], mat[7], mat[8], rhs[2]],
    ];

    for col in 0..3 {
        let mut max_val = m[col][col].abs();
        let mut max_row = col;
        for (row, r) in m.iter().enumerate().skip(col + 1) {
            if r[col].abs() > max_val {
                max_val = r[col].abs();
                max_row = row;
            }
        }

        if max_val < 1e-12 {
            return None;
        }

        if max_row != col {
            m.swap(col, max_row);
        }

        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for j in col..4 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let c = m[2][3] / m[2][2];
    let b = (m[1][3] - m[1][2] * c) / m[1][1];
    let a = (m[0][3] - m[0][2] * c - m[0][1] * b) / m[0][0];

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Some((a, b, c))
    } else {
        None
    }
}

// ============================================================================
// RANSAC
// ============================================================================

/// Outlier-resistant fit. Deterministic for a given `config.seed`.
pub fn fit_ransac(points: &[(f64, f64)], config: &RansacConfig) -> Option<PolynomialCurve> {
    let n = points.len();
    if n < MIN_FIT_POINTS {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best_count = 0usize;
    let mut best_curve: Option<PolynomialCurve> = None;
    let mut best_mask = vec![false; n];

    for _ in 0..config.max_iters {
        let sample: Vec<(f64, f64)> = sample_indices(&mut rng, n, MIN_FIT_POINTS)
            .into_iter()
            .map(|i| points[i])
            .collect();
        let Some(candidate) = fit_least_squares(&sample) else {
            continue;
        };

        let mask: Vec<bool> = points
            .iter()
            .map(|&(x, y)| (x - candidate.eval(y)).abs() < config.inlier_threshold_px)
            .collect();
        let count = mask.iter().filter(|&&m| m).count();

        if count > best_count {
            best_count = count;
            best_curve = Some(candidate);
            best_mask = mask;

            if best_count * 10 > n * 9 {
                break;
            }
        }
    }

    if best_count < config.min_inliers.max(MIN_FIT_POINTS) {
        debug!(
            "  RANSAC rejected: {} inliers < {} required",
            best_count, config.min_inliers
        );
        return None;
    }

    let inliers: Vec<(f64, f64)> = best_mask
        .iter()
        .zip(points.iter())
        .filter(|(&m, _)| m)
        .map(|(_, &p)| p)
        .collect();

    debug!("  RANSAC: {}/{} inliers", inliers.len(), n);

    fit_least_squares(&inliers).or(best_curve)
}

/// Sample `k` distinct indices from `0..n` using a partial Fisher–Yates shuffle.
fn sample_indices(rng: &mut impl Rng, n: usize, k: usize) -> Vec<usize> {
    debug_assert!(k <= n);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

// ============================================================================
// TESTS
// ============================================================================
