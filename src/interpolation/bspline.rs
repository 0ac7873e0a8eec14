//! Charge assignment functions.
//!
//! The assignment function of order `n` is the centred cardinal B-spline
//! `M_n`, the `n`-fold convolution of the unit box with itself. For a
//! particle sitting at offset `x` in `[-0.5, 0.5]` from its reference mesh
//! point, stencil cell `j` in `0..n` receives `M_n(j - (n-1)/2 - x)`.

/// Centred cardinal B-spline of the given order, via the de Boor recursion
///
/// `M_n(t) = ((t + n/2) M_{n-1}(t + 1/2) + (n/2 - t) M_{n-1}(t - 1/2)) / (n - 1)`
///
/// All terms are non-negative inside the support, so there is no
/// cancellation even at order 7.
pub fn centred_bspline(order: usize, t: f64) -> f64 {
    debug_assert!(order >= 1);
    if order == 1 {
        return if (-0.5..0.5).contains(&t) { 1.0 } else { 0.0 };
    }
    let half = 0.5 * order as f64;
    if t <= -half || t >= half {
        return 0.0;
    }
    ((t + half) * centred_bspline(order - 1, t + 0.5)
        + (half - t) * centred_bspline(order - 1, t - 0.5))
        / (order - 1) as f64
}

/// `dM_n/dt = M_{n-1}(t + 1/2) - M_{n-1}(t - 1/2)`; the box has none.
pub fn centred_bspline_derivative(order: usize, t: f64) -> f64 {
    if order <= 1 {
        return 0.0;
    }
    centred_bspline(order - 1, t + 0.5) - centred_bspline(order - 1, t - 0.5)
}

#[inline]
fn stencil_argument(order: usize, j: usize, x: f64) -> f64 {
    j as f64 - 0.5 * (order - 1) as f64 - x
}

/// Weight given to stencil cell `j` by a particle at sub-cell offset `x`.
///
/// Order 1 is nearest-grid-point: the single cell always takes everything,
/// including the end points `x = +-0.5` that the half-open box would drop.
pub fn assignment_weight(order: usize, j: usize, x: f64) -> f64 {
    debug_assert!(j < order);
    if order == 1 {
        return 1.0;
    }
    centred_bspline(order, stencil_argument(order, j, x))
}

/// Derivative of [`assignment_weight`] with respect to the particle offset
/// `x` (mesh units).
///
/// Each weight is a single polynomial piece on `[-0.5, 0.5]`; only the end
/// points touch a knot. From order 3 on the derivative is continuous there,
/// but the linear kernel's is not, so it is taken from the interior.
pub fn assignment_weight_derivative(order: usize, j: usize, x: f64) -> f64 {
    debug_assert!(j < order);
    if order == 2 {
        return if j == 0 { -1.0 } else { 1.0 };
    }
    -centred_bspline_derivative(order, stencil_argument(order, j, x))
}
