//! Fourier-space properties of the assignment functions.
//!
//! The influence function itself belongs to the k-space solver; these are
//! the pieces of it that depend only on the assignment order.

use std::f64::consts::PI;

pub fn sinc(d: f64) -> f64 {
    if d == 0.0 {
        return 1.0;
    }
    let pid = PI * d;
    pid.sin() / pid
}

/// Fourier transform of the order-`order` assignment function at mesh
/// wave number `n`: `sinc(n / mesh)^order`.
pub fn kernel_hat(n: i64, mesh: usize, order: usize) -> f64 {
    sinc(n as f64 / mesh as f64).powi(order as i32)
}

/// Closed form of the alias sum `sum_m sinc(n/mesh + m)^(2 order)` as a
/// polynomial in `cos^2(pi n / mesh)`. Orders outside 1..=7 give 0.
pub fn aliasing_sum(n: i64, mesh_inv: f64, order: usize) -> f64 {
    let c = (PI * mesh_inv * n as f64).cos().powi(2);
    match order {
        1 => 1.0,
        2 => (1.0 + c * 2.0) / 3.0,
        3 => (2.0 + c * (11.0 + c * 2.0)) / 15.0,
        4 => (17.0 + c * (180.0 + c * (114.0 + c * 4.0))) / 315.0,
        5 => (62.0 + c * (1072.0 + c * (1452.0 + c * (247.0 + c * 2.0)))) / 2835.0,
        6 => (1382.0 + c * (35396.0 + c * (83021.0 + c * (34096.0 + c * (2026.0 + c * 4.0)))))
            / 155925.0,
        7 => (21844.0 + c * (776661.0 + c * (2801040.0 + c * (2123860.0
                + c * (349500.0 + c * (8166.0 + c * 4.0))))))
            / 6081075.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinc_limits() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-15);
        assert!((sinc(0.5) - 2.0 / PI).abs() < 1e-15);
    }

    #[test]
    fn alias_sum_is_one_at_origin() {
        for order in 1..=7 {
            assert!((aliasing_sum(0, 1.0 / 16.0, order) - 1.0).abs() < 1e-14, "order {order}");
        }
    }

    #[test]
    fn alias_sum_matches_direct_sum() {
        // order 1 converges too slowly (1/m^2) for a truncated check
        let mesh = 16usize;
        for order in 2..=7 {
            for n in [1i64, 3, 5, 7] {
                let k = n as f64 / mesh as f64;
                let direct: f64 = (-2000i64..=2000)
                    .map(|m| sinc(k + m as f64).powi(2 * order as i32))
                    .sum();
                let closed = aliasing_sum(n, 1.0 / mesh as f64, order);
                assert!((direct - closed).abs() < 1e-6,
                        "order {order} n {n}: direct {direct} closed {closed}");
            }
        }
    }

    #[test]
    fn kernel_hat_is_sinc_power() {
        assert_eq!(kernel_hat(0, 8, 5), 1.0);
        let expect = sinc(0.25).powi(3);
        assert!((kernel_hat(2, 8, 3) - expect).abs() < 1e-15);
    }
}
