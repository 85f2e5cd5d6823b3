//! Generalized exponential integral `E_n(x)`.
//!
//! The Line two-stream PT profile needs `E_2(γτ)`. We evaluate `E_n` with the
//! classic split:
//!
//! - `x <= 1`: power series around zero (with the digamma term at `i = n-1`)
//! - `x > 1`: modified Lentz continued fraction
//!
//! Both converge to ~1e-15 relative accuracy for the argument ranges that
//! occur in atmospheric optical depths.

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
const MAX_ITER: usize = 200;
const EPS: f64 = 1e-15;
const TINY: f64 = 1e-300;

/// Compute `E_n(x)` for `n >= 0` and `x >= 0`.
///
/// Returns `NaN` for arguments outside the domain (`x < 0`, or `x = 0` with
/// `n <= 1`, where the integral diverges).
pub fn expn(n: u32, x: f64) -> f64 {
    if !(x >= 0.0) || (x == 0.0 && n <= 1) {
        return f64::NAN;
    }
    if n == 0 {
        return (-x).exp() / x;
    }
    if x == 0.0 {
        return 1.0 / (n as f64 - 1.0);
    }

    let nm1 = n as f64 - 1.0;
    if x > 1.0 {
        continued_fraction(n as f64, x)
    } else {
        series(n, nm1, x)
    }
}

/// `E_1(x)`, the exponential integral.
pub fn e1(x: f64) -> f64 {
    expn(1, x)
}

/// `E_2(x)`.
pub fn e2(x: f64) -> f64 {
    expn(2, x)
}

fn continued_fraction(n: f64, x: f64) -> f64 {
    let mut b = x + n;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITER {
        let i = i as f64;
        let a = -i * (n - 1.0 + i);
        b += 2.0;
        d = 1.0 / (a * d + b);
        c = b + a / c;
        let del = c * d;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h * (-x).exp()
}

fn series(n: u32, nm1: f64, x: f64) -> f64 {
    let mut ans = if n == 1 {
        -x.ln() - EULER_GAMMA
    } else {
        1.0 / nm1
    };
    let mut fact = 1.0;
    for i in 1..=MAX_ITER {
        fact *= -x / i as f64;
        let del = if i as u32 != n - 1 {
            -fact / (i as f64 - nm1)
        } else {
            // Digamma at n: psi(n) = -gamma + sum_{k=1}^{n-1} 1/k.
            let psi = -EULER_GAMMA + (1..n).map(|k| 1.0 / k as f64).sum::<f64>();
            fact * (-x.ln() + psi)
        };
        ans += del;
        if del.abs() < ans.abs() * EPS {
            break;
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e1_matches_reference_values() {
        // Abramowitz & Stegun table 5.1.
        assert!((e1(0.5) - 0.559_773_594_8).abs() < 1e-9);
        assert!((e1(1.0) - 0.219_383_934_4).abs() < 1e-9);
        assert!((e1(2.0) - 0.048_900_510_7).abs() < 1e-9);
    }

    #[test]
    fn e2_follows_recurrence() {
        // E_2(x) = exp(-x) - x E_1(x)
        for &x in &[1e-4, 0.1, 0.7, 1.0, 1.5, 5.0, 20.0] {
            let lhs = e2(x);
            let rhs = (-x).exp() - x * e1(x);
            assert!((lhs - rhs).abs() < 1e-12 * rhs.abs().max(1e-300) + 1e-14, "x={x}");
        }
    }

    #[test]
    fn e2_at_zero_is_one() {
        assert_eq!(e2(0.0), 1.0);
        assert!(e1(0.0).is_nan());
    }
}
