// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Overflow-probability model for capacity-constrained resources.
//!
//! Demand routed to a resource during one outer iteration is modeled as a
//! Poisson count with mean equal to the observed load. The penalty is the
//! probability that the count exceeds the fixed capacity: near zero while the
//! load sits far below capacity, approaching one as it overruns it.

const EPS: f64 = 1.0e-15;
const EXP_UNDERFLOW: f64 = -700.0;
const CF_RESCALE: f64 = 1.0e300;

/// Probability that Poisson-distributed demand with mean `load` exceeds
/// `capacity`.
///
/// Zero capacity means the resource is unconstrained and is never priced, and
/// zero load exerts no pressure; both return 0. The result is always in
/// `[0, 1]` and never NaN for non-negative input, and stays stable for
/// capacities past 10,000 and loads well beyond 10x capacity.
pub fn overflow_probability(capacity: u32, load: f64) -> f64 {
    if capacity == 0 || !(load > 0.0) {
        return 0.0;
    }

    // P(X > c) for X ~ Poisson(m) equals the regularized lower incomplete
    // gamma P(c + 1, m).
    lower_gamma_regularized(f64::from(capacity) + 1.0, load).clamp(0.0, 1.0)
}

/// Regularized lower incomplete gamma P(a, x) for `a >= 1`, `x > 0`.
///
/// Power series below `x = a + 1`, complement of the continued fraction
/// above it (the classic split keeps both expansions in their fast-converging
/// region).
fn lower_gamma_regularized(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x > a + 1.0 {
        return 1.0 - upper_gamma_regularized(a, x);
    }

    let log_prefactor = a * x.ln() - x - ln_gamma(a);
    if log_prefactor < EXP_UNDERFLOW {
        // Prefactor underflows with x at or below a + 1: essentially no mass
        // lies below x.
        return 0.0;
    }

    // 1 + x/(a+1) + x^2/((a+1)(a+2)) + ...
    let mut r = a;
    let mut term = 1.0;
    let mut sum = 1.0;
    loop {
        r += 1.0;
        term *= x / r;
        sum += term;
        if term <= sum * EPS {
            break;
        }
    }

    sum * log_prefactor.exp() / a
}

/// Regularized upper incomplete gamma Q(a, x), continued-fraction form for
/// `x > a + 1`, with periodic rescaling of the recurrence terms.
fn upper_gamma_regularized(a: f64, x: f64) -> f64 {
    let log_prefactor = a * x.ln() - x - ln_gamma(a);
    if log_prefactor < EXP_UNDERFLOW {
        // x far above a: the upper tail is numerically zero.
        return 0.0;
    }

    let mut y = 1.0 - a;
    let mut z = x + y + 1.0;
    let mut c = 0.0;
    let mut pkm2 = 1.0;
    let mut qkm2 = x;
    let mut pkm1 = x + 1.0;
    let mut qkm1 = z * x;
    let mut ans = pkm1 / qkm1;

    loop {
        c += 1.0;
        y += 1.0;
        z += 2.0;
        let yc = y * c;
        let pk = pkm1 * z - pkm2 * yc;
        let qk = qkm1 * z - qkm2 * yc;

        let convergence = if qk != 0.0 {
            let r = pk / qk;
            let t = ((ans - r) / r).abs();
            ans = r;
            t
        } else {
            1.0
        };

        pkm2 = pkm1;
        pkm1 = pk;
        qkm2 = qkm1;
        qkm1 = qk;

        if pk.abs() > CF_RESCALE {
            pkm2 /= CF_RESCALE;
            pkm1 /= CF_RESCALE;
            qkm2 /= CF_RESCALE;
            qkm1 /= CF_RESCALE;
        }

        if convergence <= EPS {
            break;
        }
    }

    ans * log_prefactor.exp()
}

// Nine-term Lanczos coefficients, g = 7.
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function. Valid for `x > 0.5`; every caller in
/// this module passes `a = capacity + 1 >= 2`.
fn ln_gamma(x: f64) -> f64 {
    let x = x - 1.0;
    let mut acc = LANCZOS[0];
    for (i, coefficient) in LANCZOS.iter().enumerate().skip(1) {
        acc += coefficient / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
