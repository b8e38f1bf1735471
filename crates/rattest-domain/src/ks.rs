//! Two-sample Kolmogorov–Smirnov test over binned distributions.

use crate::DomainError;
use rattest_types::Histogram;

/// Asymptotic Kolmogorov distribution: probability that the KS statistic
/// exceeds `z` for two samples drawn from the same distribution.
pub fn kolmogorov_prob(z: f64) -> f64 {
    const FJ: [f64; 4] = [-2.0, -8.0, -18.0, -32.0];
    const W: f64 = 2.506_628_27;
    // -pi^2/8, 9x and 25x that.
    const C1: f64 = -1.233_700_550_136_169_7;
    const C2: f64 = -11.103_304_951_225_528;
    const C3: f64 = -30.842_513_753_404_244;

    let u = z.abs();
    let p = if u < 0.2 {
        1.0
    } else if u < 0.755 {
        let v = 1.0 / (u * u);
        1.0 - W * ((C1 * v).exp() + (C2 * v).exp() + (C3 * v).exp()) / u
    } else if u < 6.8116 {
        let v = u * u;
        let maxj = ((3.0 / u).round() as usize).clamp(1, 4);
        let mut r = [0.0f64; 4];
        for (slot, f) in r.iter_mut().zip(FJ).take(maxj) {
            *slot = (f * v).exp();
        }
        2.0 * (r[0] - r[1] + r[2] - r[3])
    } else {
        0.0
    };

    p.clamp(0.0, 1.0)
}

/// Largest absolute difference between the normalised cumulative sums.
pub fn max_cumulative_distance(a: &Histogram, b: &Histogram) -> f64 {
    a.cumulative()
        .iter()
        .zip(b.cumulative().iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// KS compatibility probability between two histograms with identical binning.
///
/// An empty histogram (zero integral) on either side scores 0.
pub fn ks_probability(a: &Histogram, b: &Histogram) -> Result<f64, DomainError> {
    a.validate().map_err(DomainError::InvalidHistogram)?;
    b.validate().map_err(DomainError::InvalidHistogram)?;
    if !a.same_binning(b) {
        return Err(DomainError::IncompatibleBinning {
            left: a.n_bins(),
            right: b.n_bins(),
        });
    }

    if a.integral() <= 0.0 || b.integral() <= 0.0 {
        return Ok(0.0);
    }

    let d = max_cumulative_distance(a, b);
    let n1 = a.effective_entries();
    let n2 = b.effective_entries();
    if !(n1 > 0.0 && n2 > 0.0) {
        return Ok(0.0);
    }

    let z = d * (n1 * n2 / (n1 + n2)).sqrt();
    Ok(kolmogorov_prob(z))
}
