//! Comparison of parameters of fits attached to histograms.

use crate::DomainError;
use rattest_types::{FitFunction, FitParameter, Histogram};

/// Deviation of `delta` in units of the combined uncertainty.
///
/// With both uncertainties zero the deviation is 0 for identical values and
/// infinite otherwise.
pub fn sigma_deviation(delta: f64, reference_error: f64, current_error: f64) -> f64 {
    let combined = (reference_error * reference_error + current_error * current_error).sqrt();
    if combined > 0.0 {
        delta.abs() / combined
    } else if delta == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

/// The single fit attached to `h`, if it is unambiguous and of a comparable kind.
fn single_fit(h: &Histogram) -> Option<&FitFunction> {
    match h.functions.as_slice() {
        [f] if f.is_fit_kind() => Some(f),
        _ => None,
    }
}

/// Pair up the parameters of the fits attached to both histograms.
///
/// Returns `Ok(None)` when there is nothing to compare: either side has no
/// attached function, more than one, or one that is not a fit function.
/// Differing parameter counts are an error.
pub fn extract_fit_params(
    name: &str,
    reference: &Histogram,
    current: &Histogram,
) -> Result<Option<Vec<FitParameter>>, DomainError> {
    let (Some(rf), Some(cf)) = (single_fit(reference), single_fit(current)) else {
        return Ok(None);
    };

    if rf.parameters.len() != cf.parameters.len() {
        return Err(DomainError::FitParameterMismatch {
            histogram: name.to_string(),
            reference: rf.parameters.len(),
            current: cf.parameters.len(),
        });
    }

    let params = rf
        .parameters
        .iter()
        .zip(&cf.parameters)
        .map(|(r, c)| {
            let delta = c.value - r.value;
            FitParameter {
                name: r.name.clone(),
                reference_value: r.value,
                reference_error: r.error,
                current_value: c.value,
                current_error: c.error,
                delta,
                sigma: sigma_deviation(delta, r.error, c.error),
            }
        })
        .collect();

    Ok(Some(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rattest_types::FunctionParameter;

    fn gaus(values: &[(f64, f64)]) -> FitFunction {
        let names = ["Constant", "Mean", "Sigma", "Extra"];
        FitFunction {
            class: "TF1".into(),
            name: "gaus".into(),
            parameters: values
                .iter()
                .enumerate()
                .map(|(i, (value, error))| FunctionParameter {
                    name: names[i].into(),
                    value: *value,
                    error: *error,
                })
                .collect(),
        }
    }

    fn with_fits(fits: Vec<FitFunction>) -> Histogram {
        let mut h = Histogram::uniform("h", 2, 0.0, 2.0);
        h.functions = fits;
        h
    }

    #[test]
    fn mean_shift_of_one_point_four_sigma() {
        let r = with_fits(vec![gaus(&[(10.0, 0.1)])]);
        let c = with_fits(vec![gaus(&[(10.2, 0.1)])]);

        let params = extract_fit_params("h", &r, &c).unwrap().unwrap();
        assert_eq!(params.len(), 1);
        let p = &params[0];
        assert_relative_eq!(p.delta, 0.2, epsilon = 1e-12);
        assert_relative_eq!(p.sigma, 0.2 / 0.02f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(p.sigma, 1.41421356, epsilon = 1e-6);
        assert!(!p.is_flagged());
    }

    #[test]
    fn large_shift_is_flagged() {
        let r = with_fits(vec![gaus(&[(10.0, 0.1)])]);
        let c = with_fits(vec![gaus(&[(10.5, 0.1)])]);
        let params = extract_fit_params("h", &r, &c).unwrap().unwrap();
        assert!(params[0].is_flagged());
    }

    #[test]
    fn missing_fit_on_either_side_gives_none() {
        let r = with_fits(vec![gaus(&[(1.0, 0.1)])]);
        let c = with_fits(vec![]);
        assert_eq!(extract_fit_params("h", &r, &c).unwrap(), None);
        assert_eq!(extract_fit_params("h", &c, &r).unwrap(), None);
    }

    #[test]
    fn multiple_fits_are_ambiguous() {
        let r = with_fits(vec![gaus(&[(1.0, 0.1)]), gaus(&[(2.0, 0.1)])]);
        let c = with_fits(vec![gaus(&[(1.0, 0.1)])]);
        assert_eq!(extract_fit_params("h", &r, &c).unwrap(), None);
    }

    #[test]
    fn non_fit_functions_are_ignored() {
        let mut f = gaus(&[(1.0, 0.1)]);
        f.class = "TGraph".into();
        let r = with_fits(vec![f]);
        let c = with_fits(vec![gaus(&[(1.0, 0.1)])]);
        assert_eq!(extract_fit_params("h", &r, &c).unwrap(), None);
    }

    #[test]
    fn parameter_count_mismatch_is_an_error() {
        let r = with_fits(vec![gaus(&[(1.0, 0.1), (2.0, 0.1)])]);
        let c = with_fits(vec![gaus(&[(1.0, 0.1)])]);
        let err = extract_fit_params("hFit", &r, &c).unwrap_err();
        assert!(matches!(
            err,
            DomainError::FitParameterMismatch {
                reference: 2,
                current: 1,
                ..
            }
        ));
        assert!(err.to_string().contains("hFit"));
    }

    #[test]
    fn zero_errors() {
        assert_eq!(sigma_deviation(0.0, 0.0, 0.0), 0.0);
        assert_eq!(sigma_deviation(1.0, 0.0, 0.0), f64::INFINITY);
        assert_eq!(sigma_deviation(-3.0, 0.0, 1.0), 3.0);
    }
}
