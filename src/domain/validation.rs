// Generator configuration validation
use super::forms::{FormGroup, ProbabilityFormState};
use super::generator::{GeneratorConfig, ProbabilityVector};
use thiserror::Error;

pub const EXPECTED_PROBABILITY_SUM: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("please fill in the following {group} fields: {}", fields.join(", ").to_uppercase())]
    MissingFields { group: FormGroup, fields: Vec<String> },

    #[error("the sum of all {group} form values must be {expected}, got {actual}")]
    ProbabilitySumMismatch {
        group: FormGroup,
        expected: f64,
        actual: f64,
    },

    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("{group} form has no field named '{field}'")]
    UnknownField { group: FormGroup, field: String },
}

/// How a probability sum is compared against 1.
///
/// `Exact` is plain `==`, so a vector like `[0.5, 0.2, 0.2, 0.1]` fails
/// because its binary sum is not exactly 1. `Tolerance` accepts sums within
/// the given absolute distance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SumCheck {
    #[default]
    Exact,
    Tolerance(f64),
}

impl SumCheck {
    pub fn from_tolerance(tolerance: Option<f64>) -> Self {
        match tolerance {
            Some(eps) if eps > 0.0 => SumCheck::Tolerance(eps),
            _ => SumCheck::Exact,
        }
    }

    fn accepts(self, actual: f64) -> bool {
        match self {
            SumCheck::Exact => actual == EXPECTED_PROBABILITY_SUM,
            SumCheck::Tolerance(eps) => (actual - EXPECTED_PROBABILITY_SUM).abs() <= eps,
        }
    }
}

/// Empty or unparseable inputs count as 0 toward the sum.
fn lenient_parse(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn strict_parse(field: &str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Checks that the form's values, summed left to right, equal 1.
pub fn validate_sum(form: &ProbabilityFormState, check: SumCheck) -> Result<f64, ValidationError> {
    let actual = form.values().map(lenient_parse).fold(0.0, |acc, v| acc + v);
    if check.accepts(actual) {
        Ok(actual)
    } else {
        Err(ValidationError::ProbabilitySumMismatch {
            group: form.group(),
            expected: EXPECTED_PROBABILITY_SUM,
            actual,
        })
    }
}

fn parse_vector(form: &ProbabilityFormState) -> Result<ProbabilityVector, ValidationError> {
    let mut values = [0.0; 4];
    for (slot, field) in values.iter_mut().zip(form.fields()) {
        *slot = strict_parse(field.name, &field.value)?;
    }
    Ok(ProbabilityVector::new(values))
}

fn parse_field(form: &ProbabilityFormState, name: &str) -> Result<f64, ValidationError> {
    let raw = form.get(name).ok_or_else(|| ValidationError::UnknownField {
        group: form.group(),
        field: name.to_string(),
    })?;
    strict_parse(name, raw)
}

/// Validates the three generator forms and builds the configuration.
///
/// The first failure wins: missing fields (class, approach, failure), then
/// the class sum, then the approach sum, then number parsing.
pub fn validate_generator_forms(
    class_form: &ProbabilityFormState,
    approach_form: &ProbabilityFormState,
    failure_form: &ProbabilityFormState,
    check: SumCheck,
) -> Result<GeneratorConfig, ValidationError> {
    class_form.validate_non_empty()?;
    approach_form.validate_non_empty()?;
    failure_form.validate_non_empty()?;

    validate_sum(class_form, check)?;
    validate_sum(approach_form, check)?;

    Ok(GeneratorConfig {
        counts_rate: parse_field(failure_form, "CountsRate")?,
        approach_prob: parse_vector(approach_form)?,
        class_prob: parse_vector(class_form)?,
        downtime_prob: parse_field(failure_form, "Downtime")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(group: FormGroup, values: &[&str]) -> ProbabilityFormState {
        let mut form = ProbabilityFormState::new(group);
        form.hydrate(values.iter().copied());
        form
    }

    #[test]
    fn test_uniform_vector_passes() {
        let f = form(FormGroup::Class, &["0.25", "0.25", "0.25", "0.25"]);
        assert_eq!(validate_sum(&f, SumCheck::Exact), Ok(1.0));
    }

    #[test]
    fn test_short_sum_fails() {
        let f = form(FormGroup::Approach, &["0.2", "0.2", "0.2", "0.2"]);
        match validate_sum(&f, SumCheck::Exact) {
            Err(ValidationError::ProbabilitySumMismatch { group, expected, actual }) => {
                assert_eq!(group, FormGroup::Approach);
                assert_eq!(expected, 1.0);
                assert!((actual - 0.8).abs() < 1e-12);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_garbage_count_as_zero() {
        let f = form(FormGroup::Class, &["0.5", "", "abc", "0.5"]);
        assert_eq!(validate_sum(&f, SumCheck::Exact), Ok(1.0));
    }

    #[test]
    fn test_exact_check_rejects_binary_rounding() {
        // 0.5 + 0.2 + 0.2 + 0.1 is 0.9999999999999999 in binary floating point
        let f = form(FormGroup::Class, &["0.5", "0.2", "0.2", "0.1"]);
        assert!(validate_sum(&f, SumCheck::Exact).is_err());
        assert!(validate_sum(&f, SumCheck::Tolerance(1e-9)).is_ok());
    }

    #[test]
    fn test_tolerance_still_rejects_real_mismatch() {
        let f = form(FormGroup::Class, &["0.3", "0.3", "0.3", "0.3"]);
        assert!(validate_sum(&f, SumCheck::Tolerance(1e-9)).is_err());
        assert_eq!(SumCheck::from_tolerance(None), SumCheck::Exact);
        assert_eq!(SumCheck::from_tolerance(Some(0.0)), SumCheck::Exact);
    }

    #[test]
    fn test_missing_fields_reported_before_sums() {
        let class = form(FormGroup::Class, &["0.9", "0.9", "0.9", "0.9"]);
        let approach = form(FormGroup::Approach, &["0.25", "", "0.25", "0.25"]);
        let failure = form(FormGroup::Failure, &["10", "0.01"]);

        let err = validate_generator_forms(&class, &approach, &failure, SumCheck::Exact).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingFields { group: FormGroup::Approach, .. }
        ));
    }

    #[test]
    fn test_class_sum_reported_before_approach_sum() {
        let class = form(FormGroup::Class, &["0.2", "0.2", "0.2", "0.2"]);
        let approach = form(FormGroup::Approach, &["0.2", "0.2", "0.2", "0.2"]);
        let failure = form(FormGroup::Failure, &["10", "0.01"]);

        let err = validate_generator_forms(&class, &approach, &failure, SumCheck::Exact).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ProbabilitySumMismatch { group: FormGroup::Class, .. }
        ));
    }

    #[test]
    fn test_failure_group_is_not_sum_constrained() {
        let class = form(FormGroup::Class, &["0.5", "0.25", "0.125", "0.125"]);
        let approach = form(FormGroup::Approach, &["0.25", "0.25", "0.25", "0.25"]);
        let failure = form(FormGroup::Failure, &["50", "0.01"]);

        let config = validate_generator_forms(&class, &approach, &failure, SumCheck::Exact).unwrap();
        assert_eq!(config.counts_rate, 50.0);
        assert_eq!(config.downtime_prob, 0.01);
        assert_eq!(config.class_prob.values(), &[0.5, 0.25, 0.125, 0.125]);
        assert_eq!(config.approach_prob.values(), &[0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_unparseable_failure_field() {
        let class = form(FormGroup::Class, &["0.25", "0.25", "0.25", "0.25"]);
        let approach = form(FormGroup::Approach, &["0.25", "0.25", "0.25", "0.25"]);
        let failure = form(FormGroup::Failure, &["fast", "0.01"]);

        let err = validate_generator_forms(&class, &approach, &failure, SumCheck::Exact).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidNumber {
                field: "CountsRate".to_string(),
                value: "fast".to_string(),
            }
        );
    }
}
