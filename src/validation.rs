//! Plausibility checks for fish measurements.
//!
//! Each dimension is checked against an absolute range and, except for
//! weight, against a condition-factor range computed from the weight. Range
//! edges are inclusive.

use std::fmt;

use thiserror::Error;

use crate::models::{FishEntry, Measurement, MeasurementDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Weight,
    Length,
    Width,
    Breadth,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Weight => "weight",
            Field::Length => "length",
            Field::Width => "width",
            Field::Breadth => "breadth",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Missing,
    NotANumber,
    BelowRange,
    AboveRange,
    ConditionFactorLow,
    ConditionFactorHigh,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectReason::Missing => "value is required",
            RejectReason::NotANumber => "value is not a number",
            RejectReason::BelowRange => "value is below the accepted range",
            RejectReason::AboveRange => "value is above the accepted range",
            RejectReason::ConditionFactorLow => "condition factor is implausibly low",
            RejectReason::ConditionFactorHigh => "condition factor is implausibly high",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} rejected: {reason}")]
pub struct Rejection {
    pub field: Field,
    pub reason: RejectReason,
}

struct Limits {
    field: Field,
    required: bool,
    min: f64,
    max: f64,
    kfactor: Option<(f64, f64)>,
}

const WEIGHT: Limits = Limits {
    field: Field::Weight,
    required: true,
    min: 10.0,
    max: 15_000.0,
    kfactor: None,
};

const LENGTH: Limits = Limits {
    field: Field::Length,
    required: true,
    min: 50.0,
    max: 1_500.0,
    kfactor: Some((0.3, 4.0)),
};

const WIDTH: Limits = Limits {
    field: Field::Width,
    required: false,
    min: 10.0,
    max: 400.0,
    kfactor: Some((10.0, 250.0)),
};

const BREADTH: Limits = Limits {
    field: Field::Breadth,
    required: false,
    min: 5.0,
    max: 250.0,
    kfactor: Some((200.0, 2_500.0)),
};

/// Weight over the cube of a linear dimension in centimetres, times 100.
pub fn kfactor(weight_g: f64, dim_mm: f64) -> f64 {
    let dim_cm = dim_mm / 10.0;
    weight_g * 100.0 / dim_cm.powi(3)
}

fn check(limits: &Limits, weight_g: f64, value: &Measurement) -> Result<(), Rejection> {
    let reject = |reason| {
        Err(Rejection {
            field: limits.field,
            reason,
        })
    };

    let value = match value {
        Measurement::Absent if limits.required => return reject(RejectReason::Missing),
        Measurement::Absent => return Ok(()),
        Measurement::Invalid(_) => return reject(RejectReason::NotANumber),
        Measurement::Value(value) => *value,
    };

    if value < limits.min {
        return reject(RejectReason::BelowRange);
    }
    if value > limits.max {
        return reject(RejectReason::AboveRange);
    }

    if let Some((low, high)) = limits.kfactor {
        let kf = kfactor(weight_g, value);
        if kf < low {
            return reject(RejectReason::ConditionFactorLow);
        }
        if kf > high {
            return reject(RejectReason::ConditionFactorHigh);
        }
    }

    Ok(())
}

pub fn check_weight(weight: &Measurement) -> Result<(), Rejection> {
    check(&WEIGHT, 0.0, weight)
}

pub fn check_length(weight_g: f64, length: &Measurement) -> Result<(), Rejection> {
    check(&LENGTH, weight_g, length)
}

pub fn check_width(weight_g: f64, width: &Measurement) -> Result<(), Rejection> {
    check(&WIDTH, weight_g, width)
}

pub fn check_breadth(weight_g: f64, breadth: &Measurement) -> Result<(), Rejection> {
    check(&BREADTH, weight_g, breadth)
}

pub fn is_weight_valid(weight: &Measurement) -> bool {
    check_weight(weight).is_ok()
}

pub fn is_length_valid(weight_g: f64, length: &Measurement) -> bool {
    check_length(weight_g, length).is_ok()
}

pub fn is_width_valid(weight_g: f64, width: &Measurement) -> bool {
    check_width(weight_g, width).is_ok()
}

pub fn is_breadth_valid(weight_g: f64, breadth: &Measurement) -> bool {
    check_breadth(weight_g, breadth).is_ok()
}

/// Check weight, length, width and breadth in that order and build the
/// entry. The first failing field is reported.
pub fn validate_draft(draft: MeasurementDraft) -> Result<FishEntry, Rejection> {
    check_weight(&draft.weight)?;
    let weight = draft.weight.value().unwrap_or_default();

    check_length(weight, &draft.length)?;
    check_width(weight, &draft.width)?;
    check_breadth(weight, &draft.breadth)?;

    Ok(FishEntry {
        fish_id: draft.fish_id,
        weight,
        length: draft.length.value().unwrap_or_default(),
        width: draft.width.value(),
        breadth: draft.breadth.value(),
        circumference: draft.circumference.value(),
        times: draft.times,
        notes: draft.notes.filter(|notes| !notes.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rstest::rstest;

    use super::*;
    use crate::models::WorkflowTimes;

    fn v(value: f64) -> Measurement {
        Measurement::Value(value)
    }

    fn draft(weight: Measurement, length: Measurement) -> MeasurementDraft {
        let at = DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        MeasurementDraft {
            fish_id: "F-1".into(),
            weight,
            length,
            width: Measurement::Absent,
            breadth: Measurement::Absent,
            circumference: Measurement::Absent,
            times: WorkflowTimes {
                capture_start: at,
                capture_end: at,
                sedation_end: at,
                measurement_end: at,
            },
            notes: Some(String::new()),
        }
    }

    #[test]
    fn kfactor_of_a_typical_salmon() {
        // 500 g over a 30 cm fish.
        let kf = kfactor(500.0, 300.0);
        assert!((kf - 500.0 * 100.0 / 27_000.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(10.0, true)]
    #[case(15_000.0, true)]
    #[case(500.0, true)]
    #[case(9.999, false)]
    #[case(15_000.5, false)]
    #[case(0.0, false)]
    #[case(-20.0, false)]
    fn weight_range_is_inclusive(#[case] weight: f64, #[case] valid: bool) {
        assert_eq!(is_weight_valid(&v(weight)), valid);
    }

    #[test]
    fn weight_is_required() {
        assert_eq!(
            check_weight(&Measurement::Absent),
            Err(Rejection {
                field: Field::Weight,
                reason: RejectReason::Missing
            })
        );
        assert!(!is_weight_valid(&Measurement::parse("")));
        assert!(!is_weight_valid(&Measurement::parse("heavy")));
    }

    #[rstest]
    #[case(500.0, 300.0, true)]
    #[case(500.0, 49.0, false)]
    #[case(500.0, 1_501.0, false)]
    // kf = 4.0 exactly at 10 cm and 40 g
    #[case(40.0, 100.0, true)]
    #[case(40.1, 100.0, false)]
    // kf = 0.3 exactly at 100 cm and 3000 g
    #[case(3_000.0, 1_000.0, true)]
    #[case(2_990.0, 1_000.0, false)]
    fn length_checks_range_and_condition_factor(
        #[case] weight: f64,
        #[case] length: f64,
        #[case] valid: bool,
    ) {
        assert_eq!(is_length_valid(weight, &v(length)), valid);
    }

    #[test]
    fn length_out_of_range_reports_range_before_kfactor() {
        assert_eq!(
            check_length(500.0, &v(40.0)).unwrap_err().reason,
            RejectReason::BelowRange
        );
        assert_eq!(
            check_length(1.0, &v(1_000.0)).unwrap_err().reason,
            RejectReason::ConditionFactorLow
        );
        assert!(!is_length_valid(500.0, &Measurement::Absent));
    }

    #[rstest]
    #[case(Measurement::Absent)]
    #[case(Measurement::parse(""))]
    fn absent_optional_dimensions_always_pass(#[case] value: Measurement) {
        for weight in [0.0, 10.0, 500.0, 20_000.0] {
            assert!(is_width_valid(weight, &value));
            assert!(is_breadth_valid(weight, &value));
        }
    }

    #[rstest]
    #[case(" ")]
    #[case("  ")]
    #[case("\t")]
    fn whitespace_only_text_is_rejected_not_absent(#[case] raw: &str) {
        let value = Measurement::parse(raw);
        assert!(!is_weight_valid(&value));
        assert!(!is_width_valid(500.0, &value));
        assert!(!is_breadth_valid(500.0, &value));
        assert_eq!(check_weight(&value).unwrap_err().reason, RejectReason::NotANumber);
    }

    #[test]
    fn zero_and_negative_optional_dimensions_fail() {
        assert!(!is_width_valid(500.0, &v(0.0)));
        assert!(!is_breadth_valid(500.0, &v(-1.0)));
    }

    #[test]
    fn width_and_breadth_condition_factor_bounds() {
        // 500 g: width 60 mm gives kf ~231, inside [10, 250].
        assert!(is_width_valid(500.0, &v(60.0)));
        // 500 g: width 50 mm gives kf 400, too high.
        assert_eq!(
            check_width(500.0, &v(50.0)).unwrap_err().reason,
            RejectReason::ConditionFactorHigh
        );
        // 500 g: breadth 30 mm gives kf ~1852, inside [200, 2500].
        assert!(is_breadth_valid(500.0, &v(30.0)));
        // 500 g: breadth 70 mm gives kf ~146, too low.
        assert_eq!(
            check_breadth(500.0, &v(70.0)).unwrap_err().reason,
            RejectReason::ConditionFactorLow
        );
    }

    #[test]
    fn validate_draft_builds_entry_and_drops_empty_notes() {
        let entry = validate_draft(draft(v(500.0), v(300.0))).unwrap();
        assert_eq!(entry.weight, 500.0);
        assert_eq!(entry.length, 300.0);
        assert_eq!(entry.width, None);
        assert_eq!(entry.notes, None);
    }

    #[test]
    fn validate_draft_reports_first_failure() {
        let rejection = validate_draft(draft(v(5.0), v(10.0))).unwrap_err();
        assert_eq!(rejection.field, Field::Weight);

        let mut bad_width = draft(v(500.0), v(300.0));
        bad_width.width = v(500.0);
        let rejection = validate_draft(bad_width).unwrap_err();
        assert_eq!(rejection.field, Field::Width);
        assert_eq!(rejection.reason, RejectReason::AboveRange);
        assert_eq!(
            rejection.to_string(),
            "width rejected: value is above the accepted range"
        );
    }
}
