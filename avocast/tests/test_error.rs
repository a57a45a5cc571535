use avocast::AvocastError;
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use series_math::MathError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[rstest]
#[case(
    AvocastError::Selection {
        region: "Washington".to_string(),
        category: "conventional".to_string(),
        reason: "table is empty".to_string(),
    },
    "selection",
    "Selection error for region 'Washington', category 'conventional': table is empty"
)]
#[case(
    AvocastError::Interpolation { key: "Albany/organic".to_string(), date: date(2016, 3, 6) },
    "normalization",
    "Interpolation error for Albany/organic at 2016-03-06: no known value on both sides"
)]
#[case(
    AvocastError::Split { key: "Albany/organic".to_string(), reason: "too short".to_string() },
    "split",
    "Split error for Albany/organic: too short"
)]
#[case(
    AvocastError::RuleResolution { rule: "thanksgiving".to_string(), reason: "no dates".to_string() },
    "holidays",
    "Rule resolution error for 'thanksgiving': no dates"
)]
#[case(
    AvocastError::Alignment { date: "2018-01-07".to_string(), reason: "missing".to_string() },
    "evaluation",
    "Alignment error at 2018-01-07: missing"
)]
#[case(
    AvocastError::DivisionByZero { date: date(2018, 1, 7) },
    "evaluation",
    "Division by zero: actual value is zero at 2018-01-07"
)]
#[case(
    AvocastError::InvalidParameter("bad quantile".to_string()),
    "configuration",
    "Invalid parameter: bad quantile"
)]
#[case(
    AvocastError::ModelError("diverged".to_string()),
    "model",
    "Model error: diverged"
)]
fn test_messages_name_stage_and_key(
    #[case] err: AvocastError,
    #[case] stage: &str,
    #[case] message: &str,
) {
    assert_eq!(err.stage(), stage);
    assert_eq!(err.to_string(), message);
}

#[test]
fn test_conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: AvocastError = io.into();
    assert!(matches!(err, AvocastError::IoError(_)));
    assert_eq!(err.stage(), "io");

    let math: AvocastError = MathError::InsufficientData("need two points".to_string()).into();
    assert!(matches!(math, AvocastError::MathError(_)));
    assert_eq!(math.stage(), "math");

    let polars: AvocastError = PolarsError::ColumnNotFound("price".into()).into();
    assert!(matches!(polars, AvocastError::PolarsError(_)));
    assert_eq!(polars.stage(), "data");
}

#[test]
fn test_result_alias() {
    fn halve(value: f64) -> avocast::Result<f64> {
        if value < 0.0 {
            return Err(AvocastError::InvalidParameter("negative".to_string()));
        }
        Ok(value / 2.0)
    }

    assert_eq!(halve(3.0).unwrap(), 1.5);
    assert!(halve(-1.0).is_err());
}
