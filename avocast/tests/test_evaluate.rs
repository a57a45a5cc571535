use assert_approx_eq::assert_approx_eq;
use avocast::evaluate::{align_predictions, evaluate, MapePolicy};
use avocast::{AvocastError, Observation, Prediction, PriceSeries, SeriesKey};
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn week(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 7).unwrap() + Duration::weeks(i as i64)
}

fn test_series(actuals: &[f64]) -> PriceSeries {
    PriceSeries::new(
        SeriesKey::new("TotalUS", "conventional"),
        actuals
            .iter()
            .enumerate()
            .map(|(i, value)| Observation::new(week(i), *value))
            .collect(),
    )
    .unwrap()
}

fn predictions(points: &[f64], half_width: f64) -> Vec<Prediction> {
    points
        .iter()
        .enumerate()
        .map(|(i, point)| Prediction::new(week(i), *point, point - half_width, point + half_width))
        .collect()
}

#[test]
fn test_point_metrics() {
    let test = test_series(&[100.0, 200.0, 150.0]);
    let preds = predictions(&[110.0, 190.0, 150.0], 5.0);

    let result = evaluate(&test, &preds, MapePolicy::Fail).unwrap();
    let metrics = &result.metrics;

    // |residual| = 10, 10, 0
    assert_approx_eq!(metrics.mae, 20.0 / 3.0, 1e-9);
    assert_approx_eq!(metrics.mse, 200.0 / 3.0, 1e-9);
    assert_approx_eq!(metrics.rmse, (200.0_f64 / 3.0).sqrt(), 1e-9);
    assert_approx_eq!(metrics.rmse, 8.165, 1e-3);
    // 10%, 5%, 0%
    assert_approx_eq!(metrics.mape.unwrap(), 5.0, 1e-9);
    assert_eq!(metrics.evaluated, 3);
    assert_eq!(metrics.excluded, 0);
}

#[test]
fn test_point_details() {
    let test = test_series(&[100.0, 200.0]);
    let preds = predictions(&[110.0, 190.0], 5.0);

    let result = evaluate(&test, &preds, MapePolicy::Fail).unwrap();
    let first = &result.points[0];

    assert_eq!(first.date, week(0));
    assert_eq!(first.residual, -10.0);
    assert_eq!(first.absolute_error, 10.0);
    assert_eq!(first.percentage_error, Some(10.0));
    assert!(!first.covered);
    assert_eq!(result.points[1].residual, 10.0);
}

#[rstest]
#[case(2)]
#[case(5)]
#[case(12)]
fn test_coverage_with_one_miss(#[case] n: usize) {
    let actuals: Vec<f64> = (0..n).map(|i| 1.0 + i as f64).collect();
    let test = test_series(&actuals);

    let mut preds = predictions(&actuals, 5.0);
    let miss = n / 2;
    let actual = actuals[miss];
    preds[miss] = Prediction::new(week(miss), actual + 5.0, actual + 1.0, actual + 10.0);

    let result = evaluate(&test, &preds, MapePolicy::Fail).unwrap();
    assert_approx_eq!(result.metrics.coverage_rate, (n - 1) as f64 / n as f64, 1e-12);
    assert!(!result.points[miss].covered);
}

#[test]
fn test_interval_bounds_are_inclusive() {
    let test = test_series(&[10.0, 20.0]);
    let preds = vec![
        Prediction::new(week(0), 12.0, 10.0, 14.0),
        Prediction::new(week(1), 18.0, 16.0, 20.0),
    ];

    let result = evaluate(&test, &preds, MapePolicy::Fail).unwrap();
    assert_eq!(result.metrics.coverage_rate, 1.0);
}

#[test]
fn test_same_length_different_dates_is_rejected() {
    let test = test_series(&[1.0, 2.0, 3.0]);
    let mut preds = predictions(&[1.0, 2.0, 3.0], 0.5);
    preds[2].date = week(7);

    let err = evaluate(&test, &preds, MapePolicy::Fail).unwrap_err();
    assert_eq!(err.stage(), "evaluation");
    match err {
        AvocastError::Alignment { date, .. } => assert_eq!(date, week(2).to_string()),
        other => panic!("expected alignment error, got {:?}", other),
    }
}

#[test]
fn test_missing_and_extra_predictions_are_rejected() {
    let test = test_series(&[1.0, 2.0, 3.0]);

    let short = predictions(&[1.0, 2.0], 0.5);
    assert!(matches!(
        evaluate(&test, &short, MapePolicy::Fail),
        Err(AvocastError::Alignment { .. })
    ));

    let long = predictions(&[1.0, 2.0, 3.0, 4.0], 0.5);
    match evaluate(&test, &long, MapePolicy::Fail) {
        Err(AvocastError::Alignment { date, reason }) => {
            assert_eq!(date, week(3).to_string());
            assert!(reason.contains("extra"));
        }
        other => panic!("expected alignment error, got {:?}", other),
    }
}

#[test]
fn test_duplicate_prediction_dates_are_rejected() {
    let test = test_series(&[1.0, 2.0]);
    let mut preds = predictions(&[1.0, 2.0], 0.5);
    preds[1].date = week(0);

    match evaluate(&test, &preds, MapePolicy::Fail) {
        Err(AvocastError::Alignment { reason, .. }) => assert!(reason.contains("duplicate")),
        other => panic!("expected alignment error, got {:?}", other),
    }
}

#[test]
fn test_order_of_predictions_does_not_matter() {
    let test = test_series(&[100.0, 200.0, 150.0]);
    let mut preds = predictions(&[110.0, 190.0, 150.0], 5.0);
    preds.reverse();

    let result = evaluate(&test, &preds, MapePolicy::Fail).unwrap();
    assert_approx_eq!(result.metrics.mae, 20.0 / 3.0, 1e-9);
    assert_eq!(result.points[0].date, week(0));
}

#[test]
fn test_zero_actual_fails_by_default() {
    let test = test_series(&[1.0, 0.0, 2.0]);
    let preds = predictions(&[1.0, 0.5, 2.0], 1.0);

    match evaluate(&test, &preds, MapePolicy::default()) {
        Err(AvocastError::DivisionByZero { date }) => assert_eq!(date, week(1)),
        other => panic!("expected division by zero, got {:?}", other),
    }
}

#[test]
fn test_zero_actual_reported_as_gap() {
    let test = test_series(&[1.0, 0.0, 2.0]);
    let preds = predictions(&[1.0, 0.5, 2.0], 1.0);

    let result = evaluate(&test, &preds, MapePolicy::ReportGap).unwrap();

    assert_eq!(result.metrics.mape, None);
    assert_eq!(result.metrics.zero_actuals, 1);
    assert_eq!(result.points[1].percentage_error, None);
    // The other metrics still use every point
    assert_approx_eq!(result.metrics.mae, 0.5 / 3.0, 1e-12);
    assert!(result.metrics.to_string().contains("n/a"));
}

#[test]
fn test_incomplete_predictions_are_excluded_and_counted() {
    let test = test_series(&[1.0, 2.0, 3.0]);
    let mut preds = predictions(&[1.5, 2.0, 3.0], 1.0);
    preds[1].upper = f64::NAN;

    let result = evaluate(&test, &preds, MapePolicy::Fail).unwrap();

    assert_eq!(result.metrics.evaluated, 2);
    assert_eq!(result.metrics.excluded, 1);
    assert_approx_eq!(result.metrics.mae, 0.25, 1e-12);
    assert!(result.points.iter().all(|p| p.date != week(1)));
}

#[test]
fn test_all_predictions_incomplete_fails() {
    let test = test_series(&[1.0]);
    let preds = vec![Prediction::new(week(0), f64::NAN, f64::NAN, f64::NAN)];

    assert!(matches!(
        evaluate(&test, &preds, MapePolicy::Fail),
        Err(AvocastError::Alignment { .. })
    ));
}

#[test]
fn test_inverted_bounds_are_invalid() {
    let test = test_series(&[1.0]);
    let preds = vec![Prediction::new(week(0), 1.0, 2.0, 0.5)];

    assert!(matches!(
        evaluate(&test, &preds, MapePolicy::Fail),
        Err(AvocastError::InvalidPrediction { .. })
    ));
}

#[test]
fn test_align_predictions_picks_test_dates() {
    let test = PriceSeries::new(
        SeriesKey::new("TotalUS", "conventional"),
        vec![Observation::new(week(3), 1.0), Observation::new(week(4), 1.1)],
    )
    .unwrap();
    let forecast = predictions(&[0.9, 0.95, 1.0, 1.05, 1.1, 1.15], 0.1);

    let aligned = align_predictions(&test, &forecast).unwrap();

    assert_eq!(aligned.len(), 2);
    assert_eq!(aligned[0].date, week(3));
    assert_eq!(aligned[1].point, 1.1);

    let too_short = predictions(&[0.9, 0.95, 1.0], 0.1);
    assert!(matches!(
        align_predictions(&test, &too_short),
        Err(AvocastError::Alignment { .. })
    ));
}

#[test]
fn test_metrics_display() {
    let test = test_series(&[100.0, 200.0, 150.0]);
    let preds = predictions(&[110.0, 190.0, 150.0], 5.0);

    let text = evaluate(&test, &preds, MapePolicy::Fail)
        .unwrap()
        .metrics
        .to_string();

    assert!(text.contains("MAE:      6.6667"));
    assert!(text.contains("RMSE:     8.1650"));
    assert!(text.contains("Coverage: 33.33%"));
}
