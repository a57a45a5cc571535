use assert_approx_eq::assert_approx_eq;
use avocast::diagnostics::{
    accuracy_over_time, future_uncertainty, interval_width_trend, interval_widths, monthly_error,
    predictions_over_time, residual_summary, residuals_over_time, DatedValue, DiagnosticsReport,
};
use avocast::evaluate::{evaluate, EvaluationResult, MapePolicy};
use avocast::{Observation, Prediction, PriceSeries, SeriesKey};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Three January points, two February points; intervals widen over time
fn sample_evaluation() -> EvaluationResult {
    let rows = [
        (date(2018, 1, 7), 1.0, 1.1, 0.2),
        (date(2018, 1, 14), 1.2, 1.0, 0.3),
        (date(2018, 1, 21), 1.1, 1.1, 0.4),
        (date(2018, 2, 4), 1.5, 1.2, 0.5),
        (date(2018, 2, 11), 1.4, 1.5, 0.6),
    ];

    let test = PriceSeries::new(
        SeriesKey::new("TotalUS", "conventional"),
        rows.iter()
            .map(|(date, actual, _, _)| Observation::new(*date, *actual))
            .collect(),
    )
    .unwrap();
    // Deliberately out of order
    let predictions: Vec<Prediction> = rows
        .iter()
        .rev()
        .map(|(date, _, point, half)| Prediction::new(*date, *point, point - half, point + half))
        .collect();

    evaluate(&test, &predictions, MapePolicy::Fail).unwrap()
}

#[test]
fn test_monthly_error_groups_by_calendar_month() {
    let evaluation = sample_evaluation();

    let monthly = monthly_error(&evaluation);

    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].month, 1);
    assert_eq!(monthly[0].count, 3);
    assert_approx_eq!(monthly[0].mean_absolute_error, (0.1 + 0.2 + 0.0) / 3.0, 1e-9);
    assert_eq!(monthly[1].month, 2);
    assert_approx_eq!(monthly[1].mean_absolute_error, (0.3 + 0.1) / 2.0, 1e-9);
}

#[test]
fn test_residuals_and_predictions_are_ordered() {
    let evaluation = sample_evaluation();

    let residuals = residuals_over_time(&evaluation);
    let dates: Vec<NaiveDate> = residuals.iter().map(|r| r.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert_approx_eq!(residuals[0].value, -0.1, 1e-9);

    let predictions = predictions_over_time(&evaluation);
    assert_eq!(predictions.len(), 5);
    assert_eq!(predictions[4].date, date(2018, 2, 11));
    assert_eq!(predictions[4].predicted, 1.5);
}

#[test]
fn test_accuracy_over_time() {
    let evaluation = sample_evaluation();

    let accuracy = accuracy_over_time(&evaluation);
    assert_eq!(accuracy.len(), 5);
    assert_approx_eq!(accuracy[0].value, 10.0, 1e-9);
    assert_approx_eq!(accuracy[2].value, 0.0, 1e-9);
}

#[test]
fn test_interval_widths_and_trend() {
    let evaluation = sample_evaluation();
    let report = DiagnosticsReport::build(&evaluation, &[], date(2018, 2, 11));

    let widths: Vec<f64> = report.interval_widths.iter().map(|w| w.value).collect();
    for (width, expected) in widths.iter().zip([0.4, 0.6, 0.8, 1.0, 1.2]) {
        assert_approx_eq!(*width, expected, 1e-9);
    }
    assert!(report.interval_width_trend.unwrap() > 0.0);
    assert!(report.future_uncertainty.is_empty());
    assert_eq!(report.future_width_trend, None);
}

#[test]
fn test_width_trend_is_per_day() {
    let widths = vec![
        DatedValue {
            date: date(2018, 1, 1),
            value: 1.0,
        },
        DatedValue {
            date: date(2018, 1, 8),
            value: 1.7,
        },
        DatedValue {
            date: date(2018, 1, 15),
            value: 2.4,
        },
    ];

    assert_approx_eq!(interval_width_trend(&widths).unwrap(), 0.1, 1e-9);
    assert_eq!(interval_width_trend(&widths[..1]), None);
    assert_eq!(interval_width_trend(&[]), None);
}

#[test]
fn test_interval_widths_skip_incomplete_predictions() {
    let predictions = vec![
        Prediction::new(date(2018, 3, 11), 1.0, 0.5, 1.5),
        Prediction::new(date(2018, 3, 4), 1.0, f64::NAN, 1.5),
        Prediction::new(date(2018, 2, 25), 1.0, 0.8, 1.2),
    ];

    let widths = interval_widths(&predictions);

    assert_eq!(widths.len(), 2);
    assert_eq!(widths[0].date, date(2018, 2, 25));
    assert_approx_eq!(widths[0].value, 0.4, 1e-9);
    assert_approx_eq!(widths[1].value, 1.0, 1e-9);
}

#[test]
fn test_future_uncertainty_only_after_horizon_start() {
    let forecast = vec![
        Prediction::new(date(2018, 2, 4), 1.0, 0.9, 1.1),
        Prediction::new(date(2018, 2, 11), 1.0, 0.8, 1.2),
        Prediction::new(date(2018, 2, 18), 1.0, 0.7, 1.3),
        Prediction::new(date(2018, 2, 25), 1.0, 0.6, 1.4),
    ];

    let future = future_uncertainty(&forecast, date(2018, 2, 11));

    assert_eq!(future.len(), 2);
    assert_eq!(future[0].date, date(2018, 2, 18));
    assert_approx_eq!(future[1].value, 0.8, 1e-9);
}

#[test]
fn test_residual_summary() {
    let evaluation = sample_evaluation();

    let summary = residual_summary(&evaluation).unwrap();

    // residuals: -0.1, 0.2, 0.0, 0.3, -0.1
    assert_approx_eq!(summary.mean, 0.06, 1e-9);
    assert_approx_eq!(summary.min, -0.1, 1e-9);
    assert_approx_eq!(summary.max, 0.3, 1e-9);
    assert!(summary.std_dev > 0.0);
}

#[test]
fn test_report_serializes() {
    let evaluation = sample_evaluation();
    let report = DiagnosticsReport::build(&evaluation, &[], date(2018, 2, 11));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["monthly_error"].as_array().unwrap().len(), 2);
    assert_eq!(json["residuals"][0]["ds"], "2018-01-07");
}
