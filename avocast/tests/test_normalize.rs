use assert_approx_eq::assert_approx_eq;
use avocast::normalize::{date_grid, normalize, WEEKLY_PERIOD_DAYS};
use avocast::{AvocastError, Observation, PriceSeries, SeriesKey};
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn series(points: &[(NaiveDate, f64)]) -> PriceSeries {
    PriceSeries::new(
        SeriesKey::new("Albany", "conventional"),
        points
            .iter()
            .map(|(date, value)| Observation::new(*date, *value))
            .collect(),
    )
    .unwrap()
}

fn week() -> Duration {
    Duration::days(WEEKLY_PERIOD_DAYS)
}

#[test]
fn test_midpoint_gap_is_filled_with_mean() {
    let input = series(&[(date(2017, 1, 1), 10.0), (date(2017, 1, 15), 20.0)]);

    let result = normalize(&input, week(), None).unwrap();

    assert_eq!(
        result.series.dates(),
        vec![date(2017, 1, 1), date(2017, 1, 8), date(2017, 1, 15)]
    );
    assert_eq!(result.series.value_at(date(2017, 1, 8)), Some(15.0));
    assert_eq!(result.filled, vec![date(2017, 1, 8)]);
    assert!(result.off_grid.is_empty());
}

#[test]
fn test_wide_gap_interpolates_on_time_axis() {
    let input = series(&[(date(2017, 1, 1), 10.0), (date(2017, 1, 22), 40.0)]);

    let result = normalize(&input, week(), None).unwrap();

    assert_eq!(result.series.values(), vec![10.0, 20.0, 30.0, 40.0]);
    assert_eq!(result.filled.len(), 2);
}

#[test]
fn test_off_grid_observation_anchors_interpolation() {
    // The 4 January value lies between grid dates; it is used as an anchor but
    // not emitted.
    let input = series(&[
        (date(2017, 1, 1), 10.0),
        (date(2017, 1, 4), 16.0),
        (date(2017, 1, 15), 20.0),
    ]);

    let result = normalize(&input, week(), None).unwrap();

    assert_eq!(result.series.len(), 3);
    assert_eq!(result.off_grid, vec![date(2017, 1, 4)]);
    let filled = result.series.value_at(date(2017, 1, 8)).unwrap();
    assert_approx_eq!(filled, 16.0 + 4.0 * 4.0 / 11.0, 1e-9);
}

#[test]
fn test_existing_values_are_untouched() {
    let input = series(&[
        (date(2017, 1, 1), 1.37),
        (date(2017, 1, 8), 1.21),
        (date(2017, 1, 22), 1.05),
        (date(2017, 1, 29), 1.44),
    ]);

    let result = normalize(&input, week(), None).unwrap();

    for obs in input.observations() {
        assert_eq!(result.series.value_at(obs.date), Some(obs.value));
    }
    assert_eq!(result.filled, vec![date(2017, 1, 15)]);
}

#[rstest]
#[case(7)]
#[case(14)]
#[case(1)]
fn test_grid_is_evenly_spaced(#[case] period_days: i64) {
    let input = series(&[
        (date(2016, 1, 3), 1.0),
        (date(2016, 2, 14), 1.5),
        (date(2016, 5, 1), 2.0),
        (date(2016, 7, 3), 1.2),
    ]);
    let period = Duration::days(period_days);

    let result = normalize(&input, period, Some((date(2016, 1, 3), date(2016, 7, 3)))).unwrap();
    let dates = result.series.dates();

    assert!(dates.windows(2).all(|w| w[1] - w[0] == period));
    assert_eq!(dates.first(), Some(&date(2016, 1, 3)));
}

#[test]
fn test_leading_gap_fails() {
    let input = series(&[(date(2017, 1, 15), 10.0), (date(2017, 1, 22), 12.0)]);

    let result = normalize(&input, week(), Some((date(2017, 1, 1), date(2017, 1, 22))));

    match result {
        Err(AvocastError::Interpolation { key, date: at }) => {
            assert_eq!(key, "Albany/conventional");
            assert_eq!(at, date(2017, 1, 1));
        }
        other => panic!("expected interpolation error, got {:?}", other),
    }
}

#[test]
fn test_trailing_gap_fails() {
    let input = series(&[(date(2017, 1, 1), 10.0), (date(2017, 1, 8), 12.0)]);

    let err = normalize(&input, week(), Some((date(2017, 1, 1), date(2017, 1, 22)))).unwrap_err();

    assert_eq!(err.stage(), "normalization");
    assert!(matches!(err, AvocastError::Interpolation { date: at, .. } if at == date(2017, 1, 15)));
}

#[test]
fn test_empty_series_fails() {
    let empty = PriceSeries::new(SeriesKey::new("Albany", "organic"), Vec::new()).unwrap();

    assert!(matches!(
        normalize(&empty, week(), None),
        Err(AvocastError::DataError(_))
    ));
}

#[test]
fn test_date_grid_validation() {
    let grid = date_grid(date(2017, 1, 1), date(2017, 1, 20), week()).unwrap();
    assert_eq!(grid, vec![date(2017, 1, 1), date(2017, 1, 8), date(2017, 1, 15)]);

    assert!(date_grid(date(2017, 1, 1), date(2017, 1, 20), Duration::days(0)).is_err());
    assert!(date_grid(date(2017, 1, 1), date(2017, 1, 20), Duration::hours(36)).is_err());
    assert!(date_grid(date(2017, 1, 20), date(2017, 1, 1), week()).is_err());
}

#[test]
fn test_date_grid_stops_at_calendar_end() {
    let grid = date_grid(date(2017, 1, 1), date(2017, 1, 20), Duration::days(1_000_000_000)).unwrap();
    assert_eq!(grid, vec![date(2017, 1, 1)]);

    let start = NaiveDate::MAX - Duration::days(10);
    let grid = date_grid(start, NaiveDate::MAX, week()).unwrap();
    assert_eq!(grid, vec![start, start + week()]);
}
