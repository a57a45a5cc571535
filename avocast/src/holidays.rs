//! Holiday and event tables used as exogenous regressors
//!
//! A [`HolidayRule`] is a template: it resolves to one or more dates per year
//! and carries the effect window shared by every instance it produces. The
//! [`HolidayTableBuilder`] expands a set of rules over a year range into a flat,
//! date-ordered [`HolidayTable`].
//!
//! Rules come in three shapes:
//!
//! - **Fixed**: the same month and day every year (New Year's Day).
//! - **Weekday**: the first (or n-th) given weekday on or after/before an
//!   anchor date (Super Bowl Sunday: first Sunday on or after February 1).
//! - **Calendar**: every entry of an external [`HolidayCalendar`] whose
//!   description contains a pattern, re-tagged under one canonical name.

use crate::error::{AvocastError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Largest distance in days an effect window may reach from its event
pub const MAX_WINDOW_DAYS: i32 = 366;

/// Inclusive day offsets around an event date over which it is assumed to act
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectWindow {
    /// Days before the event (usually zero or negative)
    pub lower: i32,
    /// Days after the event (usually zero or positive)
    pub upper: i32,
}

impl EffectWindow {
    pub fn new(lower: i32, upper: i32) -> Result<Self> {
        let window = Self { lower, upper };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lower.abs() > MAX_WINDOW_DAYS || self.upper.abs() > MAX_WINDOW_DAYS {
            return Err(AvocastError::InvalidParameter(format!(
                "Effect window ({}, {}) reaches beyond {} days",
                self.lower, self.upper, MAX_WINDOW_DAYS
            )));
        }
        if self.lower > self.upper {
            return Err(AvocastError::InvalidParameter(format!(
                "Effect window lower bound {} exceeds upper bound {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

/// Direction in which a weekday rule searches from its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDirection {
    Forward,
    Backward,
}

fn first_occurrence() -> u32 {
    1
}

/// Template describing how an event's date is found each year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HolidayRule {
    /// Same month and day every year
    Fixed {
        name: String,
        month: u32,
        day: u32,
        window: EffectWindow,
    },
    /// The `occurrence`-th `weekday` found stepping from the anchor date
    /// (the anchor itself counts)
    Weekday {
        name: String,
        month: u32,
        day: u32,
        weekday: Weekday,
        direction: SearchDirection,
        #[serde(default = "first_occurrence")]
        occurrence: u32,
        window: EffectWindow,
    },
    /// Entries of an external calendar whose description contains `pattern`
    Calendar {
        name: String,
        pattern: String,
        window: EffectWindow,
    },
}

impl HolidayRule {
    pub fn fixed(name: &str, month: u32, day: u32, window: EffectWindow) -> Self {
        HolidayRule::Fixed {
            name: name.to_string(),
            month,
            day,
            window,
        }
    }

    /// First `weekday` on or after (`Forward`) or on or before (`Backward`)
    /// the anchor
    pub fn weekday(
        name: &str,
        month: u32,
        day: u32,
        weekday: Weekday,
        direction: SearchDirection,
        window: EffectWindow,
    ) -> Self {
        HolidayRule::Weekday {
            name: name.to_string(),
            month,
            day,
            weekday,
            direction,
            occurrence: 1,
            window,
        }
    }

    pub fn calendar(name: &str, pattern: &str, window: EffectWindow) -> Self {
        HolidayRule::Calendar {
            name: name.to_string(),
            pattern: pattern.to_string(),
            window,
        }
    }

    /// Canonical event name
    pub fn name(&self) -> &str {
        match self {
            HolidayRule::Fixed { name, .. }
            | HolidayRule::Weekday { name, .. }
            | HolidayRule::Calendar { name, .. } => name,
        }
    }

    pub fn window(&self) -> EffectWindow {
        match self {
            HolidayRule::Fixed { window, .. }
            | HolidayRule::Weekday { window, .. }
            | HolidayRule::Calendar { window, .. } => *window,
        }
    }

    /// Check the rule is well formed independent of any particular year
    pub fn validate(&self) -> Result<()> {
        if self.name().trim().is_empty() {
            return Err(AvocastError::InvalidParameter(
                "Holiday rule name must not be empty".to_string(),
            ));
        }
        self.window().validate()?;

        match self {
            HolidayRule::Fixed { month, day, .. } | HolidayRule::Weekday { month, day, .. } => {
                // 2000 is a leap year, so any real month/day combination exists in it.
                if NaiveDate::from_ymd_opt(2000, *month, *day).is_none() {
                    return Err(AvocastError::InvalidParameter(format!(
                        "Rule '{}' has invalid month/day {}/{}",
                        self.name(),
                        month,
                        day
                    )));
                }
                if let HolidayRule::Weekday { occurrence: 0, .. } = self {
                    return Err(AvocastError::InvalidParameter(format!(
                        "Rule '{}' must have an occurrence of at least 1",
                        self.name()
                    )));
                }
            }
            HolidayRule::Calendar { pattern, .. } => {
                if pattern.trim().is_empty() {
                    return Err(AvocastError::InvalidParameter(format!(
                        "Rule '{}' has an empty calendar pattern",
                        self.name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Dates this rule produces in `year`; empty when it does not occur
    pub fn resolve(&self, year: i32, calendar: &dyn HolidayCalendar) -> Vec<NaiveDate> {
        match self {
            HolidayRule::Fixed { month, day, .. } => {
                NaiveDate::from_ymd_opt(year, *month, *day).into_iter().collect()
            }
            HolidayRule::Weekday {
                month,
                day,
                weekday,
                direction,
                occurrence,
                ..
            } => NaiveDate::from_ymd_opt(year, *month, *day)
                .and_then(|anchor| find_weekday(anchor, *weekday, *direction, *occurrence))
                .into_iter()
                .collect(),
            HolidayRule::Calendar { pattern, .. } => {
                let pattern = pattern.to_lowercase();
                let mut dates: Vec<NaiveDate> = calendar
                    .holidays(year)
                    .into_iter()
                    .filter(|(date, description)| {
                        date.year() == year && description.to_lowercase().contains(&pattern)
                    })
                    .map(|(date, _)| date)
                    .collect();
                dates.sort();
                dates.dedup();
                dates
            }
        }
    }
}

/// Step from `anchor` towards `direction` until the `occurrence`-th `weekday`
pub fn find_weekday(
    anchor: NaiveDate,
    weekday: Weekday,
    direction: SearchDirection,
    occurrence: u32,
) -> Option<NaiveDate> {
    let sign = match direction {
        SearchDirection::Forward => 1,
        SearchDirection::Backward => -1,
    };

    let mut date = anchor;
    while date.weekday() != weekday {
        date = date.checked_add_signed(Duration::days(sign))?;
    }
    let extra_weeks = i64::from(occurrence.saturating_sub(1));
    date.checked_add_signed(Duration::days(sign * 7 * extra_weeks))
}

/// A named calendar event with its effect window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEvent {
    #[serde(rename = "holiday")]
    pub name: String,
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    pub lower_window: i32,
    pub upper_window: i32,
}

impl HolidayEvent {
    /// First and last date influenced by this event; `None` when the window
    /// runs off the calendar
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self
            .date
            .checked_add_signed(Duration::days(i64::from(self.lower_window)))?;
        let last = self
            .date
            .checked_add_signed(Duration::days(i64::from(self.upper_window)))?;
        Some((first, last))
    }

    /// Whether `date` falls inside the effect window
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.span()
            .map_or(false, |(first, last)| date >= first && date <= last)
    }
}

/// Source of dated holiday descriptions for a year
pub trait HolidayCalendar {
    /// All holidays of `year` as `(date, description)` pairs
    fn holidays(&self, year: i32) -> Vec<(NaiveDate, String)>;
}

/// US federal holidays, including weekend-observed substitutes
#[derive(Debug, Clone, Copy, Default)]
pub struct UsFederalCalendar;

impl UsFederalCalendar {
    fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| find_weekday(first, weekday, SearchDirection::Forward, n))
    }

    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        next_month
            .and_then(|d| d.pred_opt())
            .and_then(|last| find_weekday(last, weekday, SearchDirection::Backward, 1))
    }

    fn observed(date: NaiveDate) -> Option<NaiveDate> {
        match date.weekday() {
            Weekday::Sat => date.pred_opt(),
            Weekday::Sun => date.succ_opt(),
            _ => None,
        }
    }
}

impl HolidayCalendar for UsFederalCalendar {
    fn holidays(&self, year: i32) -> Vec<(NaiveDate, String)> {
        let mut fixed = vec![
            (NaiveDate::from_ymd_opt(year, 1, 1), "New Year's Day"),
            (NaiveDate::from_ymd_opt(year, 7, 4), "Independence Day"),
            (NaiveDate::from_ymd_opt(year, 11, 11), "Veterans Day"),
            (NaiveDate::from_ymd_opt(year, 12, 25), "Christmas Day"),
        ];
        if year >= 2021 {
            fixed.push((
                NaiveDate::from_ymd_opt(year, 6, 19),
                "Juneteenth National Independence Day",
            ));
        }

        let floating = [
            (Self::nth_weekday(year, 1, Weekday::Mon, 3), "Martin Luther King Jr. Day"),
            (Self::nth_weekday(year, 2, Weekday::Mon, 3), "Washington's Birthday"),
            (Self::last_weekday(year, 5, Weekday::Mon), "Memorial Day"),
            (Self::nth_weekday(year, 9, Weekday::Mon, 1), "Labor Day"),
            (Self::nth_weekday(year, 10, Weekday::Mon, 2), "Columbus Day"),
            (Self::nth_weekday(year, 11, Weekday::Thu, 4), "Thanksgiving"),
        ];

        let mut holidays = Vec::new();
        for (date, name) in fixed {
            if let Some(date) = date {
                holidays.push((date, name.to_string()));
                if let Some(observed) = Self::observed(date).filter(|d| d.year() == year) {
                    holidays.push((observed, format!("{} (Observed)", name)));
                }
            }
        }
        for (date, name) in floating {
            if let Some(date) = date {
                holidays.push((date, name.to_string()));
            }
        }

        holidays.sort();
        holidays
    }
}

/// A calendar backed by an explicit list of entries
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    entries: Vec<(NaiveDate, String)>,
}

impl StaticCalendar {
    pub fn new(entries: Vec<(NaiveDate, String)>) -> Self {
        Self { entries }
    }
}

impl HolidayCalendar for StaticCalendar {
    fn holidays(&self, year: i32) -> Vec<(NaiveDate, String)> {
        self.entries
            .iter()
            .filter(|(date, _)| date.year() == year)
            .cloned()
            .collect()
    }
}

/// Flat, date-ordered table of holiday events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayTable {
    events: Vec<HolidayEvent>,
}

impl HolidayTable {
    /// The events that matter for avocado demand
    pub fn default_rules() -> Vec<HolidayRule> {
        vec![
            HolidayRule::calendar(
                "thanksgiving",
                "thanksgiving",
                EffectWindow { lower: -1, upper: 1 },
            ),
            HolidayRule::fixed("new_years", 1, 1, EffectWindow { lower: 0, upper: 1 }),
            HolidayRule::weekday(
                "super_bowl",
                2,
                1,
                Weekday::Sun,
                SearchDirection::Forward,
                EffectWindow { lower: -1, upper: 1 },
            ),
            HolidayRule::fixed("cinco_de_mayo", 5, 5, EffectWindow { lower: 0, upper: 1 }),
        ]
    }

    /// Build a table from events in any order
    pub fn from_events(mut events: Vec<HolidayEvent>) -> Self {
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        Self { events }
    }

    pub fn events(&self) -> &[HolidayEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct event names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.counts_by_name().into_keys().collect()
    }

    /// Number of occurrences of each event name
    pub fn counts_by_name(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.name.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Events whose effect window covers `date`
    pub fn active_on(&self, date: NaiveDate) -> impl Iterator<Item = &HolidayEvent> + '_ {
        self.events.iter().filter(move |event| event.covers(date))
    }

    /// Every date inside an effect window, paired with the event name
    pub fn affected_dates(&self) -> Vec<(NaiveDate, &str)> {
        let mut dates = Vec::new();
        for event in &self.events {
            for offset in event.lower_window..=event.upper_window {
                if let Some(date) = event
                    .date
                    .checked_add_signed(Duration::days(i64::from(offset)))
                {
                    dates.push((date, event.name.as_str()));
                }
            }
        }
        dates.sort();
        dates
    }
}

/// Expands holiday rules over an inclusive year range
#[derive(Debug, Clone)]
pub struct HolidayTableBuilder {
    start_year: i32,
    end_year: i32,
    rules: Vec<HolidayRule>,
}

impl HolidayTableBuilder {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
            rules: Vec::new(),
        }
    }

    /// Add one rule
    pub fn rule(mut self, rule: HolidayRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add several rules
    pub fn rules(mut self, rules: impl IntoIterator<Item = HolidayRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Resolve every rule for every year in range.
    ///
    /// A rule that finds nothing in one year is skipped for that year with a
    /// warning. A rule that finds nothing in any year is an error, as is
    /// reusing an event name with a different window.
    pub fn build(&self, calendar: &dyn HolidayCalendar) -> Result<HolidayTable> {
        if self.start_year > self.end_year {
            return Err(AvocastError::InvalidParameter(format!(
                "Holiday start year {} is after end year {}",
                self.start_year, self.end_year
            )));
        }

        let mut windows: HashMap<&str, EffectWindow> = HashMap::new();
        for rule in &self.rules {
            rule.validate()?;
            if let Some(existing) = windows.insert(rule.name(), rule.window()) {
                if existing != rule.window() {
                    return Err(AvocastError::RuleResolution {
                        rule: rule.name().to_string(),
                        reason: format!(
                            "conflicting effect windows ({}, {}) and ({}, {})",
                            existing.lower,
                            existing.upper,
                            rule.window().lower,
                            rule.window().upper
                        ),
                    });
                }
            }
        }

        let mut events = Vec::new();
        for rule in &self.rules {
            let window = rule.window();
            let mut matched = 0usize;

            for year in self.start_year..=self.end_year {
                let dates = rule.resolve(year, calendar);
                if dates.is_empty() {
                    warn!(rule = rule.name(), year, "Holiday rule has no date this year, skipping");
                    continue;
                }
                matched += dates.len();
                events.extend(dates.into_iter().map(|date| HolidayEvent {
                    name: rule.name().to_string(),
                    date,
                    lower_window: window.lower,
                    upper_window: window.upper,
                }));
            }

            if matched == 0 {
                return Err(AvocastError::RuleResolution {
                    rule: rule.name().to_string(),
                    reason: format!(
                        "no dates found between {} and {}",
                        self.start_year, self.end_year
                    ),
                });
            }
            debug!(rule = rule.name(), occurrences = matched, "Resolved holiday rule");
        }

        Ok(HolidayTable::from_events(events))
    }
}
