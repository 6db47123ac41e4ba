//! Temporal feature extraction
//!
//! Calendar fields, cyclical encodings and packed HHMM schedule times derived
//! from the departure timestamp and the route distance.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use tracing::debug;

use super::{FeatureMap, FeatureValue, columns};

/// Average cruise speed used to estimate block time
pub const CRUISE_SPEED_KMH: f64 = 800.0;

const ZONED_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Resolve the departure time of a query.
///
/// Offsets are accepted but the wall-clock time as written is used. Missing or
/// unparsable input falls back to `now`.
#[must_use]
pub fn parse_departure(raw: Option<&str>, now: NaiveDateTime) -> NaiveDateTime {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return now;
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_local();
    }

    let zoned = match raw.strip_suffix(['Z', 'z']) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => raw.to_string(),
    };
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, format) {
            return dt.naive_local();
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return dt;
        }
    }

    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return dt;
    }

    debug!("Unparsable departure '{}', using current time", raw);
    now
}

/// Calendar features for one departure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalFeatures {
    /// 1-12
    pub month: u32,
    /// 1-4
    pub quarter: u32,
    /// 1-31
    pub day_of_month: u32,
    /// 0 = Monday … 6 = Sunday
    pub day_of_week: u32,
    pub month_sin: f64,
    pub month_cos: f64,
    pub weekday_sin: f64,
    pub weekday_cos: f64,
    /// 1 on Saturday and Sunday
    pub weekend: u8,
    /// HHMM packed departure time
    pub scheduled_departure: u32,
    /// HHMM packed estimated arrival time, wrapped to 24h
    pub scheduled_arrival: u32,
}

impl TemporalFeatures {
    #[must_use]
    pub fn encode(departure: NaiveDateTime, distance_km: f64) -> Self {
        let month = departure.month();
        let day_of_week = departure.weekday().num_days_from_monday();
        let (month_sin, month_cos) = cyclical(f64::from(month), 12.0);
        let (weekday_sin, weekday_cos) = cyclical(f64::from(day_of_week), 7.0);

        Self {
            month,
            quarter: (month - 1) / 3 + 1,
            day_of_month: departure.day(),
            day_of_week,
            month_sin,
            month_cos,
            weekday_sin,
            weekday_cos,
            weekend: u8::from(day_of_week >= 5),
            scheduled_departure: departure.hour() * 100 + departure.minute(),
            scheduled_arrival: estimated_arrival(departure, distance_km),
        }
    }

    /// Write the temporal columns into a raw feature map
    pub fn insert_into(&self, features: &mut FeatureMap) {
        let entries = [
            (columns::MONTH_SIN, self.month_sin),
            (columns::MONTH_COS, self.month_cos),
            (columns::WEEKDAY_SIN, self.weekday_sin),
            (columns::WEEKDAY_COS, self.weekday_cos),
            (columns::WEEKEND, f64::from(self.weekend)),
            (columns::MONTH, f64::from(self.month)),
            (columns::QUARTER, f64::from(self.quarter)),
            (columns::DAY_OF_MONTH, f64::from(self.day_of_month)),
            (columns::DAY_OF_WEEK, f64::from(self.day_of_week)),
            (columns::DEPARTURE_TIME, f64::from(self.scheduled_departure)),
            (columns::ARRIVAL_TIME, f64::from(self.scheduled_arrival)),
        ];
        for (name, value) in entries {
            features.insert(name.to_string(), FeatureValue::Numeric(value));
        }
    }
}

fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

fn estimated_arrival(departure: NaiveDateTime, distance_km: f64) -> u32 {
    let flight_hours = distance_km.max(0.0) / CRUISE_SPEED_KMH;
    // truncated to whole minutes
    let flight_minutes = (flight_hours * 60.0) as u64;
    let total = u64::from(departure.hour() * 60 + departure.minute()) + flight_minutes;
    let hour = (total / 60) % 24;
    let minute = total % 60;
    (hour * 100 + minute) as u32
}
