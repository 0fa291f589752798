//! Wait-time estimation for the safe-to-drive window.
//!
//! This is a rule-based heuristic, not a pharmacokinetic model. A base
//! duration chosen by usage frequency is scaled by fixed multipliers for
//! dose, consumption method, age and body weight, in that order. The
//! 12 hour floor and the round-up to whole hours happen once, at the end.
//!
//! ## Thresholds
//!
//! Two thresholds are presented to the user: a conservative one for the
//! primary recommendation and a less strict informational one. Both are
//! currently computed by the same formula and therefore yield the same
//! number of hours. A shorter informational estimate is a pending product
//! decision, so no second formula exists here.

use chrono::{DateTime, Duration, Local, LocalResult, TimeZone, Utc};
use shared::{ConsumptionMethod, Frequency};

use super::models::validation::{validate_age, validate_amount, validate_weight, InvalidInput};
use crate::config::Settings;

pub const MINIMUM_WAIT_HOURS: f64 = 12.0;

const HIGH_DOSE_GRAMS: f64 = 0.5;
const LOW_DOSE_GRAMS: f64 = 0.1;

/// Which target serum level an estimate is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    Conservative,
    Informational,
}

impl Threshold {
    /// Target serum level in ng/mL, as configured
    pub fn ng_per_ml(&self, settings: &Settings) -> f64 {
        match self {
            Threshold::Conservative => settings.conservative_threshold_ng_per_ml,
            Threshold::Informational => settings.informational_threshold_ng_per_ml,
        }
    }
}

/// Wait hours split into whole days and the remaining hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitBreakdown {
    pub days: u32,
    pub hours: u32,
}

impl From<u32> for WaitBreakdown {
    fn from(wait_hours: u32) -> Self {
        Self {
            days: wait_hours / 24,
            hours: wait_hours % 24,
        }
    }
}

/// Base duration in hours for a usage frequency
pub fn base_hours(frequency: Frequency) -> f64 {
    match frequency {
        Frequency::Occasional => 18.0,
        Frequency::Regular => 96.0,
        Frequency::Chronic => 168.0,
    }
}

pub fn dose_multiplier(amount: f64) -> f64 {
    if amount > HIGH_DOSE_GRAMS {
        2.0
    } else if amount < LOW_DOSE_GRAMS {
        0.75
    } else {
        1.0
    }
}

pub fn method_multiplier(method: ConsumptionMethod) -> f64 {
    match method {
        ConsumptionMethod::Oral => 1.5,
        ConsumptionMethod::Smoked => 1.0,
    }
}

pub fn age_multiplier(age: u32) -> f64 {
    if age > 60 {
        1.2
    } else if age > 40 {
        1.1
    } else {
        1.0
    }
}

pub fn weight_multiplier(weight: u32) -> f64 {
    if weight > 100 {
        1.2
    } else if weight < 60 {
        0.9
    } else {
        1.0
    }
}

/// Whole hours to wait before the conservative threshold is expected to be reached.
///
/// Always at least [`MINIMUM_WAIT_HOURS`]. Inputs outside their documented
/// domains are rejected with [`InvalidInput`].
pub fn estimate_wait_hours(
    age: u32,
    weight: u32,
    frequency: Frequency,
    amount: f64,
    method: ConsumptionMethod,
) -> Result<u32, InvalidInput> {
    validate_age(age)?;
    validate_weight(weight)?;
    validate_amount(amount)?;

    // Order matters for float rounding; keep it identical to the documented sequence.
    let mut hours = base_hours(frequency);
    hours *= dose_multiplier(amount);
    hours *= method_multiplier(method);
    hours *= age_multiplier(age);
    hours *= weight_multiplier(weight);

    Ok(hours.max(MINIMUM_WAIT_HOURS).ceil() as u32)
}

/// Whole hours to wait before the informational threshold is expected to be reached.
///
/// Same formula as [`estimate_wait_hours`]; see the module docs.
pub fn estimate_informational_hours(
    age: u32,
    weight: u32,
    frequency: Frequency,
    amount: f64,
    method: ConsumptionMethod,
) -> Result<u32, InvalidInput> {
    estimate_wait_hours(age, weight, frequency, amount, method)
}

pub fn estimate_for_threshold(
    threshold: Threshold,
    age: u32,
    weight: u32,
    frequency: Frequency,
    amount: f64,
    method: ConsumptionMethod,
) -> Result<u32, InvalidInput> {
    match threshold {
        Threshold::Conservative => estimate_wait_hours(age, weight, frequency, amount, method),
        Threshold::Informational => estimate_informational_hours(age, weight, frequency, amount, method),
    }
}

/// Informational THC half-life in days for a usage frequency
pub fn thc_half_life_days(frequency: Frequency) -> f64 {
    match frequency {
        Frequency::Occasional => 1.3,
        Frequency::Regular => 3.0,
        Frequency::Chronic => 7.0,
    }
}

/// Add wall-clock hours in the timezone of `start`.
///
/// Crossing a DST change keeps the local clock reading `hours` ahead rather
/// than adding a fixed number of seconds. A local time that falls into a
/// spring-forward gap is pushed past the gap; a repeated local time resolves
/// to its earlier occurrence.
pub fn add_civil_hours<Tz: TimeZone>(start: &DateTime<Tz>, hours: u32) -> DateTime<Tz> {
    let offset = Duration::hours(i64::from(hours));
    let target = start.naive_local() + offset;

    match start.timezone().from_local_datetime(&target) {
        LocalResult::Single(time) => time,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => start.clone() + offset,
    }
}

/// Safe-drive time for an event, adding hours on the given timezone's calendar
pub fn safe_drive_time_in<Tz: TimeZone>(event_time: DateTime<Utc>, wait_hours: u32, timezone: &Tz) -> DateTime<Utc> {
    add_civil_hours(&event_time.with_timezone(timezone), wait_hours).with_timezone(&Utc)
}

/// Safe-drive time for an event on the device's local calendar
pub fn safe_drive_time(event_time: DateTime<Utc>, wait_hours: u32) -> DateTime<Utc> {
    safe_drive_time_in(event_time, wait_hours, &Local)
}

pub fn is_safe_now(now: DateTime<Utc>, safe_drive_time: DateTime<Utc>) -> bool {
    now >= safe_drive_time
}

/// Explanation shown with a result; the numbers match the computed values
pub fn build_explanation(wait_hours: u32, frequency: Frequency, amount: f64, threshold_ng_per_ml: f64) -> String {
    let breakdown = WaitBreakdown::from(wait_hours);

    let mut explanation = format!(
        "You should wait {} hours to stay below {:.1} ng/mL THC in serum. ",
        wait_hours, threshold_ng_per_ml
    );

    if breakdown.days > 0 {
        explanation.push_str(&format!(
            "That equals {} day{} and {} hours. ",
            breakdown.days,
            if breakdown.days > 1 { "s" } else { "" },
            breakdown.hours
        ));
    }

    explanation.push_str(&format!(
        "This value is calculated conservatively and accounts for your usage frequency ({}) and the amount consumed ({}g).",
        frequency, amount
    ));

    explanation
}
