use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Usage pattern category; drives the base wait time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Less than once a week
    Occasional,
    /// Two to four times a week
    Regular,
    /// Daily or almost daily
    Chronic,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Occasional, Frequency::Regular, Frequency::Chronic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Occasional => "occasional",
            Frequency::Regular => "regular",
            Frequency::Chronic => "chronic",
        }
    }

    /// Human-readable description for selection lists
    pub fn description(&self) -> &'static str {
        match self {
            Frequency::Occasional => "Occasional (less than once a week)",
            Frequency::Regular => "Regular (2-4 times a week)",
            Frequency::Chronic => "Chronic (daily or almost daily)",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "occasional" => Ok(Frequency::Occasional),
            "regular" => Ok(Frequency::Regular),
            "chronic" => Ok(Frequency::Chronic),
            other => Err(format!("Unknown frequency: {}", other)),
        }
    }
}

/// How the cannabis was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionMethod {
    /// Joint, bong, vaporizer
    #[default]
    Smoked,
    /// Edibles, tinctures
    Oral,
}

impl ConsumptionMethod {
    pub const ALL: [ConsumptionMethod; 2] = [ConsumptionMethod::Smoked, ConsumptionMethod::Oral];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionMethod::Smoked => "smoked",
            ConsumptionMethod::Oral => "oral",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConsumptionMethod::Smoked => "Smoked (joint, bong, etc.)",
            ConsumptionMethod::Oral => "Oral (edibles, tincture, etc.)",
        }
    }
}

impl fmt::Display for ConsumptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsumptionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smoked" => Ok(ConsumptionMethod::Smoked),
            "oral" => Ok(ConsumptionMethod::Oral),
            other => Err(format!("Unknown consumption method: {}", other)),
        }
    }
}

/// A saved bundle of personal risk factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Opaque identifier, immutable once created
    pub id: String,
    pub name: String,
    /// Age in years (18-100)
    pub age: u32,
    /// Body weight in kilograms (40-200)
    pub weight: u32,
    pub frequency: Frequency,
    /// Default method offered for new consumptions
    pub method: ConsumptionMethod,
    pub created_at: DateTime<Utc>,
}

/// A single reported intake event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub id: String,
    pub profile_id: String,
    /// Amount in grams (0.01-10)
    pub amount: f64,
    pub method: ConsumptionMethod,
    /// When the consumption happened; may be backdated
    pub timestamp: DateTime<Utc>,
    /// When the entry was saved
    pub created_at: DateTime<Utc>,
}

/// Computed outcome for one consumption, under both thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub id: String,
    pub profile_id: String,
    pub consumption_id: String,
    /// Earliest time the conservative threshold is expected to be reached
    pub safe_drive_time: DateTime<Utc>,
    pub wait_hours: u32,
    pub explanation: String,
    /// Earliest time the informational threshold is expected to be reached
    pub informational_time: DateTime<Utc>,
    pub informational_hours: u32,
    pub created_at: DateTime<Utc>,
}

/// Joined view of a result with the profile and consumption it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationHistory {
    pub profile: Profile,
    pub consumption: Consumption,
    pub result: CalculationResult,
}

/// Whether the thresholds of a result have been reached at a given instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveStatus {
    pub is_safe_now: bool,
    pub is_below_informational: bool,
    /// Whole minutes until the conservative time, zero once reached
    pub minutes_until_safe: i64,
    /// Whole minutes until the informational time, zero once reached
    pub minutes_until_informational: i64,
}

/// Full dump of the on-device data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    pub exported_at: DateTime<Utc>,
    pub profiles: Vec<Profile>,
    pub consumptions: Vec<Consumption>,
    pub results: Vec<CalculationResult>,
    pub history: Vec<CalculationHistory>,
}
