//! Structured facts learned about the person chatting.
//!
//! The schema is closed: unknown keys are rejected when a persisted document
//! is loaded. Every field is optional so the same types double as partial
//! updates; see [`UserFacts::merge`] for the merge rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accumulated knowledge about the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_data: Option<HealthData>,
}

/// Constitution and lifestyle preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Preferences {
    /// Dominant dosha.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosha: Option<Dosha>,

    /// Natural constitution, e.g. `vata` or `pitta-kapha`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prakruti: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diet: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dinacharya: Option<Dinacharya>,
}

/// Daily routine. Only the wake-up time is tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Dinacharya {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_time: Option<String>,
}

/// Health information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HealthData {
    /// Free-text conditions, as the user phrased them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agni: Option<Agni>,

    /// Most recent readings from a fitness tracker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<HealthMetrics>,
}

/// Recent numeric health readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HealthMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u64>,

    /// Beats per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<u32>,
}

/// The three doshas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dosha {
    Vata,
    Pitta,
    Kapha,
}

impl fmt::Display for Dosha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dosha::Vata => write!(f, "vata"),
            Dosha::Pitta => write!(f, "pitta"),
            Dosha::Kapha => write!(f, "kapha"),
        }
    }
}

impl FromStr for Dosha {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vata" => Ok(Dosha::Vata),
            "pitta" => Ok(Dosha::Pitta),
            "kapha" => Ok(Dosha::Kapha),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

/// Digestive strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agni {
    Strong,
    Weak,
    Variable,
    Irregular,
}

impl fmt::Display for Agni {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agni::Strong => write!(f, "strong"),
            Agni::Weak => write!(f, "weak"),
            Agni::Variable => write!(f, "variable"),
            Agni::Irregular => write!(f, "irregular"),
        }
    }
}

impl FromStr for Agni {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong" => Ok(Agni::Strong),
            "weak" => Ok(Agni::Weak),
            "variable" => Ok(Agni::Variable),
            "irregular" => Ok(Agni::Irregular),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

/// A label outside a fixed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: {0:?}")]
pub struct UnknownLabel(pub String);

impl UserFacts {
    /// An update carrying only preferences.
    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            preferences: Some(preferences),
            health_data: None,
        }
    }

    /// An update carrying only health data.
    pub fn with_health_data(health_data: HealthData) -> Self {
        Self {
            preferences: None,
            health_data: Some(health_data),
        }
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.preferences.as_ref().map_or(true, Preferences::is_empty)
            && self.health_data.as_ref().map_or(true, HealthData::is_empty)
    }

    /// Merge a partial update into these facts.
    ///
    /// Only fields present in `update` change. Scalars are replaced; lists
    /// gain the entries they did not already hold.
    pub fn merge(&mut self, update: UserFacts) {
        if let Some(preferences) = update.preferences {
            self.preferences
                .get_or_insert_with(Preferences::default)
                .merge(preferences);
        }
        if let Some(health_data) = update.health_data {
            self.health_data
                .get_or_insert_with(HealthData::default)
                .merge(health_data);
        }
    }

    /// Render a bullet summary for the system prompt.
    ///
    /// Absent fields are skipped; an empty set of facts renders as an empty
    /// string.
    pub fn render_context(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        if let Some(ref prefs) = self.preferences {
            if let Some(dosha) = prefs.dosha {
                lines.push(format!("- Dominant dosha: {dosha}"));
            }
            if let Some(ref prakruti) = prefs.prakruti {
                lines.push(format!("- Prakruti (natural constitution): {prakruti}"));
            }
            if !prefs.diet.is_empty() {
                lines.push(format!("- Dietary preferences: {}", prefs.diet.join(", ")));
            }
            if let Some(wake_time) = prefs.dinacharya.as_ref().and_then(|d| d.wake_time.as_ref()) {
                lines.push(format!("- Usually wakes up at: {wake_time}"));
            }
            if !prefs.allergies.is_empty() {
                lines.push(format!("- Allergies: {}", prefs.allergies.join(", ")));
            }
        }

        if let Some(ref health) = self.health_data {
            if !health.conditions.is_empty() {
                lines.push(format!("- Health conditions: {}", health.conditions.join(", ")));
            }
            if let Some(agni) = health.agni {
                lines.push(format!("- Digestive fire (agni): {agni}"));
            }
            if let Some(ref metrics) = health.metrics {
                let readings = metrics.readings();
                if !readings.is_empty() {
                    lines.push(format!("- Recent health metrics: {}", readings.join(", ")));
                }
            }
        }

        if lines.is_empty() {
            return String::new();
        }

        let mut context = String::from("## What you know about the user\n");
        context.push_str(&lines.join("\n"));
        context
    }
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self.dosha.is_none()
            && self.prakruti.is_none()
            && self.diet.is_empty()
            && self.allergies.is_empty()
            && self
                .dinacharya
                .as_ref()
                .map_or(true, |d| d.wake_time.is_none())
    }

    fn merge(&mut self, update: Preferences) {
        if update.dosha.is_some() {
            self.dosha = update.dosha;
        }
        if update.prakruti.is_some() {
            self.prakruti = update.prakruti;
        }
        extend_unique(&mut self.diet, update.diet);
        extend_unique(&mut self.allergies, update.allergies);
        if let Some(wake_time) = update.dinacharya.and_then(|d| d.wake_time) {
            self.dinacharya.get_or_insert_with(Dinacharya::default).wake_time = Some(wake_time);
        }
    }
}

impl HealthData {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.agni.is_none()
            && self.metrics.as_ref().map_or(true, HealthMetrics::is_empty)
    }

    fn merge(&mut self, update: HealthData) {
        extend_unique(&mut self.conditions, update.conditions);
        if update.agni.is_some() {
            self.agni = update.agni;
        }
        if let Some(metrics) = update.metrics {
            self.metrics
                .get_or_insert_with(HealthMetrics::default)
                .merge(metrics);
        }
    }
}

impl HealthMetrics {
    pub fn is_empty(&self) -> bool {
        self.steps.is_none()
            && self.heart_rate.is_none()
            && self.sleep_hours.is_none()
            && self.calories_burned.is_none()
    }

    fn merge(&mut self, update: HealthMetrics) {
        if update.steps.is_some() {
            self.steps = update.steps;
        }
        if update.heart_rate.is_some() {
            self.heart_rate = update.heart_rate;
        }
        if update.sleep_hours.is_some() {
            self.sleep_hours = update.sleep_hours;
        }
        if update.calories_burned.is_some() {
            self.calories_burned = update.calories_burned;
        }
    }

    fn readings(&self) -> Vec<String> {
        let mut readings = Vec::new();
        if let Some(steps) = self.steps {
            readings.push(format!("{steps} steps"));
        }
        if let Some(bpm) = self.heart_rate {
            readings.push(format!("heart rate {bpm} bpm"));
        }
        if let Some(hours) = self.sleep_hours {
            readings.push(format!("{hours:.1} h sleep"));
        }
        if let Some(kcal) = self.calories_burned {
            readings.push(format!("{kcal} kcal burned"));
        }
        readings
    }
}

/// Append entries not already present before the call.
///
/// Comparison is against the existing list only, so a repeat inside
/// `incoming` is kept.
fn extend_unique(existing: &mut Vec<String>, incoming: Vec<String>) {
    let original_len = existing.len();
    for item in incoming {
        if !existing[..original_len].contains(&item) {
            existing.push(item);
        }
    }
}
