//! Pattern-based fact extraction from chat text.
//!
//! Each rule is a pure function from text to an optional partial
//! [`UserFacts`] update. Rules are independent: several may fire on one
//! message, none consults previously stored facts, and all matching is
//! case-insensitive. [`extract`] runs every rule and merges the results.
//!
//! The patterns are deliberately simple, so false positives and misses are
//! expected ("I have kapha" also reads as a health condition).

use crate::facts::{Agni, Dinacharya, Dosha, HealthData, Preferences, UserFacts};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A single extraction rule.
pub type Rule = fn(&str) -> Option<UserFacts>;

/// Every rule, by name, in the order they are applied.
pub const RULES: &[(&str, Rule)] = &[
    ("dosha", dosha_rule),
    ("prakruti", prakruti_rule),
    ("diet", diet_rule),
    ("condition", condition_rule),
    ("agni", agni_rule),
    ("wake_time", wake_time_rule),
];

/// Dietary tags recognised anywhere in the text.
pub const DIET_TAGS: &[&str] = &["vegetarian", "vegan", "sattvic"];

static DOSHA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:my\s+dosha\s+is|i\s+am|i\s+have|i['’]m)\s+(?:an?\s+)?(vata|pitta|kapha)\b")
        .expect("valid regex")
});

static PRAKRUTI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bmy\s+(?:prakruti|constitution)\s+is\s+((?:vata|pitta|kapha)(?:\s*-\s*(?:vata|pitta|kapha))?)\b",
    )
    .expect("valid regex")
});

static CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bi\s+(?:have|suffer\s+from|experience)\s+([^.!?\n]+)").expect("valid regex")
});

static AGNI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:my\s+agni\s+is|digestive\s+fire\s+is)\s+(strong|weak|variable|irregular)\b")
        .expect("valid regex")
});

static WAKE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwake\s+up\b[^\d.!?\n]*?(\d{1,2}(?::\d{2})?(?:\s*(?:am|pm)\b)?)")
        .expect("valid regex")
});

/// Run every rule over `text` and merge what they find.
///
/// Returns an empty update when nothing matched.
pub fn extract(text: &str) -> UserFacts {
    let mut update = UserFacts::default();
    for (name, rule) in RULES {
        if let Some(found) = rule(text) {
            debug!(rule = name, "fact rule matched");
            update.merge(found);
        }
    }
    update
}

/// "my dosha is X", "I am X", "I have X", "I'm X".
pub fn dosha_rule(text: &str) -> Option<UserFacts> {
    let caps = DOSHA_RE.captures(text)?;
    let dosha: Dosha = caps[1].parse().ok()?;
    Some(UserFacts::with_preferences(Preferences {
        dosha: Some(dosha),
        ..Default::default()
    }))
}

/// "my prakruti is Y" / "my constitution is Y", Y a dosha or hyphenated pair.
pub fn prakruti_rule(text: &str) -> Option<UserFacts> {
    let caps = PRAKRUTI_RE.captures(text)?;
    let prakruti: String = caps[1]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    Some(UserFacts::with_preferences(Preferences {
        prakruti: Some(prakruti),
        ..Default::default()
    }))
}

/// Each of [`DIET_TAGS`] found anywhere in the text.
pub fn diet_rule(text: &str) -> Option<UserFacts> {
    let lower = text.to_lowercase();
    let diet: Vec<String> = DIET_TAGS
        .iter()
        .filter(|tag| lower.contains(*tag))
        .map(|tag| tag.to_string())
        .collect();

    if diet.is_empty() {
        return None;
    }
    Some(UserFacts::with_preferences(Preferences {
        diet,
        ..Default::default()
    }))
}

/// First "I have X" / "I suffer from X" / "I experience X", up to the end
/// of the sentence.
pub fn condition_rule(text: &str) -> Option<UserFacts> {
    let caps = CONDITION_RE.captures(text)?;
    let condition = caps[1].trim();
    if condition.is_empty() {
        return None;
    }
    Some(UserFacts::with_health_data(HealthData {
        conditions: vec![condition.to_string()],
        ..Default::default()
    }))
}

/// "my agni is S" / "digestive fire is S".
pub fn agni_rule(text: &str) -> Option<UserFacts> {
    let caps = AGNI_RE.captures(text)?;
    let agni: Agni = caps[1].parse().ok()?;
    Some(UserFacts::with_health_data(HealthData {
        agni: Some(agni),
        ..Default::default()
    }))
}

/// "wake up" followed, in the same sentence and on the same line, by a
/// time such as `6`, `6:30` or `6:30 am`.
pub fn wake_time_rule(text: &str) -> Option<UserFacts> {
    let caps = WAKE_TIME_RE.captures(text)?;
    let wake_time = caps[1].trim().to_lowercase();
    Some(UserFacts::with_preferences(Preferences {
        dinacharya: Some(Dinacharya {
            wake_time: Some(wake_time),
        }),
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(facts: &UserFacts) -> &Preferences {
        facts.preferences.as_ref().expect("preferences")
    }

    fn health(facts: &UserFacts) -> &HealthData {
        facts.health_data.as_ref().expect("health data")
    }

    #[test]
    fn test_dosha_and_diet_together() {
        let update = extract("I am vata and I am vegetarian");
        assert_eq!(
            update,
            UserFacts::with_preferences(Preferences {
                dosha: Some(Dosha::Vata),
                diet: vec!["vegetarian".to_string()],
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        let update = extract("What should I eat for breakfast?");
        assert!(update.is_empty());
        assert_eq!(update, UserFacts::default());
    }

    #[test]
    fn test_dosha_phrasings() {
        for text in [
            "My dosha is Pitta.",
            "i'm pitta",
            "I’m PITTA these days",
            "I have pitta imbalance",
            "I am a pitta type",
        ] {
            let update = dosha_rule(text).unwrap_or_else(|| panic!("no match for {text:?}"));
            assert_eq!(prefs(&update).dosha, Some(Dosha::Pitta), "{text}");
        }
        assert!(dosha_rule("I am tired").is_none());
        assert!(dosha_rule("I am vatalike").is_none());
    }

    #[test]
    fn test_prakruti() {
        let update = prakruti_rule("My prakruti is Vata-Pitta").unwrap();
        assert_eq!(prefs(&update).prakruti.as_deref(), Some("vata-pitta"));

        let update = prakruti_rule("my constitution is kapha").unwrap();
        assert_eq!(prefs(&update).prakruti.as_deref(), Some("kapha"));

        assert!(prakruti_rule("my prakruti is unknown").is_none());
    }

    #[test]
    fn test_diet_tags() {
        let update = diet_rule("Mostly VEGAN, sometimes sattvic").unwrap();
        assert_eq!(prefs(&update).diet, vec!["vegan", "sattvic"]);
        assert!(diet_rule("I eat everything").is_none());
    }

    #[test]
    fn test_condition_first_match_trimmed() {
        let update = condition_rule("I suffer from  acid reflux . I have insomnia too.").unwrap();
        assert_eq!(health(&update).conditions, vec!["acid reflux"]);

        let update = condition_rule("Lately I experience bloating after meals!").unwrap();
        assert_eq!(health(&update).conditions, vec!["bloating after meals"]);

        assert!(condition_rule("I had a cold").is_none());
    }

    #[test]
    fn test_agni() {
        let update = agni_rule("My agni is WEAK").unwrap();
        assert_eq!(health(&update).agni, Some(Agni::Weak));

        let update = agni_rule("the doctor said my digestive fire is irregular").unwrap();
        assert_eq!(health(&update).agni, Some(Agni::Irregular));

        assert!(agni_rule("my agni is fine").is_none());
    }

    #[test]
    fn test_wake_time() {
        let cases = [
            ("I usually wake up at 6:30 AM", "6:30 am"),
            ("I wake up around 5am", "5am"),
            ("wake up at 7 every day", "7"),
            ("I wake up at 05:45", "05:45"),
        ];
        for (text, expected) in cases {
            let update = wake_time_rule(text).unwrap_or_else(|| panic!("no match for {text:?}"));
            let wake = prefs(&update)
                .dinacharya
                .as_ref()
                .and_then(|d| d.wake_time.as_deref());
            assert_eq!(wake, Some(expected), "{text}");
        }
        assert!(wake_time_rule("I wake up early").is_none());
        assert!(wake_time_rule("At 6 I wake up").is_none());
    }

    #[test]
    fn test_wake_time_stops_at_line_break() {
        let text = "How can I wake up earlier\nHere are some tips:\n\n1. Go to bed by 10 pm";
        assert!(wake_time_rule(text).is_none());
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_rules_fire_independently() {
        let update = extract(
            "I'm kapha, my agni is variable and I suffer from sinus congestion. I wake up at 7:15 am.",
        );
        assert_eq!(prefs(&update).dosha, Some(Dosha::Kapha));
        assert_eq!(
            prefs(&update).dinacharya.as_ref().unwrap().wake_time.as_deref(),
            Some("7:15 am")
        );
        assert_eq!(health(&update).agni, Some(Agni::Variable));
        assert_eq!(health(&update).conditions, vec!["sinus congestion"]);
    }

    #[test]
    fn test_have_dosha_also_reads_as_condition() {
        let update = extract("I have kapha");
        assert_eq!(prefs(&update).dosha, Some(Dosha::Kapha));
        assert_eq!(health(&update).conditions, vec!["kapha"]);
    }
}
