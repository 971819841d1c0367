//! Health scoring and alert classification for incoming sensor readings.
//!
//! This is the one piece of real domain logic in the service: a small rule
//! engine that maps the four primary sensor channels (three gas
//! concentrations plus water level) to a bounded 0–100 health score and a
//! set of alert events. Both functions are pure; persistence of the
//! resulting alert rows is the ingestion route's responsibility.
//!
//! Thresholds live in one declarative table (`CHANNELS`) rather than being
//! scattered through the handlers, so tuning a sensor band is a data edit.

use serde::Serialize;

// ---

/// The four sensor channels a reading contributes to the health score.
///
/// `temperature` and `humidity` are stored with the reading but carry no
/// weight in the score and raise no alerts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    // ---
    pub mq135: f64,
    pub mq7: f64,
    pub mq4: f64,
    pub water_level: f64,
}

/// Alert severity. `Danger` takes precedence over `Warning` for the same
/// channel, so a single reading yields at most one event per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Danger,
}

impl Severity {
    // ---
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

/// One alert produced by classifying a reading. The caller attaches the
/// node id when inserting the row.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    // ---
    pub alert_type: &'static str,
    pub message: String,
    pub severity: Severity,
}

// ---

/// Per-channel threshold band and score weight.
///
/// Values at or below `warn` are safe: no penalty, no alert. Values at or
/// above `danger` deduct the full `weight` from the score and raise a
/// danger alert. In between, the penalty interpolates linearly and the
/// channel raises a warning alert.
#[derive(Debug)]
pub struct Threshold {
    // ---
    /// Alert type label, e.g. "CO" for the MQ-7 channel.
    pub alert_type: &'static str,
    /// Human-readable channel name used in alert messages.
    pub subject: &'static str,
    /// Unit suffix appended to the value in alert messages.
    pub unit: &'static str,
    pub warn: f64,
    pub danger: f64,
    /// Maximum score deduction for this channel.
    pub weight: f64,
}

/// MQ-135 reads hydrogen sulfide / general air quality.
pub const MQ135: Threshold = Threshold {
    alert_type: "H2S",
    subject: "H2S",
    unit: "",
    warn: 100.0,
    danger: 300.0,
    weight: 30.0,
};

/// MQ-7 reads carbon monoxide.
pub const MQ7: Threshold = Threshold {
    alert_type: "CO",
    subject: "CO",
    unit: "",
    warn: 10.0,
    danger: 30.0,
    weight: 30.0,
};

/// MQ-4 reads methane.
pub const MQ4: Threshold = Threshold {
    alert_type: "CH4",
    subject: "CH4",
    unit: "",
    warn: 200.0,
    danger: 1000.0,
    weight: 25.0,
};

/// Water level as a percentage of the chamber depth.
pub const WATER_LEVEL: Threshold = Threshold {
    alert_type: "Water",
    subject: "Water level",
    unit: "%",
    warn: 40.0,
    danger: 80.0,
    weight: 15.0,
};

// Weights sum to 100 so a reading with every channel at or past its danger
// threshold floors the score at exactly 0.
fn channels(sample: &SensorSample) -> [(f64, &'static Threshold); 4] {
    // ---
    [
        (sample.mq135, &MQ135),
        (sample.mq7, &MQ7),
        (sample.mq4, &MQ4),
        (sample.water_level, &WATER_LEVEL),
    ]
}

impl Threshold {
    // ---
    /// Fraction of this channel's weight to deduct: 0 at or below `warn`,
    /// 1 at or above `danger`, linear in between.
    fn penalty_fraction(&self, value: f64) -> f64 {
        // ---
        if value <= self.warn {
            0.0
        } else {
            ((value - self.warn) / (self.danger - self.warn)).min(1.0)
        }
    }

    /// Alert severity for this channel, if the value crosses a threshold.
    fn classify(&self, value: f64) -> Option<Severity> {
        // ---
        if value >= self.danger {
            Some(Severity::Danger)
        } else if value > self.warn {
            Some(Severity::Warning)
        } else {
            None
        }
    }

    fn message(&self, value: f64, severity: Severity) -> String {
        // ---
        let verb = match severity {
            Severity::Warning => "high",
            Severity::Danger => "critical",
        };
        format!("{} {}: {}{}", self.subject, verb, value, self.unit)
    }
}

// ---

/// Compute the composite health score for a reading.
///
/// Weighted-deduction model: start at 100, subtract each channel's penalty,
/// round, and clamp to [0, 100]. Monotonically non-increasing as any single
/// channel moves further past its warning threshold; immune to extreme
/// input magnitudes in either direction.
pub fn health_score(sample: &SensorSample) -> i64 {
    // ---
    let mut score = 100.0;
    for (value, threshold) in channels(sample) {
        score -= threshold.weight * threshold.penalty_fraction(value);
    }
    score.round().clamp(0.0, 100.0) as i64
}

/// Classify a reading into zero or more alert events.
///
/// One event per channel whose value crosses its warning or danger
/// threshold, plus a composite `Safety` event when the already-computed
/// score itself falls below 70 (warning) or 50 (danger).
pub fn generate_alerts(sample: &SensorSample, score: i64) -> Vec<AlertEvent> {
    // ---
    let mut events = Vec::new();

    for (value, threshold) in channels(sample) {
        if let Some(severity) = threshold.classify(value) {
            events.push(AlertEvent {
                alert_type: threshold.alert_type,
                message: threshold.message(value, severity),
                severity,
            });
        }
    }

    if score < 50 {
        events.push(AlertEvent {
            alert_type: "Safety",
            message: format!("Health score critical: {score}"),
            severity: Severity::Danger,
        });
    } else if score < 70 {
        events.push(AlertEvent {
            alert_type: "Safety",
            message: format!("Health score low: {score}"),
            severity: Severity::Warning,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn safe_sample() -> SensorSample {
        // ---
        SensorSample {
            mq135: 20.0,
            mq7: 2.0,
            mq4: 50.0,
            water_level: 10.0,
        }
    }

    #[test]
    fn test_all_channels_safe_scores_100_with_no_alerts() {
        // ---
        let sample = safe_sample();
        let score = health_score(&sample);

        assert_eq!(score, 100);
        assert!(generate_alerts(&sample, score).is_empty());
    }

    #[test]
    fn test_values_at_warning_threshold_are_still_safe() {
        // ---
        // Exactly at the warning threshold counts as inside the safe band.
        let sample = SensorSample {
            mq135: 100.0,
            mq7: 10.0,
            mq4: 200.0,
            water_level: 40.0,
        };
        let score = health_score(&sample);

        assert_eq!(score, 100);
        assert!(generate_alerts(&sample, score).is_empty());
    }

    #[test]
    fn test_single_channel_between_thresholds_warns() {
        // ---
        // mq135 at 150 is a quarter of the way from warn (100) to danger (300).
        let sample = SensorSample {
            mq135: 150.0,
            ..safe_sample()
        };
        let score = health_score(&sample);

        assert!(score < 100, "score should drop, got {score}");
        assert!(score > 0);

        let events = generate_alerts(&sample, score);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].alert_type, "H2S");
        assert_eq!(events[0].severity, Severity::Warning);
    }

    #[test]
    fn test_channel_at_danger_threshold_raises_danger() {
        // ---
        let sample = SensorSample {
            mq7: 30.0,
            ..safe_sample()
        };
        let score = health_score(&sample);
        let events = generate_alerts(&sample, score);

        let co = events.iter().find(|e| e.alert_type == "CO").unwrap();
        assert_eq!(co.severity, Severity::Danger);
    }

    #[test]
    fn test_danger_takes_precedence_over_warning() {
        // ---
        // Far past the danger threshold still yields exactly one CH4 event.
        let sample = SensorSample {
            mq4: 5000.0,
            ..safe_sample()
        };
        let score = health_score(&sample);
        let events: Vec<_> = generate_alerts(&sample, score)
            .into_iter()
            .filter(|e| e.alert_type == "CH4")
            .collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Danger);
    }

    #[test]
    fn test_score_is_clamped_under_extreme_inputs() {
        // ---
        let extreme = SensorSample {
            mq135: 1.0e9,
            mq7: 1.0e9,
            mq4: 1.0e9,
            water_level: 1.0e9,
        };
        assert_eq!(health_score(&extreme), 0);

        let negative = SensorSample {
            mq135: -1.0e9,
            mq7: -500.0,
            mq4: -3.0,
            water_level: -42.0,
        };
        assert_eq!(health_score(&negative), 100);
    }

    #[test]
    fn test_score_is_monotonic_in_a_single_channel() {
        // ---
        let mut previous = 100;
        for step in 0..12 {
            let sample = SensorSample {
                mq7: step as f64 * 3.0,
                ..safe_sample()
            };
            let score = health_score(&sample);
            assert!(score <= previous, "score rose from {previous} to {score}");
            previous = score;
        }
    }

    #[test]
    fn test_all_channels_at_danger_floor_the_score() {
        // ---
        let sample = SensorSample {
            mq135: 300.0,
            mq7: 30.0,
            mq4: 1000.0,
            water_level: 80.0,
        };
        assert_eq!(health_score(&sample), 0);
    }

    #[test]
    fn test_low_score_adds_safety_alert() {
        // ---
        // Three channels at danger: score 100 - (30 + 30 + 25) = 15.
        let sample = SensorSample {
            mq135: 300.0,
            mq7: 30.0,
            mq4: 1000.0,
            water_level: 10.0,
        };
        let score = health_score(&sample);
        assert_eq!(score, 15);

        let events = generate_alerts(&sample, score);
        let safety = events.iter().find(|e| e.alert_type == "Safety").unwrap();
        assert_eq!(safety.severity, Severity::Danger);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_water_level_alert_message_carries_percent() {
        // ---
        let sample = SensorSample {
            water_level: 85.0,
            ..safe_sample()
        };
        let score = health_score(&sample);
        let events = generate_alerts(&sample, score);

        let water = events.iter().find(|e| e.alert_type == "Water").unwrap();
        assert_eq!(water.severity, Severity::Danger);
        assert_eq!(water.message, "Water level critical: 85%");
    }
}
