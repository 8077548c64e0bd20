//! Alert message rendering

use contracts::{AlertConfig, AlertLevel};

/// Renders the human-readable alert text
#[derive(Debug, Clone)]
pub struct AlertFormatter {
    template: String,
    danger_phrase: String,
    warning_phrase: String,
}

impl AlertFormatter {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            template: config.template.clone(),
            danger_phrase: config.danger_phrase.clone(),
            warning_phrase: config.warning_phrase.clone(),
        }
    }

    /// Render the message for one alert
    pub fn format(&self, level: AlertLevel, distance_cm: f64) -> String {
        let severity = match level {
            AlertLevel::Danger => &self.danger_phrase,
            AlertLevel::Warning => &self.warning_phrase,
        };
        self.template
            .replace("{severity}", severity)
            .replace("{level}", level.as_str())
            .replace("{distance}", &distance_cm.to_string())
    }
}

impl Default for AlertFormatter {
    fn default() -> Self {
        Self::new(&AlertConfig::default())
    }
}
