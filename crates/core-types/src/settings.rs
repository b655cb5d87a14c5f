//! Reseller store settings and the rules for updating them.
//!
//! Settings are a flat JSON object so resellers can carry arbitrary
//! business, order, payment and notification options. Only the markup keys
//! have rules attached.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const MINIMUM_MARKUP: &str = "minimumMarkup";
pub const MAXIMUM_MARKUP: &str = "maximumMarkup";
pub const DEFAULT_MARKUP: &str = "defaultMarkup";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("{}", bounds_message(.minimum.as_deref(), .maximum.as_deref()))]
    MarkupOutOfBounds {
        minimum: Option<String>,
        maximum: Option<String>,
    },

    #[error("Default markup must be a number")]
    MarkupNotANumber,
}

fn bounds_message(minimum: Option<&str>, maximum: Option<&str>) -> String {
    match (minimum, maximum) {
        (Some(min), Some(max)) => format!("Default markup must be between {min}% and {max}%"),
        (Some(min), None) => format!("Default markup must be at least {min}%"),
        (None, Some(max)) => format!("Default markup must be at most {max}%"),
        (None, None) => "Default markup is out of bounds".to_string(),
    }
}

/// The persisted settings map of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreSettings(Map<String, Value>);

impl StoreSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn minimum_markup(&self) -> Option<f64> {
        self.0.get(MINIMUM_MARKUP).and_then(Value::as_f64)
    }

    pub fn maximum_markup(&self) -> Option<f64> {
        self.0.get(MAXIMUM_MARKUP).and_then(Value::as_f64)
    }

    pub fn default_markup(&self) -> Option<f64> {
        self.0.get(DEFAULT_MARKUP).and_then(Value::as_f64)
    }

    /// Applies a partial update on top of these settings.
    ///
    /// A `defaultMarkup` in the patch is checked against the bounds already
    /// stored here, not against bounds sent in the same patch. Keys in the
    /// patch overwrite existing keys; everything else is kept.
    pub fn merge(&self, patch: &Map<String, Value>) -> Result<StoreSettings, SettingsError> {
        if let Some(markup) = patch.get(DEFAULT_MARKUP) {
            self.check_default_markup(markup)?;
        }

        let mut merged = self.0.clone();
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        Ok(StoreSettings(merged))
    }

    fn check_default_markup(&self, markup: &Value) -> Result<(), SettingsError> {
        let markup = markup.as_f64().ok_or(SettingsError::MarkupNotANumber)?;

        let below = self.minimum_markup().is_some_and(|min| markup < min);
        let above = self.maximum_markup().is_some_and(|max| markup > max);
        if below || above {
            return Err(SettingsError::MarkupOutOfBounds {
                minimum: self.bound_label(MINIMUM_MARKUP),
                maximum: self.bound_label(MAXIMUM_MARKUP),
            });
        }
        Ok(())
    }

    fn bound_label(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}
