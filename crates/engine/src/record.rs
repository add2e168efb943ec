// ABOUTME: Persisted selector configuration records with audit fields.
// ABOUTME: The stored selector_config payload is validated through the loader before use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigParseError;
use crate::selectors::definition::SelectorConfiguration;
use crate::selectors::loader::from_value;

/// A stored selector configuration, as kept by a CMS or database.
///
/// Only `selector_config` matters to evaluation; the rest is metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfigRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// List of definitions in the declarative input format.
    pub selector_config: Value,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SelectorConfigRecord {
    /// A new record stamped with the current time.
    pub fn new(name: impl Into<String>, selector_config: Value) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: String::new(),
            selector_config,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot of an in-memory configuration.
    pub fn from_configuration(
        config: &SelectorConfiguration,
        created_by: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        let mut record = Self::new(
            config.name.clone().unwrap_or_default(),
            serde_json::to_value(&config.definitions)?,
        );
        record.description = config.description.clone().unwrap_or_default();
        record.created_by = created_by;
        Ok(record)
    }

    /// Validates the payload and returns it as a configuration carrying the
    /// record's name and description.
    pub fn configuration(&self) -> Result<SelectorConfiguration, ConfigParseError> {
        let mut config = from_value(&self.selector_config)?;
        config.name = Some(self.name.clone());
        if !self.description.is_empty() {
            config.description = Some(self.description.clone());
        }
        Ok(config)
    }

    /// Replaces the payload after validating it, bumping `updated_at`.
    pub fn update(&mut self, selector_config: Value) -> Result<(), ConfigParseError> {
        from_value(&selector_config)?;
        self.selector_config = selector_config;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigErrorKind;
    use crate::selectors::definition::SelectorDefinition;
    use serde_json::json;

    #[test]
    fn record_payload_loads_with_record_metadata() {
        let mut record = SelectorConfigRecord::new(
            "Air Science",
            json!([
                {"selector": "#image-wrapper", "name": "Product Images", "preserve_html": true},
                {"selector": ".descriptioncontainer", "name": "Short Description", "note": "shown on the product page"}
            ]),
        );
        record.description = "product pages".into();

        let config = record.configuration().unwrap();
        assert_eq!(config.name.as_deref(), Some("Air Science"));
        assert_eq!(config.description.as_deref(), Some("product pages"));
        assert_eq!(config.len(), 2);
        assert!(config.definitions[0].preserve_html);
    }

    #[test]
    fn invalid_payload_is_reported() {
        let record = SelectorConfigRecord::new("broken", json!([{"name": "no selector"}]));
        let err = record.configuration().unwrap_err();
        assert_eq!(err.path, "[0]");
        assert_eq!(err.kind, ConfigErrorKind::MissingField);
    }

    #[test]
    fn update_validates_before_replacing() {
        let mut record = SelectorConfigRecord::new("r", json!([{"selector": "h1", "name": "t"}]));
        let before = record.updated_at;

        assert!(record.update(json!({"not": "a list"})).is_err());
        assert_eq!(record.updated_at, before);

        record
            .update(json!([{"selector": "h2", "name": "t"}]))
            .unwrap();
        assert!(record.updated_at >= before);
        assert_eq!(record.configuration().unwrap().definitions[0].selector, "h2");
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let config = SelectorConfiguration::new(vec![
            SelectorDefinition::new(".item", "items").child(SelectorDefinition::new("a", "link").attr("href")),
        ])
        .named("Catalogue");
        let record = SelectorConfigRecord::from_configuration(&config, Some("admin".into())).unwrap();

        let stored = serde_json::to_string(&record).unwrap();
        let restored: SelectorConfigRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, record);
        assert_eq!(restored.configuration().unwrap(), config);
    }
}
