//! Config variable definitions contributed by application modules.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Value of a config variable. Stored as JSON in the config store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool), // Must be before Int
    Int(i64),
    String(String),
}

impl ConfigValue {
    pub fn matches_type(&self, other: &ConfigValue) -> bool {
        matches!(
            (self, other),
            (ConfigValue::Bool(_), ConfigValue::Bool(_))
                | (ConfigValue::Int(_), ConfigValue::Int(_))
                | (ConfigValue::String(_), ConfigValue::String(_))
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::String(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::String(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    Text,
    Textarea,
    /// ISO date (`YYYY-MM-DD`), empty allowed when not required
    Date,
    Choice { choices: Vec<(String, String)> },
}

/// How a config variable is presented and validated in a form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub kind: FieldKind,
    pub required: bool,
    pub label: String,
    pub help_text: Option<String>,
}

impl FormField {
    pub fn new(kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            required: false,
            label: label.into(),
            help_text: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    /// Check a submitted value against this field
    pub fn clean(&self, name: &str, value: &ConfigValue) -> Result<(), Error> {
        match (&self.kind, value) {
            (FieldKind::Boolean, ConfigValue::Bool(_)) => Ok(()),
            (FieldKind::Text | FieldKind::Textarea, ConfigValue::String(s)) => {
                if self.required && s.trim().is_empty() {
                    return Err(Error::Validation(format!("{}: this field is required", name)));
                }
                Ok(())
            }
            (FieldKind::Date, ConfigValue::String(s)) => {
                if s.is_empty() {
                    if self.required {
                        return Err(Error::Validation(format!(
                            "{}: this field is required",
                            name
                        )));
                    }
                    return Ok(());
                }
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(|_| ())
                    .map_err(|_| Error::Validation(format!("{}: enter a valid date", name)))
            }
            (FieldKind::Choice { choices }, ConfigValue::String(s)) => {
                if choices.iter().any(|(k, _)| k == s) {
                    Ok(())
                } else {
                    Err(Error::Validation(format!(
                        "{}: '{}' is not one of the available choices",
                        name, s
                    )))
                }
            }
            (_, v) => Err(Error::Validation(format!(
                "{}: unexpected {} value",
                name,
                v.type_name()
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigVariable {
    pub name: String,
    pub default_value: ConfigValue,
    /// Default value is a user facing text
    pub translatable: bool,
    pub form_field: Option<FormField>,
}

impl ConfigVariable {
    pub fn new(name: impl Into<String>, default_value: impl Into<ConfigValue>) -> Self {
        Self {
            name: name.into(),
            default_value: default_value.into(),
            translatable: false,
            form_field: None,
        }
    }

    pub fn translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }

    pub fn form_field(mut self, field: FormField) -> Self {
        self.form_field = Some(field);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigGroup {
    pub title: String,
    pub variables: Vec<ConfigVariable>,
}

impl ConfigGroup {
    pub fn new(title: impl Into<String>, variables: Vec<ConfigVariable>) -> Self {
        Self {
            title: title.into(),
            variables,
        }
    }
}

/// A config page: groups of variables reachable under `/config/<url>`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigGroupedCollection {
    pub title: String,
    pub url: String,
    pub required_permission: String,
    pub weight: i32,
    pub groups: Vec<ConfigGroup>,
}

impl ConfigGroupedCollection {
    pub fn variables(&self) -> impl Iterator<Item = &ConfigVariable> {
        self.groups.iter().flat_map(|g| g.variables.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_value_json_shape() {
        let v: ConfigValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, ConfigValue::Bool(true));
        let v: ConfigValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, ConfigValue::Int(42));
        let v: ConfigValue = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(v, ConfigValue::String("x".into()));
        assert_eq!(serde_json::to_string(&ConfigValue::Bool(false)).unwrap(), "false");
        assert!(ConfigValue::Bool(true).matches_type(&ConfigValue::Bool(false)));
        assert!(!ConfigValue::Int(1).matches_type(&ConfigValue::String("1".into())));
    }

    #[test]
    fn test_form_field_clean() {
        let text = FormField::new(FieldKind::Text, "Name").required(true);
        assert!(text.clean("name", &"Meeting".into()).is_ok());
        assert!(text.clean("name", &"  ".into()).is_err());
        assert!(text.clean("name", &true.into()).is_err());

        let date = FormField::new(FieldKind::Date, "Date");
        assert!(date.clean("date", &"".into()).is_ok());
        assert!(date.clean("date", &"2026-10-18".into()).is_ok());
        assert!(date.clean("date", &"18.10.2026".into()).is_err());

        let choice = FormField::new(
            FieldKind::Choice {
                choices: vec![("".into(), "---".into()), ("WEP".into(), "WEP".into())],
            },
            "Encryption",
        );
        assert!(choice.clean("enc", &"WEP".into()).is_ok());
        assert!(choice.clean("enc", &"".into()).is_ok());
        assert!(choice.clean("enc", &"WPA3".into()).is_err());
    }
}
