//! Parameter binding types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widget parameter variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterType {
    #[default]
    Text,
    Select,
    MultiSelect,
    Date,
    DateRange,
    DateRelative,
    NumberRange,
    CascadingSelect,
}

impl ParameterType {
    /// Suffixes of the companion entries a compound type stores alongside its value
    pub fn companion_suffixes(&self) -> &'static [&'static str] {
        match self {
            ParameterType::DateRange | ParameterType::DateRelative => &["_from", "_to"],
            ParameterType::NumberRange => &["_min", "_max"],
            ParameterType::Text
            | ParameterType::Select
            | ParameterType::MultiSelect
            | ParameterType::Date
            | ParameterType::CascadingSelect => &[],
        }
    }

    /// Companion parameter names derived from `name`
    pub fn companion_names(&self, name: &str) -> Vec<String> {
        self.companion_suffixes()
            .iter()
            .map(|suffix| format!("{}{}", name, suffix))
            .collect()
    }
}

/// Where a binding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterSource {
    #[default]
    ClickAction,
    SelectorWidget,
    Url,
    CrossDashboard,
}

/// One binding in the parameter store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterEntry {
    pub value: Value,
    /// Human-readable origin (widget title)
    pub source: String,
    /// Source field or parameter key
    pub field: String,
    #[serde(rename = "type", default)]
    pub param_type: ParameterType,
    #[serde(default)]
    pub source_type: ParameterSource,
}
