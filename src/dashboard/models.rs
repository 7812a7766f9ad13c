//! Dashboard layout JSON as consumed by the engine

use super::click::ClickAction;
use crate::params::models::ParameterType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chart type of selector widgets that bind a parameter
pub const PARAMETER_SELECT_CHART: &str = "parameter-select";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    pub chart_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub settings: WidgetSettings,
}

impl Widget {
    /// Label for values this widget produces: its title, else its chart type
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.chart_type)
    }

    pub fn is_parameter_select(&self) -> bool {
        self.chart_type == PARAMETER_SELECT_CHART
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_action: Option<ClickAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_options: Option<ChartOptions>,
}

/// Options of a `parameter-select` widget; rendering options of other
/// chart types are kept untouched in `extra`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<ParameterType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_parameter_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
