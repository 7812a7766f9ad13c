//! Map a clicked data point and a widget's click action to an effect

use super::models::Widget;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cell-click points carry the clicked column and value under these keys
pub const CLICKED_COLUMN_KEY: &str = "_clickedColumn";
pub const CLICKED_VALUE_KEY: &str = "_clickedValue";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterMapping {
    pub parameter_name: String,
    #[serde(default)]
    pub source_field: String,
}

/// Widget-declared click behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClickAction {
    SetParameter {
        #[serde(rename = "parameterMapping", default, skip_serializing_if = "Option::is_none")]
        parameter_mapping: Option<ParameterMapping>,
    },
    NavigateToPage {
        #[serde(rename = "targetPageId", default, skip_serializing_if = "Option::is_none")]
        target_page_id: Option<String>,
    },
    SetParameterAndNavigate {
        #[serde(rename = "parameterMapping", default, skip_serializing_if = "Option::is_none")]
        parameter_mapping: Option<ParameterMapping>,
        #[serde(rename = "targetPageId", default, skip_serializing_if = "Option::is_none")]
        target_page_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetParameterEffect {
    pub parameter_name: String,
    pub value: Value,
    pub label: String,
    pub source_field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_parameter: Option<SetParameterEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate_to_page_id: Option<String>,
}

fn resolve_set_parameter(
    mapping: Option<&ParameterMapping>,
    point: &Map<String, Value>,
    label: &str,
) -> Option<SetParameterEffect> {
    let mapping = mapping?;

    let (value, source_field) = match point.get(CLICKED_COLUMN_KEY) {
        Some(column) => {
            let column = match column {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (point.get(CLICKED_VALUE_KEY), column)
        }
        None => (point.get(&mapping.source_field), mapping.source_field.clone()),
    };

    // Only an absent key is missing; 0, false, "" and null are real values
    let value = value?.clone();

    Some(SetParameterEffect {
        parameter_name: mapping.parameter_name.clone(),
        value,
        label: label.to_string(),
        source_field,
    })
}

fn resolve_navigation(target_page_id: Option<&String>) -> Option<String> {
    target_page_id.filter(|id| !id.is_empty()).cloned()
}

impl ClickAction {
    /// Effect of clicking `point`, or `None` when the action cannot apply.
    ///
    /// `set-parameter-and-navigate` yields both halves or nothing.
    pub fn resolve(&self, point: &Map<String, Value>, label: &str) -> Option<ClickEffect> {
        let effect = match self {
            ClickAction::SetParameter { parameter_mapping } => ClickEffect {
                set_parameter: Some(resolve_set_parameter(
                    parameter_mapping.as_ref(),
                    point,
                    label,
                )?),
                navigate_to_page_id: None,
            },
            ClickAction::NavigateToPage { target_page_id } => ClickEffect {
                set_parameter: None,
                navigate_to_page_id: Some(resolve_navigation(target_page_id.as_ref())?),
            },
            ClickAction::SetParameterAndNavigate {
                parameter_mapping,
                target_page_id,
            } => ClickEffect {
                set_parameter: Some(resolve_set_parameter(
                    parameter_mapping.as_ref(),
                    point,
                    label,
                )?),
                navigate_to_page_id: Some(resolve_navigation(target_page_id.as_ref())?),
            },
        };

        if effect.set_parameter.is_none() && effect.navigate_to_page_id.is_none() {
            None
        } else {
            Some(effect)
        }
    }

    /// Parameter name this action writes, if any
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            ClickAction::SetParameter { parameter_mapping }
            | ClickAction::SetParameterAndNavigate {
                parameter_mapping, ..
            } => parameter_mapping.as_ref().map(|m| m.parameter_name.as_str()),
            ClickAction::NavigateToPage { .. } => None,
        }
    }
}

/// Resolve a click on one of `widget`'s data points
pub fn resolve_click(widget: &Widget, point: &Map<String, Value>) -> Option<ClickEffect> {
    let action = widget.settings.click_action.as_ref()?;
    let effect = action.resolve(point, widget.label());
    tracing::debug!(
        widget_id = %widget.id,
        resolved = effect.is_some(),
        "Click action resolved"
    );
    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn widget(click_action: Value) -> Widget {
        serde_json::from_value(json!({
            "id": "w1",
            "chartType": "bar",
            "title": "Sales by region",
            "settings": {"clickAction": click_action}
        }))
        .unwrap()
    }

    #[test]
    fn test_no_click_action() {
        let w: Widget = serde_json::from_value(json!({"id": "w", "chartType": "bar"})).unwrap();
        assert_eq!(resolve_click(&w, &point(json!({"a": 1}))), None);
    }

    #[test]
    fn test_set_parameter_honors_falsy_values() {
        let w = widget(json!({
            "type": "set-parameter",
            "parameterMapping": {"parameterName": "v", "sourceField": "val"}
        }));

        for value in [json!(0), json!(false), json!(""), Value::Null] {
            let effect = resolve_click(&w, &point(json!({"val": value.clone()}))).unwrap();
            let set = effect.set_parameter.unwrap();
            assert_eq!(set.value, value);
            assert_eq!(set.label, "Sales by region");
            assert_eq!(set.source_field, "val");
            assert_eq!(effect.navigate_to_page_id, None);
        }
    }

    #[test]
    fn test_set_parameter_missing_field() {
        let w = widget(json!({
            "type": "set-parameter",
            "parameterMapping": {"parameterName": "v", "sourceField": "val"}
        }));
        assert_eq!(resolve_click(&w, &point(json!({"other": 1}))), None);
    }

    #[test]
    fn test_set_parameter_without_mapping() {
        let w = widget(json!({"type": "set-parameter"}));
        assert_eq!(resolve_click(&w, &point(json!({"val": 1}))), None);
    }

    #[test]
    fn test_cell_click_overrides_source_field() {
        let w = widget(json!({
            "type": "set-parameter",
            "parameterMapping": {"parameterName": "person", "sourceField": ""}
        }));
        let effect = resolve_click(
            &w,
            &point(json!({"_clickedColumn": "name", "_clickedValue": "Alice"})),
        )
        .unwrap();
        let set = effect.set_parameter.unwrap();
        assert_eq!(set.source_field, "name");
        assert_eq!(set.value, json!("Alice"));
        assert_eq!(set.parameter_name, "person");
    }

    #[test]
    fn test_navigate() {
        let w = widget(json!({"type": "navigate-to-page", "targetPageId": "page-2"}));
        let effect = resolve_click(&w, &point(json!({}))).unwrap();
        assert_eq!(effect.navigate_to_page_id.as_deref(), Some("page-2"));
        assert!(effect.set_parameter.is_none());

        let w = widget(json!({"type": "navigate-to-page"}));
        assert_eq!(resolve_click(&w, &point(json!({}))), None);
        let w = widget(json!({"type": "navigate-to-page", "targetPageId": ""}));
        assert_eq!(resolve_click(&w, &point(json!({}))), None);
    }

    #[test]
    fn test_set_and_navigate_is_all_or_nothing() {
        let full = json!({
            "type": "set-parameter-and-navigate",
            "parameterMapping": {"parameterName": "region", "sourceField": "region"},
            "targetPageId": "details"
        });
        let effect = resolve_click(&widget(full), &point(json!({"region": "EU"}))).unwrap();
        assert_eq!(effect.set_parameter.unwrap().value, json!("EU"));
        assert_eq!(effect.navigate_to_page_id.as_deref(), Some("details"));

        let no_target = json!({
            "type": "set-parameter-and-navigate",
            "parameterMapping": {"parameterName": "region", "sourceField": "region"}
        });
        assert_eq!(
            resolve_click(&widget(no_target), &point(json!({"region": "EU"}))),
            None
        );

        let no_value = json!({
            "type": "set-parameter-and-navigate",
            "parameterMapping": {"parameterName": "region", "sourceField": "region"},
            "targetPageId": "details"
        });
        assert_eq!(resolve_click(&widget(no_value), &point(json!({}))), None);
    }

    #[test]
    fn test_label_falls_back_to_chart_type() {
        let w: Widget = serde_json::from_value(json!({
            "id": "w",
            "chartType": "table",
            "settings": {"clickAction": {
                "type": "set-parameter",
                "parameterMapping": {"parameterName": "p", "sourceField": "x"}
            }}
        }))
        .unwrap();
        let effect = resolve_click(&w, &point(json!({"x": 1}))).unwrap();
        assert_eq!(effect.set_parameter.unwrap().label, "table");
    }

    #[test]
    fn test_effect_serialization_omits_absent_fields() {
        let effect = ClickEffect {
            set_parameter: None,
            navigate_to_page_id: Some("p".into()),
        };
        assert_eq!(
            serde_json::to_value(&effect).unwrap(),
            json!({"navigateToPageId": "p"})
        );
    }
}
