//! Enumerate every parameter name a dashboard layout refers to

use super::models::Dashboard;
use crate::params::resolver::referenced_param_names;
use std::collections::BTreeSet;

/// Union of click-action mapping names, `$param_` placeholders in widget
/// queries and `parameter-select` widget names; sorted and de-duplicated
pub fn collect_parameter_names(dashboard: &Dashboard) -> Vec<String> {
    let mut names = BTreeSet::new();

    for widget in dashboard.pages.iter().flat_map(|page| &page.widgets) {
        if let Some(name) = widget
            .settings
            .click_action
            .as_ref()
            .and_then(|action| action.parameter_name())
        {
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }

        names.extend(referenced_param_names(&widget.query));

        if widget.is_parameter_select() {
            if let Some(name) = widget
                .settings
                .chart_options
                .as_ref()
                .and_then(|opts| opts.parameter_name.as_deref())
                .filter(|name| !name.is_empty())
            {
                names.insert(name.to_string());
            }
        }
    }

    names.into_iter().collect()
}
