//! Single-writer owner of the parameter store

use super::debounce::Debouncer;
use super::models::{ParameterEntry, ParameterSource, ParameterType};
use super::presets::{
    relative_date_companions, resolve_relative_date, resolve_relative_date_now, DateRange,
};
use super::store::{ParameterStore, SnapshotError};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Shared handle to a parameter store; all mutations go through its write lock
#[derive(Clone)]
pub struct ParameterController {
    store: Arc<RwLock<ParameterStore>>,
}

impl ParameterController {
    pub fn new(store: ParameterStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub async fn set(
        &self,
        name: &str,
        value: Value,
        source: &str,
        field: &str,
        param_type: ParameterType,
        source_type: ParameterSource,
    ) {
        self.store
            .write()
            .await
            .set_parameter_with(name, value, source, field, param_type, source_type);
    }

    /// Set a `date-relative` parameter and its `_from`/`_to` companions in one write
    pub async fn set_relative_date(
        &self,
        name: &str,
        preset: &str,
        source: &str,
        source_type: ParameterSource,
        today: NaiveDate,
    ) {
        let range = resolve_relative_date(preset, today);
        self.apply_relative_date(name, preset, &range, source, source_type)
            .await;
    }

    /// Same as [`set_relative_date`](Self::set_relative_date), dated on the local calendar
    pub async fn set_relative_date_now(
        &self,
        name: &str,
        preset: &str,
        source: &str,
        source_type: ParameterSource,
    ) {
        let range = resolve_relative_date_now(preset);
        self.apply_relative_date(name, preset, &range, source, source_type)
            .await;
    }

    async fn apply_relative_date(
        &self,
        name: &str,
        preset: &str,
        range: &DateRange,
        source: &str,
        source_type: ParameterSource,
    ) {
        let mut store = self.store.write().await;
        store.set_parameter_with(
            name,
            Value::from(preset),
            source,
            name,
            ParameterType::DateRelative,
            source_type,
        );
        for (companion, value) in relative_date_companions(name, range) {
            store.set_parameter_with(
                &companion,
                value,
                source,
                name,
                ParameterType::DateRelative,
                source_type,
            );
        }
    }

    /// Remove one entry; companions are left for the caller to clear
    pub async fn clear(&self, name: &str) {
        self.store.write().await.clear_parameter(name);
    }

    /// Remove `name` and every companion its type derives
    pub async fn clear_with_companions(&self, name: &str, param_type: ParameterType) {
        let mut store = self.store.write().await;
        store.clear_parameter(name);
        for companion in param_type.companion_names(name) {
            store.clear_parameter(&companion);
        }
    }

    pub async fn clear_all(&self) {
        self.store.write().await.clear_all();
    }

    pub async fn save(&self, dashboard_id: &str) -> Result<(), SnapshotError> {
        self.store.read().await.save_to_dashboard(dashboard_id).await
    }

    pub async fn restore(&self, dashboard_id: &str) {
        self.store
            .write()
            .await
            .restore_from_dashboard(dashboard_id)
            .await;
    }

    pub async fn values(&self) -> Map<String, Value> {
        self.store.read().await.values()
    }

    pub async fn entries(&self) -> HashMap<String, ParameterEntry> {
        self.store.read().await.entries().clone()
    }

    /// Debounced writer for a selector input bound to `name`.
    ///
    /// Use `SEED_QUERY_DEBOUNCE` for seed-query text and
    /// `FREEFORM_INPUT_DEBOUNCE` for search boxes.
    pub fn debounced_input(
        &self,
        name: &str,
        param_type: ParameterType,
        delay: Duration,
    ) -> DebouncedInput {
        let controller = self.clone();
        let name = name.to_string();
        let debouncer = Debouncer::new(delay, move |value: Value| {
            let controller = controller.clone();
            let name = name.clone();
            async move {
                tracing::debug!(parameter = %name, "Committing debounced input");
                controller
                    .set(
                        &name,
                        value,
                        "input",
                        &name,
                        param_type,
                        ParameterSource::SelectorWidget,
                    )
                    .await;
            }
        });
        DebouncedInput { debouncer }
    }
}

/// Input handle returned by [`ParameterController::debounced_input`]
pub struct DebouncedInput {
    debouncer: Debouncer<Value>,
}

impl DebouncedInput {
    pub fn push(&self, value: Value) {
        self.debouncer.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::store::MemorySnapshots;
    use serde_json::json;

    fn controller() -> ParameterController {
        ParameterController::new(ParameterStore::new(Arc::new(MemorySnapshots::new())))
    }

    #[tokio::test]
    async fn test_relative_date_sets_companions() {
        let ctl = controller();
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        ctl.set_relative_date("when", "last_7_days", "Dates", ParameterSource::Url, today)
            .await;

        let values = ctl.values().await;
        assert_eq!(values["when"], json!("last_7_days"));
        assert_eq!(values["when_from"], json!("2025-06-09"));
        assert_eq!(values["when_to"], json!("2025-06-15"));
    }

    #[tokio::test]
    async fn test_relative_date_now_matches_local_resolution() {
        let ctl = controller();
        ctl.set_relative_date_now("when", "this_month", "Dates", ParameterSource::SelectorWidget)
            .await;

        let expected = resolve_relative_date_now("this_month");
        let values = ctl.values().await;
        assert_eq!(values["when"], json!("this_month"));
        assert_eq!(values["when_from"], json!(expected.from));
        assert_eq!(values["when_to"], json!(expected.to));
        assert!(expected.from.ends_with("-01"));
    }

    #[tokio::test]
    async fn test_clear_variants() {
        let ctl = controller();
        for name in ["price", "price_min", "price_max", "other"] {
            ctl.set(
                name,
                json!(1),
                "Slider",
                "price",
                ParameterType::NumberRange,
                ParameterSource::SelectorWidget,
            )
            .await;
        }

        ctl.clear("price").await;
        assert!(ctl.values().await.contains_key("price_min"));

        ctl.clear_with_companions("price", ParameterType::NumberRange)
            .await;
        let values = ctl.values().await;
        assert_eq!(values.len(), 1);
        assert!(values.contains_key("other"));
    }

    #[tokio::test]
    async fn test_concurrent_writers_all_apply() {
        let ctl = controller();
        let mut handles = Vec::new();
        for i in 0..20 {
            let ctl = ctl.clone();
            handles.push(tokio::spawn(async move {
                ctl.set(
                    &format!("p{}", i),
                    json!(i),
                    "W",
                    "f",
                    ParameterType::Text,
                    ParameterSource::ClickAction,
                )
                .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(ctl.values().await.len(), 20);
    }

    #[tokio::test]
    async fn test_save_restore_through_controller() {
        let ctl = controller();
        ctl.set(
            "x",
            json!("a"),
            "W",
            "x",
            ParameterType::Select,
            ParameterSource::CrossDashboard,
        )
        .await;
        ctl.save("d1").await.unwrap();
        ctl.clear_all().await;

        ctl.restore("d1").await;
        let entries = ctl.entries().await;
        assert_eq!(entries["x"].source_type, ParameterSource::CrossDashboard);
    }

    #[tokio::test]
    async fn test_debounced_input_commits_last_value() {
        let ctl = controller();
        let input = ctl.debounced_input("search", ParameterType::Text, Duration::from_millis(50));

        input.push(json!("a"));
        input.push(json!("al"));
        input.push(json!("ali"));
        assert!(ctl.values().await.is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let entries = ctl.entries().await;
        assert_eq!(entries["search"].value, json!("ali"));
        assert_eq!(entries["search"].source_type, ParameterSource::SelectorWidget);
    }
}
