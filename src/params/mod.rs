//! Parameter bindings: store, resolver, relative date presets and the
//! controller that owns them

pub mod controller;
pub mod debounce;
pub mod models;
pub mod presets;
pub mod resolver;
pub mod store;

pub use controller::{DebouncedInput, ParameterController};
pub use debounce::{Debouncer, FREEFORM_INPUT_DEBOUNCE, SEED_QUERY_DEBOUNCE};
pub use models::{ParameterEntry, ParameterSource, ParameterType};
pub use presets::{resolve_relative_date, resolve_relative_date_now, DateRange, RelativeDatePreset};
pub use resolver::{
    all_referenced_params_ready, extract_referenced_params, get_missing_param_names,
    referenced_param_names,
};
pub use store::{FileSnapshots, MemorySnapshots, ParameterStore, SnapshotBackend, SnapshotError};
