//! Dashboard layout model, click-action resolution and parameter name scanning

pub mod click;
pub mod collector;
pub mod models;

pub use click::{resolve_click, ClickAction, ClickEffect, ParameterMapping, SetParameterEffect};
pub use collector::collect_parameter_names;
pub use models::{ChartOptions, Dashboard, Page, Widget, WidgetSettings};
