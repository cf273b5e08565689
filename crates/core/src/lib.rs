pub mod catalog;
pub mod format;
pub mod intent;
pub mod models;
pub mod normalize;
pub mod options;
pub mod planner;

pub use format::{export_ics, format_as_text, plan_statistics, plan_summary, share_link, PlanTemplate};
pub use intent::{classify_rules, is_iso_date_input, normalize_text};
pub use models::*;
pub use normalize::{normalize, ControlToken, NormalizeOutcome};
pub use planner::{modify, optimize, synthesize, Modification};
