//! External collaborators behind traits: intent classification, destination
//! search, calendar sync, and plan sharing. Every concern has an offline
//! implementation so the whole system runs without credentials.

pub mod calendar;
pub mod classify;
pub mod error;
pub mod search;
pub mod share;

pub use calendar::{plan_to_events, sync_plan, CalendarEvent, CalendarProvider, MemoryCalendar};
pub use classify::{Classifier, IntentClassifier, LlmClassifier, RuleClassifier};
pub use error::{ProviderError, Result};
pub use search::{OfflineSearch, Search, SearchProvider, WebSearch};
pub use share::{AuthChallenge, KakaoShare, OfflineShare, Share, ShareProvider};

use std::sync::Arc;

use voyage_observability::AppMetrics;

/// Bundle of concrete providers picked at startup.
pub struct ProviderSet {
    pub classifier: Classifier,
    pub search: Search,
    pub calendar: MemoryCalendar,
    pub share: Share,
}

impl ProviderSet {
    /// All-offline set, used by `--offline` and by integration tests.
    pub fn offline() -> Self {
        Self {
            classifier: Classifier::rules(),
            search: Search::offline(),
            calendar: MemoryCalendar::new(),
            share: Share::offline(),
        }
    }

    /// Each provider independently upgrades to its web backing when its
    /// credentials are present in the environment.
    pub fn from_env(offline: bool, metrics: Arc<AppMetrics>) -> Self {
        if offline {
            return Self::offline();
        }
        Self {
            classifier: Classifier::from_env(),
            search: Search::from_env(metrics),
            calendar: MemoryCalendar::new(),
            share: Share::from_env(),
        }
    }
}
