//! # pulse-store
//!
//! SQLite-backed persistence for the Pulse survey service.

mod store;

pub use store::{
    AnalyticsSummary, CampaignStats, DailyStats, SmsStat, Store, UserWeeklySummary,
};
