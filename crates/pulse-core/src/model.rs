use serde::{Deserialize, Serialize};

/// An enrolled survey recipient, identified by phone number.
///
/// Users are soft-disabled via `is_active`; a user with stored responses is
/// never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub phone_number: String,
    pub name: Option<String>,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A user row joined with its response stats, for admin listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub phone_number: String,
    pub name: Option<String>,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub total_responses: i64,
    pub last_response: Option<String>,
}

/// A named survey run with an inclusive [start_date, end_date] window.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A campaign row joined with its response counts, for admin listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CampaignSummary {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub total_responses: i64,
    pub today_responses: i64,
}

/// The three survey dimensions, each an integer in [1, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub joy: i64,
    pub achievement: i64,
    pub meaningfulness: i64,
}

impl Scores {
    /// Whether all three scores are integers in [1, 10].
    pub fn in_range(&self) -> bool {
        [self.joy, self.achievement, self.meaningfulness]
            .iter()
            .all(|s| (1..=10).contains(s))
    }

    /// Arithmetic mean of the three scores.
    pub fn mean(&self) -> f64 {
        (self.joy + self.achievement + self.meaningfulness) as f64 / 3.0
    }
}

/// Rolling sums of each dimension over the trailing 7 days.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct WeeklyTotals {
    pub joy: i64,
    pub achievement: i64,
    pub meaningfulness: i64,
}

/// A stored survey response joined with user and campaign names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResponseDetail {
    pub id: i64,
    pub user_id: i64,
    pub campaign_id: i64,
    pub response_date: String,
    pub joy_score: i64,
    pub achievement_score: i64,
    pub meaningfulness_score: i64,
    pub free_text: Option<String>,
    pub submitted_at: String,
    pub user_name: Option<String>,
    pub phone_number: String,
    pub campaign_name: String,
}

/// Outcome of handling an inbound SMS reply. Always reported with HTTP 200;
/// the variant selects the fixed message template sent back to the user.
#[derive(Debug, Clone)]
pub enum ReplyOutcome {
    /// Sender's phone number is not an enrolled user.
    UnknownSender,
    /// No campaign is currently inside its active window.
    NoActiveCampaign,
    /// The reply did not parse as three in-range scores.
    InvalidFormat,
    /// A response already exists for (user, campaign, today).
    AlreadyResponded,
    /// Response stored; carries the composed feedback message.
    Accepted { feedback: String },
}

impl ReplyOutcome {
    /// Stable outcome tag surfaced in the webhook JSON body.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyOutcome::UnknownSender => "unknown_sender",
            ReplyOutcome::NoActiveCampaign => "no_active_campaign",
            ReplyOutcome::InvalidFormat => "invalid_format",
            ReplyOutcome::AlreadyResponded => "already_responded",
            ReplyOutcome::Accepted { .. } => "success",
        }
    }
}
