//! Campaign CRUD, active-window queries, and per-campaign statistics.

use super::{map_write_err, Store};
use pulse_core::error::PulseError;
use pulse_core::model::{Campaign, CampaignSummary};

const CAMPAIGN_COLUMNS: &str =
    "id, name, start_date, end_date, is_active, created_at, updated_at";

/// Aggregate statistics for one campaign.
#[derive(Debug, Clone, Default, serde::Serialize, sqlx::FromRow)]
pub struct CampaignStats {
    pub unique_respondents: i64,
    pub total_responses: i64,
    pub avg_joy: Option<f64>,
    pub avg_achievement: Option<f64>,
    pub avg_meaningfulness: Option<f64>,
    pub first_response: Option<String>,
    pub last_response: Option<String>,
}

/// Per-day response counts and averages.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct DailyStats {
    pub response_date: String,
    pub response_count: i64,
    pub avg_joy: Option<f64>,
    pub avg_achievement: Option<f64>,
    pub avg_meaningfulness: Option<f64>,
}

impl Store {
    /// Create a campaign. Window validity (end after start) is the caller's
    /// responsibility; the store only persists.
    pub async fn create_campaign(
        &self,
        name: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Campaign, PulseError> {
        let result =
            sqlx::query("INSERT INTO campaigns (name, start_date, end_date) VALUES (?, ?, ?)")
                .bind(name)
                .bind(start_date)
                .bind(end_date)
                .execute(&self.pool)
                .await
                .map_err(|e| map_write_err(e, "create campaign"))?;

        let id = result.last_insert_rowid();
        self.get_campaign(id).await?.ok_or_else(|| {
            PulseError::Store(format!("created campaign {id} not found on readback"))
        })
    }

    pub async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>, PulseError> {
        sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("get campaign failed: {e}")))
    }

    /// All campaigns, newest first, joined with response counts.
    pub async fn list_campaigns(&self) -> Result<Vec<CampaignSummary>, PulseError> {
        sqlx::query_as::<_, CampaignSummary>(
            "SELECT c.id, c.name, c.start_date, c.end_date, c.is_active,
                    c.created_at, c.updated_at,
                    COUNT(sr.id) AS total_responses,
                    COUNT(CASE WHEN sr.response_date = date('now') THEN 1 END) AS today_responses
             FROM campaigns c
             LEFT JOIN survey_responses sr ON sr.campaign_id = c.id
             GROUP BY c.id
             ORDER BY c.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("list campaigns failed: {e}")))
    }

    /// Campaigns whose active flag is set and whose inclusive window covers
    /// the given `YYYY-MM-DD` date.
    pub async fn campaigns_active_on(&self, date: &str) -> Result<Vec<Campaign>, PulseError> {
        sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
             WHERE is_active = 1 AND ? BETWEEN start_date AND end_date
             ORDER BY start_date ASC"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("active campaigns failed: {e}")))
    }

    /// Campaigns currently inside their window (today, store clock).
    pub async fn active_campaigns(&self) -> Result<Vec<Campaign>, PulseError> {
        sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
             WHERE is_active = 1 AND date('now') BETWEEN start_date AND end_date
             ORDER BY start_date ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("active campaigns failed: {e}")))
    }

    /// The most recently started currently-active campaign. Inbound SMS
    /// replies are attributed to this one.
    pub async fn latest_active_campaign(&self) -> Result<Option<Campaign>, PulseError> {
        sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
             WHERE is_active = 1 AND date('now') BETWEEN start_date AND end_date
             ORDER BY start_date DESC
             LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("latest active campaign failed: {e}")))
    }

    /// Update fields of a campaign. Only non-`None` fields are touched.
    pub async fn update_campaign(
        &self,
        id: i64,
        name: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<Campaign>, PulseError> {
        let mut sets = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(n) = name {
            sets.push("name = ?");
            values.push(n.to_string());
        }
        if let Some(s) = start_date {
            sets.push("start_date = ?");
            values.push(s.to_string());
        }
        if let Some(e) = end_date {
            sets.push("end_date = ?");
            values.push(e.to_string());
        }
        if let Some(active) = is_active {
            sets.push("is_active = ?");
            values.push(if active { "1".into() } else { "0".into() });
        }

        if sets.is_empty() {
            return self.get_campaign(id).await;
        }
        sets.push("updated_at = CURRENT_TIMESTAMP");

        let sql = format!("UPDATE campaigns SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        for v in &values {
            query = query.bind(v);
        }
        query = query.bind(id);

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_err(e, "update campaign"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_campaign(id).await
    }

    /// Number of stored responses for a campaign. Non-zero blocks deletion.
    pub async fn campaign_response_count(&self, id: i64) -> Result<i64, PulseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM survey_responses WHERE campaign_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PulseError::Store(format!("campaign response count failed: {e}")))?;
        Ok(count)
    }

    /// Hard-delete a campaign. Callers must first check
    /// `campaign_response_count`. Returns `false` when no such campaign exists.
    pub async fn delete_campaign(&self, id: i64) -> Result<bool, PulseError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("delete campaign failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn campaign_stats(&self, id: i64) -> Result<CampaignStats, PulseError> {
        sqlx::query_as::<_, CampaignStats>(
            "SELECT COUNT(DISTINCT user_id) AS unique_respondents,
                    COUNT(id) AS total_responses,
                    AVG(joy_score) AS avg_joy,
                    AVG(achievement_score) AS avg_achievement,
                    AVG(meaningfulness_score) AS avg_meaningfulness,
                    MIN(response_date) AS first_response,
                    MAX(response_date) AS last_response
             FROM survey_responses
             WHERE campaign_id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("campaign stats failed: {e}")))
    }

    pub async fn campaign_daily_stats(&self, id: i64) -> Result<Vec<DailyStats>, PulseError> {
        sqlx::query_as::<_, DailyStats>(
            "SELECT response_date,
                    COUNT(*) AS response_count,
                    AVG(joy_score) AS avg_joy,
                    AVG(achievement_score) AS avg_achievement,
                    AVG(meaningfulness_score) AS avg_meaningfulness
             FROM survey_responses
             WHERE campaign_id = ?
             GROUP BY response_date
             ORDER BY response_date DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("campaign daily stats failed: {e}")))
    }
}
