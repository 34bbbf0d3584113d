//! Survey response storage, rolling totals, and analytics queries.

use super::{map_write_err, Store};
use pulse_core::error::PulseError;
use pulse_core::model::{ResponseDetail, Scores, WeeklyTotals};

use super::campaigns::DailyStats;

const DETAIL_SELECT: &str = "SELECT sr.id, sr.user_id, sr.campaign_id, sr.response_date,
        sr.joy_score, sr.achievement_score, sr.meaningfulness_score,
        sr.free_text, sr.submitted_at,
        u.name AS user_name, u.phone_number, c.name AS campaign_name
 FROM survey_responses sr
 JOIN users u ON sr.user_id = u.id
 JOIN campaigns c ON sr.campaign_id = c.id";

/// Window summary for the analytics endpoint.
#[derive(Debug, Clone, Default, serde::Serialize, sqlx::FromRow)]
pub struct AnalyticsSummary {
    pub total_responses: i64,
    pub avg_joy: Option<f64>,
    pub avg_achievement: Option<f64>,
    pub avg_meaningfulness: Option<f64>,
    pub first_response: Option<String>,
    pub last_response: Option<String>,
}

/// Trailing-7-day totals for one user across campaigns, with day count and
/// per-dimension averages. Used by the user dashboard.
#[derive(Debug, Clone, Default, serde::Serialize, sqlx::FromRow)]
pub struct UserWeeklySummary {
    pub joy: i64,
    pub achievement: i64,
    pub meaningfulness: i64,
    pub total_days: i64,
    pub avg_joy: Option<f64>,
    pub avg_achievement: Option<f64>,
    pub avg_meaningfulness: Option<f64>,
}

impl Store {
    /// Whether a response exists for (user, campaign, today).
    pub async fn response_exists_today(
        &self,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<bool, PulseError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM survey_responses
             WHERE user_id = ? AND campaign_id = ? AND response_date = date('now')",
        )
        .bind(user_id)
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("response existence check failed: {e}")))?;
        Ok(row.is_some())
    }

    /// Insert today's response. The UNIQUE(user_id, campaign_id,
    /// response_date) constraint turns a lost race into a `Conflict`.
    pub async fn insert_response(
        &self,
        user_id: i64,
        campaign_id: i64,
        scores: Scores,
        free_text: Option<&str>,
    ) -> Result<i64, PulseError> {
        let result = sqlx::query(
            "INSERT INTO survey_responses
             (user_id, campaign_id, response_date, joy_score, achievement_score, meaningfulness_score, free_text)
             VALUES (?, ?, date('now'), ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(campaign_id)
        .bind(scores.joy)
        .bind(scores.achievement)
        .bind(scores.meaningfulness)
        .bind(free_text)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_err(e, "insert response"))?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_response(&self, id: i64) -> Result<Option<ResponseDetail>, PulseError> {
        sqlx::query_as::<_, ResponseDetail>(&format!("{DETAIL_SELECT} WHERE sr.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("get response failed: {e}")))
    }

    /// Rolling 7-day sums per dimension for one user+campaign, inclusive of
    /// today. Recomputed on every call rather than maintained incrementally.
    pub async fn weekly_totals(
        &self,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<WeeklyTotals, PulseError> {
        let (joy, achievement, meaningfulness): (Option<i64>, Option<i64>, Option<i64>) =
            sqlx::query_as(
                "SELECT SUM(joy_score), SUM(achievement_score), SUM(meaningfulness_score)
                 FROM survey_responses
                 WHERE user_id = ? AND campaign_id = ?
                 AND response_date >= date('now', '-7 days')",
            )
            .bind(user_id)
            .bind(campaign_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("weekly totals failed: {e}")))?;

        Ok(WeeklyTotals {
            joy: joy.unwrap_or(0),
            achievement: achievement.unwrap_or(0),
            meaningfulness: meaningfulness.unwrap_or(0),
        })
    }

    /// Filtered, paginated response listing plus the unpaginated total.
    pub async fn list_responses(
        &self,
        user_id: Option<i64>,
        campaign_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ResponseDetail>, i64), PulseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<i64> = Vec::new();

        if let Some(uid) = user_id {
            conditions.push("sr.user_id = ?");
            params.push(uid);
        }
        if let Some(cid) = campaign_id {
            conditions.push("sr.campaign_id = ?");
            params.push(cid);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "{DETAIL_SELECT}{where_clause} ORDER BY sr.submitted_at DESC LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query_as::<_, ResponseDetail>(&sql);
        for p in &params {
            query = query.bind(p);
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("list responses failed: {e}")))?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM survey_responses sr{where_clause}"
        );
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        for p in &params {
            count_query = count_query.bind(p);
        }
        let (total,) = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("count responses failed: {e}")))?;

        Ok((rows, total))
    }

    /// Aggregate summary over a trailing `days` window, optionally scoped to
    /// one campaign.
    pub async fn analytics_summary(
        &self,
        campaign_id: Option<i64>,
        days: i64,
    ) -> Result<AnalyticsSummary, PulseError> {
        let modifier = format!("-{days} days");
        let mut sql = String::from(
            "SELECT COUNT(*) AS total_responses,
                    AVG(joy_score) AS avg_joy,
                    AVG(achievement_score) AS avg_achievement,
                    AVG(meaningfulness_score) AS avg_meaningfulness,
                    MIN(response_date) AS first_response,
                    MAX(response_date) AS last_response
             FROM survey_responses
             WHERE response_date >= date('now', ?)",
        );
        if campaign_id.is_some() {
            sql.push_str(" AND campaign_id = ?");
        }

        let mut query = sqlx::query_as::<_, AnalyticsSummary>(&sql).bind(&modifier);
        if let Some(cid) = campaign_id {
            query = query.bind(cid);
        }
        query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("analytics summary failed: {e}")))
    }

    /// Per-day breakdown over a trailing `days` window.
    pub async fn analytics_daily(
        &self,
        campaign_id: Option<i64>,
        days: i64,
    ) -> Result<Vec<DailyStats>, PulseError> {
        let modifier = format!("-{days} days");
        let mut sql = String::from(
            "SELECT response_date,
                    COUNT(*) AS response_count,
                    AVG(joy_score) AS avg_joy,
                    AVG(achievement_score) AS avg_achievement,
                    AVG(meaningfulness_score) AS avg_meaningfulness
             FROM survey_responses
             WHERE response_date >= date('now', ?)",
        );
        if campaign_id.is_some() {
            sql.push_str(" AND campaign_id = ?");
        }
        sql.push_str(" GROUP BY response_date ORDER BY response_date DESC");

        let mut query = sqlx::query_as::<_, DailyStats>(&sql).bind(&modifier);
        if let Some(cid) = campaign_id {
            query = query.bind(cid);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("analytics daily failed: {e}")))
    }

    /// Every stored response joined with user and campaign names, newest
    /// first, optionally scoped to one campaign. Backs the admin export.
    pub async fn export_responses(
        &self,
        campaign_id: Option<i64>,
    ) -> Result<Vec<ResponseDetail>, PulseError> {
        let mut sql = String::from(DETAIL_SELECT);
        if campaign_id.is_some() {
            sql.push_str(" WHERE sr.campaign_id = ?");
        }
        sql.push_str(" ORDER BY sr.submitted_at DESC");

        let mut query = sqlx::query_as::<_, ResponseDetail>(&sql);
        if let Some(cid) = campaign_id {
            query = query.bind(cid);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("export responses failed: {e}")))
    }

    /// Full response history for one user, newest first.
    pub async fn user_responses(&self, user_id: i64) -> Result<Vec<ResponseDetail>, PulseError> {
        sqlx::query_as::<_, ResponseDetail>(&format!(
            "{DETAIL_SELECT} WHERE sr.user_id = ? ORDER BY sr.response_date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("user responses failed: {e}")))
    }

    /// Responses from the trailing 7 days for one user.
    pub async fn user_recent_responses(
        &self,
        user_id: i64,
    ) -> Result<Vec<ResponseDetail>, PulseError> {
        sqlx::query_as::<_, ResponseDetail>(&format!(
            "{DETAIL_SELECT}
             WHERE sr.user_id = ? AND sr.response_date >= date('now', '-7 days')
             ORDER BY sr.response_date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("user recent responses failed: {e}")))
    }

    /// Trailing-7-day totals and averages for one user across campaigns.
    pub async fn user_weekly_summary(&self, user_id: i64) -> Result<UserWeeklySummary, PulseError> {
        sqlx::query_as::<_, UserWeeklySummary>(
            "SELECT COALESCE(SUM(joy_score), 0) AS joy,
                    COALESCE(SUM(achievement_score), 0) AS achievement,
                    COALESCE(SUM(meaningfulness_score), 0) AS meaningfulness,
                    COUNT(*) AS total_days,
                    AVG(joy_score) AS avg_joy,
                    AVG(achievement_score) AS avg_achievement,
                    AVG(meaningfulness_score) AS avg_meaningfulness
             FROM survey_responses
             WHERE user_id = ? AND response_date >= date('now', '-7 days')",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("user weekly summary failed: {e}")))
    }

    /// All-time aggregate stats for one user.
    pub async fn user_alltime_stats(&self, user_id: i64) -> Result<AnalyticsSummary, PulseError> {
        sqlx::query_as::<_, AnalyticsSummary>(
            "SELECT COUNT(*) AS total_responses,
                    AVG(joy_score) AS avg_joy,
                    AVG(achievement_score) AS avg_achievement,
                    AVG(meaningfulness_score) AS avg_meaningfulness,
                    MIN(response_date) AS first_response,
                    MAX(response_date) AS last_response
             FROM survey_responses
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("user alltime stats failed: {e}")))
    }

    /// Recent responses for the admin dashboard.
    pub async fn recent_responses(&self, limit: i64) -> Result<Vec<ResponseDetail>, PulseError> {
        sqlx::query_as::<_, ResponseDetail>(&format!(
            "{DETAIL_SELECT} ORDER BY sr.submitted_at DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("recent responses failed: {e}")))
    }

    pub async fn total_response_count(&self) -> Result<i64, PulseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM survey_responses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("total response count failed: {e}")))?;
        Ok(count)
    }

    pub async fn today_response_count(&self) -> Result<i64, PulseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM survey_responses WHERE response_date = date('now')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("today response count failed: {e}")))?;
        Ok(count)
    }

    pub async fn active_user_count(&self) -> Result<i64, PulseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PulseError::Store(format!("active user count failed: {e}")))?;
        Ok(count)
    }

    pub async fn active_campaign_count(&self) -> Result<i64, PulseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM campaigns WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PulseError::Store(format!("active campaign count failed: {e}")))?;
        Ok(count)
    }
}
