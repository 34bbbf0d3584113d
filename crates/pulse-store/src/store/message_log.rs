//! Append-only SMS audit trail and delivery-status reconciliation.

use super::Store;
use pulse_core::error::PulseError;

/// One row of the 7-day status breakdown for the admin dashboard.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct SmsStat {
    pub status: String,
    pub count: i64,
    pub date: String,
}

impl Store {
    /// Log a successfully accepted outbound message (`survey` or `feedback`).
    pub async fn log_outbound(
        &self,
        user_id: i64,
        campaign_id: i64,
        message_type: &str,
        content: &str,
        twilio_sid: &str,
    ) -> Result<(), PulseError> {
        sqlx::query(
            "INSERT INTO sms_logs (user_id, campaign_id, message_type, message_content, twilio_sid, status, sent_at)
             VALUES (?, ?, ?, ?, ?, 'sent', CURRENT_TIMESTAMP)",
        )
        .bind(user_id)
        .bind(campaign_id)
        .bind(message_type)
        .bind(content)
        .bind(twilio_sid)
        .execute(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("log outbound failed: {e}")))?;
        Ok(())
    }

    /// Log a failed outbound delivery attempt with the provider's error text.
    pub async fn log_outbound_failure(
        &self,
        user_id: i64,
        campaign_id: i64,
        message_type: &str,
        content: &str,
        error: &str,
    ) -> Result<(), PulseError> {
        sqlx::query(
            "INSERT INTO sms_logs (user_id, campaign_id, message_type, message_content, status, error_message)
             VALUES (?, ?, ?, ?, 'failed', ?)",
        )
        .bind(user_id)
        .bind(campaign_id)
        .bind(message_type)
        .bind(content)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("log outbound failure failed: {e}")))?;
        Ok(())
    }

    /// Log an inbound reply with its processing outcome
    /// (`processed` or `invalid`).
    pub async fn log_reply(
        &self,
        user_id: i64,
        campaign_id: i64,
        content: &str,
        twilio_sid: Option<&str>,
        status: &str,
    ) -> Result<(), PulseError> {
        sqlx::query(
            "INSERT INTO sms_logs (user_id, campaign_id, message_type, message_content, twilio_sid, status)
             VALUES (?, ?, 'reply', ?, ?, ?)",
        )
        .bind(user_id)
        .bind(campaign_id)
        .bind(content)
        .bind(twilio_sid)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("log reply failed: {e}")))?;
        Ok(())
    }

    /// Reconcile a delivery-status callback against the matching log row.
    /// Returns whether a row was updated; an unmatched sid is a no-op.
    pub async fn apply_delivery_status(
        &self,
        twilio_sid: &str,
        status: &str,
    ) -> Result<bool, PulseError> {
        let delivered_at = if status == "delivered" {
            Some(chrono::Utc::now().to_rfc3339())
        } else {
            None
        };

        let result = sqlx::query(
            "UPDATE sms_logs SET status = ?, delivered_at = ? WHERE twilio_sid = ?",
        )
        .bind(status)
        .bind(delivered_at)
        .bind(twilio_sid)
        .execute(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("apply delivery status failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Status counts per day over the trailing 7 days.
    pub async fn sms_stats(&self) -> Result<Vec<SmsStat>, PulseError> {
        sqlx::query_as::<_, SmsStat>(
            "SELECT status, COUNT(*) AS count, DATE(created_at) AS date
             FROM sms_logs
             WHERE created_at >= date('now', '-7 days')
             GROUP BY status, DATE(created_at)
             ORDER BY date DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("sms stats failed: {e}")))
    }
}
