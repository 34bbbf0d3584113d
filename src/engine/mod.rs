//! Survey lifecycle engine: the daily dispatch decision, reply validation
//! and scoring, and feedback composition.
//!
//! The engine owns no schedule of its own — the scheduler calls
//! [`Engine::run_daily_dispatch`] once per day, and the HTTP layer calls
//! [`Engine::handle_reply`] / [`Engine::submit_response`] as replies arrive.

pub mod feedback;
pub mod parse;

use pulse_core::error::PulseError;
use pulse_core::model::{ReplyOutcome, Scores, User};
use pulse_core::traits::Messenger;
use pulse_store::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Totals reported by one daily dispatch pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchReport {
    pub sent: u64,
    pub failed: u64,
}

pub struct Engine {
    store: Store,
    messenger: Arc<dyn Messenger>,
    base_url: String,
    send_delay: Duration,
}

impl Engine {
    pub fn new(
        store: Store,
        messenger: Arc<dyn Messenger>,
        base_url: String,
        send_delay_ms: u64,
    ) -> Self {
        Self {
            store,
            messenger,
            base_url,
            send_delay: Duration::from_millis(send_delay_ms),
        }
    }

    pub fn messenger_name(&self) -> &str {
        self.messenger.name()
    }

    pub fn messenger_configured(&self) -> bool {
        self.messenger.is_configured()
    }

    /// One daily dispatch pass: for every active campaign and active user,
    /// send the survey prompt unless a response already exists for today.
    ///
    /// Processing is strictly sequential with a fixed pause between sends.
    /// Per-pair failures are counted and logged but never abort the pass.
    pub async fn run_daily_dispatch(&self) -> DispatchReport {
        let mut report = DispatchReport::default();

        let campaigns = match self.store.active_campaigns().await {
            Ok(c) => c,
            Err(e) => {
                error!("dispatch: failed to load active campaigns: {e}");
                return report;
            }
        };
        if campaigns.is_empty() {
            info!("dispatch: no active campaigns today");
            return report;
        }

        let users = match self.store.active_users().await {
            Ok(u) => u,
            Err(e) => {
                error!("dispatch: failed to load active users: {e}");
                return report;
            }
        };
        if users.is_empty() {
            info!("dispatch: no active users");
            return report;
        }

        for campaign in &campaigns {
            for user in &users {
                match self.store.response_exists_today(user.id, campaign.id).await {
                    Ok(true) => {
                        info!(
                            "dispatch: skipping {} - already responded today",
                            user.phone_number
                        );
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        report.failed += 1;
                        error!("dispatch: eligibility check for {} failed: {e}", user.phone_number);
                        continue;
                    }
                }

                match self.send_survey(user.id, campaign.id).await {
                    Ok(_) => {
                        report.sent += 1;
                        info!(
                            "dispatch: survey sent to {} for campaign \"{}\"",
                            user.phone_number, campaign.name
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        error!(
                            "dispatch: failed to send survey to {}: {e}",
                            user.phone_number
                        );
                    }
                }

                // Simple outbound rate control between sends.
                tokio::time::sleep(self.send_delay).await;
            }
        }

        info!(
            "dispatch complete: {} sent, {} failed",
            report.sent, report.failed
        );
        report
    }

    /// Send the survey prompt to one (user, campaign) pair, logging the
    /// attempt either way. Also backs the admin test-send, which bypasses
    /// the eligibility scan.
    pub async fn send_survey(&self, user_id: i64, campaign_id: i64) -> Result<String, PulseError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| PulseError::Validation(format!("user {user_id} not found")))?;
        self.store
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| PulseError::Validation(format!("campaign {campaign_id} not found")))?;

        let prompt = feedback::survey_prompt(&self.base_url);

        match self.messenger.send(&user.phone_number, &prompt).await {
            Ok(sid) => {
                self.store
                    .log_outbound(user_id, campaign_id, "survey", &prompt, &sid)
                    .await?;
                Ok(sid)
            }
            Err(e) => {
                self.store
                    .log_outbound_failure(user_id, campaign_id, "survey", &prompt, &e.to_string())
                    .await?;
                Err(e)
            }
        }
    }

    /// Validate and persist a response, then compose the feedback message.
    ///
    /// Returns `Validation` for out-of-range scores and `Conflict` when a
    /// response already exists for (user, campaign, today). The 7-day totals
    /// are recomputed after the insert so they include today's row.
    pub async fn submit_response(
        &self,
        user_id: i64,
        campaign_id: i64,
        scores: Scores,
        free_text: Option<&str>,
    ) -> Result<(i64, String), PulseError> {
        if !scores.in_range() {
            return Err(PulseError::Validation(
                "scores must be integers between 1 and 10".to_string(),
            ));
        }

        // SQLite does not enforce the FK constraints here; keep the
        // referential invariant at the boundary instead.
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| PulseError::Validation(format!("user {user_id} not found")))?;
        self.store
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| PulseError::Validation(format!("campaign {campaign_id} not found")))?;

        if self.store.response_exists_today(user_id, campaign_id).await? {
            return Err(PulseError::Conflict(
                "user has already responded today for this campaign".to_string(),
            ));
        }

        let response_id = self
            .store
            .insert_response(user_id, campaign_id, scores, free_text)
            .await?;

        let weekly = self.store.weekly_totals(user_id, campaign_id).await?;
        Ok((response_id, feedback::feedback_message(&scores, &weekly)))
    }

    /// Process one inbound SMS reply. Never fails on user mistakes — those
    /// become outcomes with fixed reply templates; only store errors
    /// propagate.
    pub async fn handle_reply(
        &self,
        from: &str,
        body: &str,
        twilio_sid: Option<&str>,
    ) -> Result<ReplyOutcome, PulseError> {
        let user = match self.store.get_user_by_phone(from).await? {
            Some(u) => u,
            None => {
                info!("reply from unknown number: {from}");
                return Ok(ReplyOutcome::UnknownSender);
            }
        };

        let campaign = match self.store.latest_active_campaign().await? {
            Some(c) => c,
            None => {
                info!("reply from {from} but no active campaign");
                return Ok(ReplyOutcome::NoActiveCampaign);
            }
        };

        let parsed = match parse::parse_reply(body) {
            Ok(p) => p,
            Err(reason) => {
                info!("reply from {from} rejected: {reason:?}");
                self.store
                    .log_reply(user.id, campaign.id, body, twilio_sid, "invalid")
                    .await?;
                return Ok(ReplyOutcome::InvalidFormat);
            }
        };

        let feedback = match self
            .submit_response(user.id, campaign.id, parsed.scores, parsed.free_text.as_deref())
            .await
        {
            Ok((_, feedback)) => feedback,
            Err(PulseError::Conflict(_)) => {
                self.store
                    .log_reply(user.id, campaign.id, body, twilio_sid, "processed")
                    .await?;
                return Ok(ReplyOutcome::AlreadyResponded);
            }
            Err(e) => return Err(e),
        };

        self.store
            .log_reply(user.id, campaign.id, body, twilio_sid, "processed")
            .await?;

        // Feedback delivery is best-effort: the response is already durable.
        self.send_feedback(&user, campaign.id, &feedback).await;

        Ok(ReplyOutcome::Accepted { feedback })
    }

    /// Send a composed feedback message, logging the attempt. Delivery
    /// failures are swallowed — the stored response is what matters.
    pub async fn send_feedback(&self, user: &User, campaign_id: i64, feedback: &str) {
        match self.messenger.send(&user.phone_number, feedback).await {
            Ok(sid) => {
                if let Err(e) = self
                    .store
                    .log_outbound(user.id, campaign_id, "feedback", feedback, &sid)
                    .await
                {
                    error!("failed to log feedback send: {e}");
                }
            }
            Err(e) => {
                warn!("feedback send to {} failed: {e}", user.phone_number);
                if let Err(log_err) = self
                    .store
                    .log_outbound_failure(user.id, campaign_id, "feedback", feedback, &e.to_string())
                    .await
                {
                    error!("failed to log feedback failure: {log_err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
