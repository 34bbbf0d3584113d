//! Daily dispatch scheduler: fires once per day at a fixed wall-clock time
//! in a configured time zone, plus an on-demand single-pair test send.

use crate::engine::Engine;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use pulse_core::config::SchedulerConfig;
use pulse_core::error::PulseError;
use serde::Serialize;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Next-fire info for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct NextRun {
    pub next_run: String,
    pub timezone: String,
    pub minutes_until: i64,
}

pub struct Scheduler {
    engine: Arc<Engine>,
    tz: Tz,
    hour: u32,
    minute: u32,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(engine: Arc<Engine>, config: &SchedulerConfig) -> Result<Self, PulseError> {
        let tz = Tz::from_str(&config.timezone)
            .map_err(|_| PulseError::Config(format!("unknown timezone: {}", config.timezone)))?;
        if config.hour > 23 || config.minute > 59 {
            return Err(PulseError::Config(format!(
                "invalid fire time {:02}:{:02}",
                config.hour, config.minute
            )));
        }
        Ok(Self {
            engine,
            tz,
            hour: config.hour,
            minute: config.minute,
            handle: Mutex::new(None),
        })
    }

    /// Arm the daily timer. Each fire runs one dispatch pass, then re-arms
    /// for the next day. A dispatch failure never kills the loop.
    pub fn start(self: &Arc<Self>) {
        let scheduler = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                let now = Utc::now().with_timezone(&scheduler.tz);
                let next = next_fire(now, scheduler.hour, scheduler.minute);
                let wait = (next - now)
                    .to_std()
                    .unwrap_or(std::time::Duration::from_secs(1));
                info!(
                    "scheduler armed: next dispatch at {} ({})",
                    next.to_rfc3339(),
                    scheduler.tz
                );
                tokio::time::sleep(wait).await;

                info!("scheduler fired: starting daily survey dispatch");
                scheduler.spawn_dispatch();
            }
        });

        let mut handle = match self.handle.lock() {
            Ok(h) => h,
            Err(e) => {
                error!("scheduler handle lock poisoned: {e}");
                return;
            }
        };
        if let Some(old) = handle.replace(task) {
            old.abort();
        }
        info!(
            "daily scheduler started: surveys go out at {:02}:{:02} {}",
            self.hour, self.minute, self.tz
        );
    }

    /// Run one dispatch pass on its own task. The pass is detached from the
    /// timer so a later `stop` cannot cancel a pass already in flight.
    fn spawn_dispatch(&self) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            let report = engine.run_daily_dispatch().await;
            info!(
                "scheduler: dispatch pass done ({} sent, {} failed)",
                report.sent, report.failed
            );
        })
    }

    /// Disarm the timer. Idempotent; an in-flight dispatch pass runs on its
    /// own task and completes, only future fires are prevented.
    pub fn stop(&self) {
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(task) = handle.take() {
                task.abort();
                info!("daily scheduler stopped");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .map(|h| h.as_ref().map(|t| !t.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// When the next dispatch fires, in the configured zone.
    pub fn next_run(&self) -> NextRun {
        let now = Utc::now().with_timezone(&self.tz);
        let next = next_fire(now, self.hour, self.minute);
        NextRun {
            next_run: next.to_rfc3339(),
            timezone: self.tz.to_string(),
            minutes_until: (next - now).num_minutes(),
        }
    }

    /// Admin test send: bypasses the eligibility scan and sends the survey
    /// prompt to one (user, campaign) pair immediately.
    pub async fn send_test_survey(
        &self,
        user_id: i64,
        campaign_id: i64,
    ) -> Result<String, PulseError> {
        info!("test survey requested for user {user_id}, campaign {campaign_id}");
        self.engine.send_survey(user_id, campaign_id).await
    }
}

/// The next instant strictly after `now` at `hour:minute` local to `now`'s
/// zone. Skips forward over nonexistent local times (DST spring-forward).
fn next_fire(now: DateTime<Tz>, hour: u32, minute: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    for _ in 0..4 {
        if let Some(naive) = date.and_hms_opt(hour, minute, 0) {
            if let Some(candidate) = tz.from_local_datetime(&naive).earliest() {
                if candidate > now {
                    return candidate;
                }
            }
        }
        date = date + chrono::Days::new(1);
    }
    // Unreachable for a sane zone; fall back to 24h from now.
    now + chrono::Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::testutil::{test_store, MockMessenger};
    use chrono::Timelike;
    use pulse_core::config::SchedulerConfig;
    use std::time::Duration;

    fn at(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_next_fire_later_today() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let now = at(tz, 2024, 3, 4, 5, 30);
        let next = next_fire(now, 7, 0);
        assert_eq!(next, at(tz, 2024, 3, 4, 7, 0));
    }

    #[test]
    fn test_next_fire_rolls_to_tomorrow() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let now = at(tz, 2024, 3, 4, 7, 0);
        // Exactly at fire time: the next fire is tomorrow's.
        let next = next_fire(now, 7, 0);
        assert_eq!(next, at(tz, 2024, 3, 5, 7, 0));

        let now = at(tz, 2024, 3, 4, 9, 15);
        let next = next_fire(now, 7, 0);
        assert_eq!(next, at(tz, 2024, 3, 5, 7, 0));
    }

    #[test]
    fn test_next_fire_across_dst_spring_forward() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // 2024-03-10 02:30 does not exist in New York; a 02:30 schedule
        // queried the evening before must land on a real instant.
        let now = at(tz, 2024, 3, 9, 23, 0);
        let next = next_fire(now, 2, 30);
        assert!(next > now);
        assert_eq!(next.minute(), 30);
    }

    #[tokio::test]
    async fn test_stop_does_not_cancel_in_flight_pass() {
        let (_dir, store) = test_store().await;
        for phone in ["+15551230001", "+15551230002"] {
            store
                .create_user(phone, None, "America/New_York")
                .await
                .unwrap();
        }
        store
            .create_campaign("Always on", "2000-01-01", "2100-01-01")
            .await
            .unwrap();

        let messenger = MockMessenger::new();
        // A long inter-send pause keeps the pass in flight when stop lands.
        let engine = Arc::new(Engine::new(
            store,
            messenger.clone(),
            "http://localhost:3001".to_string(),
            200,
        ));
        let scheduler = Arc::new(
            Scheduler::new(
                engine,
                &SchedulerConfig {
                    timezone: "America/New_York".to_string(),
                    hour: 7,
                    minute: 0,
                    send_delay_ms: 200,
                },
            )
            .unwrap(),
        );
        scheduler.start();

        let pass = scheduler.spawn_dispatch();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();
        assert!(!scheduler.is_running());

        // The pass already in flight still delivers to both users.
        pass.await.unwrap();
        assert_eq!(messenger.sent_count(), 2);
    }

    #[test]
    fn test_next_fire_respects_zone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        let now = at(tokyo, 2024, 6, 1, 6, 59);
        let next = next_fire(now, 7, 0);
        assert_eq!(next, at(tokyo, 2024, 6, 1, 7, 0));
        assert_eq!((next - now).num_minutes(), 1);
    }
}
