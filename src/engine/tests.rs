use super::*;
use crate::testutil::{test_store, MockMessenger};

fn engine(store: Store, messenger: Arc<MockMessenger>) -> Engine {
    Engine::new(store, messenger, "http://localhost:3001".to_string(), 0)
}

async fn seed(store: &Store, phones: &[&str]) -> i64 {
    for phone in phones {
        store
            .create_user(phone, None, "America/New_York")
            .await
            .unwrap();
    }
    store
        .create_campaign("Always on", "2000-01-01", "2100-01-01")
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_dispatch_sends_to_all_eligible_users() {
    let (_dir, store) = test_store().await;
    seed(&store, &["+15551230001", "+15551230002"]).await;

    let messenger = MockMessenger::new();
    let engine = engine(store, messenger.clone());

    let report = engine.run_daily_dispatch().await;
    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(messenger.sent_count(), 2);
}

#[tokio::test]
async fn test_dispatch_skips_users_who_responded_today() {
    let (_dir, store) = test_store().await;
    let campaign_id = seed(&store, &["+15551230001", "+15551230002"]).await;
    let responded = store.get_user_by_phone("+15551230001").await.unwrap().unwrap();
    store
        .insert_response(
            responded.id,
            campaign_id,
            Scores {
                joy: 8,
                achievement: 7,
                meaningfulness: 9,
            },
            None,
        )
        .await
        .unwrap();

    let messenger = MockMessenger::new();
    let engine = engine(store, messenger.clone());

    let report = engine.run_daily_dispatch().await;
    assert_eq!(report.sent, 1);
    let sent = messenger.sent.lock().unwrap();
    assert_eq!(sent[0].0, "+15551230002");
}

#[tokio::test]
async fn test_dispatch_skips_inactive_users_and_counts_nothing() {
    let (_dir, store) = test_store().await;
    seed(&store, &["+15551230001"]).await;
    let user = store.get_user_by_phone("+15551230001").await.unwrap().unwrap();
    store
        .update_user(user.id, None, None, Some(false))
        .await
        .unwrap();

    let messenger = MockMessenger::new();
    let engine = engine(store, messenger.clone());

    let report = engine.run_daily_dispatch().await;
    assert_eq!(report.sent, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(messenger.sent_count(), 0);
}

#[tokio::test]
async fn test_dispatch_counts_failures_and_continues() {
    let (_dir, store) = test_store().await;
    seed(&store, &["+15551230001", "+15551230002"]).await;

    let messenger = MockMessenger::failing();
    let engine = engine(store.clone(), messenger);

    let report = engine.run_daily_dispatch().await;
    assert_eq!(report.sent, 0);
    assert_eq!(report.failed, 2);

    // Each failure leaves a 'failed' audit row.
    let stats = store.sms_stats().await.unwrap();
    let failed: i64 = stats
        .iter()
        .filter(|s| s.status == "failed")
        .map(|s| s.count)
        .sum();
    assert_eq!(failed, 2);
}

#[tokio::test]
async fn test_send_survey_unknown_user_is_validation_error() {
    let (_dir, store) = test_store().await;
    let campaign_id = seed(&store, &[]).await;

    let engine = engine(store, MockMessenger::new());
    let err = engine.send_survey(999, campaign_id).await.unwrap_err();
    assert!(matches!(err, PulseError::Validation(_)), "got: {err}");
}

#[tokio::test]
async fn test_submit_response_rejects_out_of_range() {
    let (_dir, store) = test_store().await;
    let campaign_id = seed(&store, &["+15551230001"]).await;
    let user = store.get_user_by_phone("+15551230001").await.unwrap().unwrap();

    let engine = engine(store, MockMessenger::new());
    let err = engine
        .submit_response(
            user.id,
            campaign_id,
            Scores {
                joy: 11,
                achievement: 5,
                meaningfulness: 5,
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::Validation(_)), "got: {err}");
}

#[tokio::test]
async fn test_submit_response_second_attempt_conflicts() {
    let (_dir, store) = test_store().await;
    let campaign_id = seed(&store, &["+15551230001"]).await;
    let user = store.get_user_by_phone("+15551230001").await.unwrap().unwrap();
    let scores = Scores {
        joy: 8,
        achievement: 7,
        meaningfulness: 9,
    };

    let engine = engine(store.clone(), MockMessenger::new());
    let (id, feedback) = engine
        .submit_response(user.id, campaign_id, scores, Some("Great day!"))
        .await
        .unwrap();
    assert!(id > 0);
    // Weekly totals include the row just inserted.
    assert!(feedback.contains("Joy: 8\n"));

    let err = engine
        .submit_response(user.id, campaign_id, scores, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::Conflict(_)), "got: {err}");

    let (_, total) = store.list_responses(None, None, 50, 0).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_handle_reply_unknown_sender() {
    let (_dir, store) = test_store().await;
    seed(&store, &[]).await;

    let engine = engine(store, MockMessenger::new());
    let outcome = engine.handle_reply("+19998887777", "8,7,9", None).await.unwrap();
    assert_eq!(outcome.kind(), "unknown_sender");
}

#[tokio::test]
async fn test_handle_reply_no_active_campaign() {
    let (_dir, store) = test_store().await;
    store
        .create_user("+15551230001", None, "America/New_York")
        .await
        .unwrap();
    store
        .create_campaign("Over", "2000-01-01", "2000-02-01")
        .await
        .unwrap();

    let engine = engine(store, MockMessenger::new());
    let outcome = engine.handle_reply("+15551230001", "8,7,9", None).await.unwrap();
    assert_eq!(outcome.kind(), "no_active_campaign");
}

#[tokio::test]
async fn test_handle_reply_invalid_format_is_logged() {
    let (_dir, store) = test_store().await;
    seed(&store, &["+15551230001"]).await;

    let engine = engine(store.clone(), MockMessenger::new());
    let outcome = engine
        .handle_reply("+15551230001", "a,b,c", Some("SMin1"))
        .await
        .unwrap();
    assert_eq!(outcome.kind(), "invalid_format");

    let stats = store.sms_stats().await.unwrap();
    assert!(stats.iter().any(|s| s.status == "invalid"));
}

#[tokio::test]
async fn test_handle_reply_success_stores_and_sends_feedback() {
    let (_dir, store) = test_store().await;
    seed(&store, &["+15551230001"]).await;

    let messenger = MockMessenger::new();
    let engine = engine(store.clone(), messenger.clone());
    let outcome = engine
        .handle_reply("+15551230001", "8,7,9,Great day!", Some("SMin1"))
        .await
        .unwrap();

    match outcome {
        ReplyOutcome::Accepted { feedback } => {
            assert!(feedback.contains("Average: 8.0/10"));
            assert!(feedback.contains("Amazing"));
        }
        other => panic!("expected Accepted, got {other:?}"),
    }

    let (rows, total) = store.list_responses(None, None, 50, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].free_text.as_deref(), Some("Great day!"));

    // The feedback SMS went out through the messenger.
    let sent = messenger.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Your Scores"));
}

#[tokio::test]
async fn test_handle_reply_duplicate_day_acknowledged() {
    let (_dir, store) = test_store().await;
    seed(&store, &["+15551230001"]).await;

    let engine = engine(store.clone(), MockMessenger::new());
    engine
        .handle_reply("+15551230001", "8,7,9", None)
        .await
        .unwrap();
    let outcome = engine
        .handle_reply("+15551230001", "5,5,5", None)
        .await
        .unwrap();
    assert_eq!(outcome.kind(), "already_responded");

    let (_, total) = store.list_responses(None, None, 50, 0).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_feedback_delivery_failure_keeps_response() {
    let (_dir, store) = test_store().await;
    seed(&store, &["+15551230001"]).await;

    let engine = engine(store.clone(), MockMessenger::failing());
    let outcome = engine
        .handle_reply("+15551230001", "4,4,4", None)
        .await
        .unwrap();
    assert_eq!(outcome.kind(), "success");

    // Response durable even though the feedback SMS failed.
    let (_, total) = store.list_responses(None, None, 50, 0).await.unwrap();
    assert_eq!(total, 1);
    let stats = store.sms_stats().await.unwrap();
    assert!(stats.iter().any(|s| s.status == "failed"));
}
