//! Admin and survey HTTP API.
//!
//! JSON CRUD for users, campaigns, and responses; the Twilio inbound
//! webhooks; and a bearer-token-gated admin surface. Bodies follow a
//! `{"success": bool, ...}` envelope throughout.

use crate::engine::Engine;
use crate::scheduler::Scheduler;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Form, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use pulse_core::error::PulseError;
use pulse_core::model::{ReplyOutcome, ResponseDetail, Scores};
use pulse_store::Store;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ApiState {
    pub store: Store,
    pub engine: Arc<Engine>,
    pub scheduler: Arc<Scheduler>,
    pub admin_token: Option<String>,
    pub service_name: String,
}

#[derive(Deserialize)]
struct CreateUserRequest {
    phone_number: String,
    name: Option<String>,
    timezone: Option<String>,
}

#[derive(Deserialize)]
struct UpdateUserRequest {
    name: Option<String>,
    timezone: Option<String>,
    is_active: Option<bool>,
}

#[derive(Deserialize)]
struct CreateCampaignRequest {
    name: String,
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct UpdateCampaignRequest {
    name: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    is_active: Option<bool>,
}

#[derive(Deserialize)]
struct SubmitResponseRequest {
    user_id: i64,
    campaign_id: i64,
    joy_score: i64,
    achievement_score: i64,
    meaningfulness_score: i64,
    free_text: Option<String>,
}

#[derive(Deserialize)]
struct ListResponsesQuery {
    user_id: Option<i64>,
    campaign_id: Option<i64>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Deserialize)]
struct AnalyticsQuery {
    campaign_id: Option<i64>,
    days: Option<i64>,
}

/// Twilio posts webhooks as form-encoded bodies with PascalCase keys.
#[derive(Deserialize)]
struct InboundSmsForm {
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "Body")]
    body: Option<String>,
    #[serde(rename = "MessageSid")]
    message_sid: Option<String>,
}

#[derive(Deserialize)]
struct StatusCallbackForm {
    #[serde(rename = "MessageSid")]
    message_sid: Option<String>,
    #[serde(rename = "MessageStatus")]
    message_status: Option<String>,
}

#[derive(Deserialize)]
struct ExportQuery {
    campaign_id: Option<i64>,
    format: Option<String>,
}

#[derive(Deserialize)]
struct TestSmsRequest {
    user_id: i64,
    campaign_id: i64,
}

#[derive(Deserialize)]
struct ImportUserEntry {
    phone_number: Option<String>,
    name: Option<String>,
    timezone: Option<String>,
}

#[derive(Deserialize)]
struct ImportUsersRequest {
    users: Vec<ImportUserEntry>,
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn error_response(e: PulseError) -> ApiError {
    let status = match &e {
        PulseError::Validation(_) => StatusCode::BAD_REQUEST,
        PulseError::Conflict(_) => StatusCode::CONFLICT,
        PulseError::Delivery(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"success": false, "error": e.to_string()})))
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message})),
    )
}

fn not_found(message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"success": false, "error": message})),
    )
}

/// E.164 shape: optional `+`, leading digit 1-9, 2 to 15 digits total.
fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let bytes = digits.as_bytes();
    if bytes.len() < 2 || bytes.len() > 15 {
        return false;
    }
    (b'1'..=b'9').contains(&bytes[0]) && bytes[1..].iter().all(|b| b.is_ascii_digit())
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| bad_request(&format!("{field} must be a YYYY-MM-DD date")))
}

/// Constant-time string comparison to prevent timing attacks on the admin
/// token check.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth for the admin surface. Returns `None` if
/// authorized, `Some(response)` if rejected. An unset or empty token
/// rejects everything rather than opening the surface up.
fn check_auth(headers: &HeaderMap, admin_token: &Option<String>) -> Option<ApiError> {
    let token = match admin_token {
        Some(t) if !t.is_empty() => t,
        _ => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "error": "admin token not configured"})),
            ));
        }
    };

    let header = match headers.get("authorization") {
        Some(h) => h,
        None => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "error": "missing Authorization header"})),
            ));
        }
    };

    let value = match header.to_str() {
        Ok(v) => v,
        Err(_) => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "error": "invalid Authorization header"})),
            ));
        }
    };

    match value.strip_prefix("Bearer ") {
        Some(presented) if constant_time_eq(presented, token) => None,
        _ => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "invalid token"})),
        )),
    }
}

/// `GET /health` — unauthenticated liveness probe.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.service_name,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /api/users` — all users with response stats.
async fn list_users(State(state): State<ApiState>) -> ApiResult {
    let users = state.store.list_users().await.map_err(error_response)?;
    Ok(Json(json!({"success": true, "users": users})))
}

/// `POST /api/users` — enroll a user.
async fn create_user(
    State(state): State<ApiState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !is_valid_phone(&req.phone_number) {
        return Err(bad_request("phone_number must be a valid E.164 number"));
    }
    let timezone = req.timezone.as_deref().unwrap_or("America/New_York");
    let user = state
        .store
        .create_user(&req.phone_number, req.name.as_deref(), timezone)
        .await
        .map_err(error_response)?;
    info!("user {} enrolled ({})", user.id, user.phone_number);
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "user": user})),
    ))
}

/// `GET /api/users/{id}` — one user with full history and weekly totals.
async fn get_user(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult {
    let user = state
        .store
        .get_user(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("user not found"))?;
    let responses = state.store.user_responses(id).await.map_err(error_response)?;
    let weekly = state
        .store
        .user_weekly_summary(id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "success": true,
        "user": user,
        "responses": responses,
        "weekly_totals": weekly,
    })))
}

/// `PUT /api/users/{id}` — update name, timezone, or active flag.
async fn update_user(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult {
    let user = state
        .store
        .update_user(id, req.name.as_deref(), req.timezone.as_deref(), req.is_active)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("user not found"))?;
    Ok(Json(json!({"success": true, "user": user})))
}

/// `DELETE /api/users/{id}` — hard delete, refused while responses exist.
async fn delete_user(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult {
    let count = state
        .store
        .user_response_count(id)
        .await
        .map_err(error_response)?;
    if count > 0 {
        return Err(bad_request(
            "Cannot delete user with existing responses. Deactivate instead.",
        ));
    }
    if !state.store.delete_user(id).await.map_err(error_response)? {
        return Err(not_found("user not found"));
    }
    Ok(Json(json!({"success": true, "message": "User deleted successfully"})))
}

/// `GET /api/users/{id}/dashboard` — recent activity and aggregates.
async fn user_dashboard(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult {
    let user = state
        .store
        .get_user(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("user not found"))?;
    let recent = state
        .store
        .user_recent_responses(id)
        .await
        .map_err(error_response)?;
    let weekly = state
        .store
        .user_weekly_summary(id)
        .await
        .map_err(error_response)?;
    let alltime = state
        .store
        .user_alltime_stats(id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "success": true,
        "dashboard": {
            "user": user,
            "recent_responses": recent,
            "weekly_summary": weekly,
            "alltime_stats": alltime,
        },
    })))
}

/// `GET /api/campaigns` — all campaigns with response counts.
async fn list_campaigns(State(state): State<ApiState>) -> ApiResult {
    let campaigns = state.store.list_campaigns().await.map_err(error_response)?;
    Ok(Json(json!({"success": true, "campaigns": campaigns})))
}

/// `POST /api/campaigns` — create a campaign with a validated date window.
async fn create_campaign(
    State(state): State<ApiState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(bad_request("name must not be empty"));
    }
    let start = parse_date(&req.start_date, "start_date")?;
    let end = parse_date(&req.end_date, "end_date")?;
    if end <= start {
        return Err(bad_request("End date must be after start date"));
    }
    let campaign = state
        .store
        .create_campaign(req.name.trim(), &req.start_date, &req.end_date)
        .await
        .map_err(error_response)?;
    info!("campaign {} created: {}", campaign.id, campaign.name);
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "campaign": campaign})),
    ))
}

/// `GET /api/campaigns/active/list` — campaigns currently inside their window.
async fn active_campaigns(State(state): State<ApiState>) -> ApiResult {
    let campaigns = state
        .store
        .active_campaigns()
        .await
        .map_err(error_response)?;
    Ok(Json(json!({"success": true, "campaigns": campaigns})))
}

/// `GET /api/campaigns/{id}` — one campaign with aggregate and daily stats.
async fn get_campaign(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult {
    let campaign = state
        .store
        .get_campaign(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("campaign not found"))?;
    let stats = state.store.campaign_stats(id).await.map_err(error_response)?;
    let daily = state
        .store
        .campaign_daily_stats(id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "success": true,
        "campaign": campaign,
        "stats": stats,
        "daily_stats": daily,
    })))
}

/// `PUT /api/campaigns/{id}` — update fields; dates are format-checked.
async fn update_campaign(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCampaignRequest>,
) -> ApiResult {
    if let Some(s) = &req.start_date {
        parse_date(s, "start_date")?;
    }
    if let Some(e) = &req.end_date {
        parse_date(e, "end_date")?;
    }
    let campaign = state
        .store
        .update_campaign(
            id,
            req.name.as_deref(),
            req.start_date.as_deref(),
            req.end_date.as_deref(),
            req.is_active,
        )
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("campaign not found"))?;
    Ok(Json(json!({"success": true, "campaign": campaign})))
}

/// `DELETE /api/campaigns/{id}` — hard delete, refused while responses exist.
async fn delete_campaign(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult {
    let count = state
        .store
        .campaign_response_count(id)
        .await
        .map_err(error_response)?;
    if count > 0 {
        return Err(bad_request(
            "Cannot delete campaign with existing responses. Deactivate instead.",
        ));
    }
    if !state
        .store
        .delete_campaign(id)
        .await
        .map_err(error_response)?
    {
        return Err(not_found("campaign not found"));
    }
    Ok(Json(json!({"success": true, "message": "Campaign deleted successfully"})))
}

/// `POST /api/responses` — web-form submission path. Mirrors the SMS reply
/// flow: validate, store, compose feedback, and send it best-effort.
async fn submit_response(
    State(state): State<ApiState>,
    payload: Result<Json<SubmitResponseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(req) = payload.map_err(|e| bad_request(&format!("invalid request body: {e}")))?;
    let scores = Scores {
        joy: req.joy_score,
        achievement: req.achievement_score,
        meaningfulness: req.meaningfulness_score,
    };
    let (id, feedback) = state
        .engine
        .submit_response(req.user_id, req.campaign_id, scores, req.free_text.as_deref())
        .await
        .map_err(error_response)?;

    if let Ok(Some(user)) = state.store.get_user(req.user_id).await {
        state.engine.send_feedback(&user, req.campaign_id, &feedback).await;
    }

    let response = state.store.get_response(id).await.map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "response": response,
            "feedback": feedback,
            "message": "Response submitted successfully and feedback sent!",
        })),
    ))
}

/// `GET /api/responses` — filtered, paginated listing.
async fn list_responses(
    State(state): State<ApiState>,
    Query(query): Query<ListResponsesQuery>,
) -> ApiResult {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);
    let (responses, total) = state
        .store
        .list_responses(query.user_id, query.campaign_id, limit, offset)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "success": true,
        "responses": responses,
        "pagination": {
            "total": total,
            "limit": limit,
            "offset": offset,
            "has_more": offset + limit < total,
        },
    })))
}

/// `GET /api/responses/analytics/summary` — window aggregates plus a
/// per-day breakdown.
async fn response_analytics(
    State(state): State<ApiState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult {
    let days = query.days.unwrap_or(30).clamp(1, 365);
    let summary = state
        .store
        .analytics_summary(query.campaign_id, days)
        .await
        .map_err(error_response)?;
    let daily = state
        .store
        .analytics_daily(query.campaign_id, days)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "success": true,
        "analytics": {
            "period_days": days,
            "summary": summary,
            "daily_breakdown": daily,
        },
    })))
}

/// `GET /api/responses/{id}` — one response with user and campaign names.
async fn get_response(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult {
    let response = state
        .store
        .get_response(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| not_found("response not found"))?;
    Ok(Json(json!({"success": true, "response": response})))
}

/// `POST /api/webhooks/twilio/sms-reply` — inbound SMS. User mistakes are
/// reported with HTTP 200 so Twilio never retries them.
async fn sms_reply_webhook(
    State(state): State<ApiState>,
    Form(form): Form<InboundSmsForm>,
) -> ApiResult {
    let (from, body) = match (form.from, form.body) {
        (Some(f), Some(b)) => (f, b),
        _ => return Err(bad_request("Missing required fields: From, Body")),
    };
    info!("inbound SMS from {from}");

    let outcome = state
        .engine
        .handle_reply(&from, &body, form.message_sid.as_deref())
        .await
        .map_err(error_response)?;

    let (message, kind) = match outcome {
        ReplyOutcome::UnknownSender => ("User not found".to_string(), None),
        ReplyOutcome::NoActiveCampaign => ("No active campaign".to_string(), None),
        ReplyOutcome::InvalidFormat => (
            crate::engine::feedback::INVALID_FORMAT_REPLY.to_string(),
            Some("invalid_format"),
        ),
        ReplyOutcome::AlreadyResponded => (
            crate::engine::feedback::ALREADY_RESPONDED_REPLY.to_string(),
            Some("already_responded"),
        ),
        ReplyOutcome::Accepted { feedback } => (feedback, Some("success")),
    };

    let mut body = json!({"success": true, "message": message});
    if let Some(kind) = kind {
        body["type"] = json!(kind);
    }
    Ok(Json(body))
}

/// `POST /api/webhooks/twilio/sms-status` — delivery-status callback.
async fn sms_status_webhook(
    State(state): State<ApiState>,
    Form(form): Form<StatusCallbackForm>,
) -> ApiResult {
    let sid = form
        .message_sid
        .ok_or_else(|| bad_request("Missing required field: MessageSid"))?;
    let status = form.message_status.unwrap_or_else(|| "unknown".to_string());

    let updated = state
        .store
        .apply_delivery_status(&sid, &status)
        .await
        .map_err(error_response)?;
    info!("delivery status for {sid}: {status} (matched: {updated})");
    Ok(Json(json!({"success": true, "updated": updated})))
}

/// `GET /api/admin/dashboard` — service-wide counters and recent activity.
async fn admin_dashboard(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.admin_token) {
        return Err(err);
    }

    let total_users = state.store.active_user_count().await.map_err(error_response)?;
    let total_campaigns = state
        .store
        .active_campaign_count()
        .await
        .map_err(error_response)?;
    let total_responses = state
        .store
        .total_response_count()
        .await
        .map_err(error_response)?;
    let today_responses = state
        .store
        .today_response_count()
        .await
        .map_err(error_response)?;
    let sms_stats = state.store.sms_stats().await.map_err(error_response)?;
    let recent = state.store.recent_responses(10).await.map_err(error_response)?;

    Ok(Json(json!({
        "success": true,
        "dashboard": {
            "stats": {
                "active_users": total_users,
                "active_campaigns": total_campaigns,
                "total_responses": total_responses,
                "today_responses": today_responses,
            },
            "sms_stats": sms_stats,
            "recent_responses": recent,
            "next_scheduled": state.scheduler.next_run(),
        },
    })))
}

/// `GET /api/admin/status` — component health for operators.
async fn admin_status(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.admin_token) {
        return Err(err);
    }

    let database_ok = state.store.ping().await;
    Ok(Json(json!({
        "success": true,
        "status": {
            "service": state.service_name,
            "database": if database_ok { "connected" } else { "unreachable" },
            "messenger": {
                "name": state.engine.messenger_name(),
                "configured": state.engine.messenger_configured(),
            },
            "scheduler": {
                "running": state.scheduler.is_running(),
                "next_run": state.scheduler.next_run(),
            },
        },
    })))
}

/// `POST /api/admin/test-sms` — immediate survey send to one pair,
/// bypassing the eligibility scan.
async fn admin_test_sms(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Json(req): Json<TestSmsRequest>,
) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.admin_token) {
        return Err(err);
    }

    let sid = state
        .scheduler
        .send_test_survey(req.user_id, req.campaign_id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "success": true,
        "message": "Test survey sent",
        "sid": sid,
    })))
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn responses_to_csv(rows: &[ResponseDetail]) -> String {
    let mut out = String::from(
        "ID,User Name,Phone Number,Campaign,Response Date,Joy Score,\
         Achievement Score,Meaningfulness Score,Free Text,Submitted At\n",
    );
    for r in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            r.id,
            csv_field(r.user_name.as_deref().unwrap_or("")),
            csv_field(&r.phone_number),
            csv_field(&r.campaign_name),
            csv_field(&r.response_date),
            r.joy_score,
            r.achievement_score,
            r.meaningfulness_score,
            csv_field(r.free_text.as_deref().unwrap_or("")),
            csv_field(&r.submitted_at),
        ));
    }
    out
}

/// `GET /api/admin/export/responses` — full response dump as JSON or CSV,
/// optionally scoped to one campaign.
async fn admin_export_responses(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    if let Some(err) = check_auth(&headers, &state.admin_token) {
        return Err(err);
    }

    let rows = state
        .store
        .export_responses(query.campaign_id)
        .await
        .map_err(error_response)?;

    if query.format.as_deref() == Some("csv") {
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=survey_responses.csv",
                ),
            ],
            responses_to_csv(&rows),
        )
            .into_response());
    }

    Ok(Json(json!({
        "success": true,
        "count": rows.len(),
        "exported_at": chrono::Utc::now().to_rfc3339(),
        "data": rows,
    }))
    .into_response())
}

/// `POST /api/admin/users/import` — bulk enrollment. Existing numbers are
/// skipped, malformed entries are reported but do not abort the batch.
async fn admin_import_users(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Json(req): Json<ImportUsersRequest>,
) -> ApiResult {
    if let Some(err) = check_auth(&headers, &state.admin_token) {
        return Err(err);
    }

    let mut imported = 0u64;
    let mut skipped = 0u64;
    let mut errors: Vec<String> = Vec::new();

    for (index, entry) in req.users.iter().enumerate() {
        let phone = match &entry.phone_number {
            Some(p) if is_valid_phone(p) => p,
            Some(p) => {
                errors.push(format!("entry {index}: invalid phone number {p}"));
                continue;
            }
            None => {
                errors.push(format!("entry {index}: missing phone_number"));
                continue;
            }
        };
        let timezone = entry.timezone.as_deref().unwrap_or("America/New_York");
        match state
            .store
            .import_user(phone, entry.name.as_deref(), timezone)
            .await
        {
            Ok(true) => imported += 1,
            Ok(false) => skipped += 1,
            Err(e) => errors.push(format!("entry {index}: {e}")),
        }
    }

    info!("user import: {imported} imported, {skipped} skipped, {} errors", errors.len());
    Ok(Json(json!({
        "success": true,
        "imported": imported,
        "skipped": skipped,
        "errors": errors,
    })))
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/dashboard", get(user_dashboard))
        .route("/api/campaigns", get(list_campaigns).post(create_campaign))
        .route("/api/campaigns/active/list", get(active_campaigns))
        .route(
            "/api/campaigns/{id}",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
        .route("/api/responses", get(list_responses).post(submit_response))
        .route("/api/responses/analytics/summary", get(response_analytics))
        .route("/api/responses/{id}", get(get_response))
        .route("/api/webhooks/twilio/sms-reply", post(sms_reply_webhook))
        .route("/api/webhooks/twilio/sms-status", post(sms_status_webhook))
        .route("/api/admin/dashboard", get(admin_dashboard))
        .route("/api/admin/status", get(admin_status))
        .route("/api/admin/test-sms", post(admin_test_sms))
        .route("/api/admin/users/import", post(admin_import_users))
        .route("/api/admin/export/responses", get(admin_export_responses))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Bind and serve until the server errors or the process shuts down.
pub async fn serve(state: ApiState, host: &str, port: u16) -> Result<(), PulseError> {
    let addr = format!("{host}:{port}");
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
