use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::challenge::store::ChallengeStore;
use crate::config::settings::Settings;
use crate::detection::bundle::Bundle;
use crate::detection::signal_evaluator::SignalEvaluator;
use crate::logging;
use crate::models::request::RequestHeaders;
use crate::models::verdict::Verdict;
use crate::tracker::visit_tracker::{TrackerStatus, VisitTracker};

use super::ip_extract::ClientIp;

/// Shared state handed to every `/api/*` handler.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<VisitTracker>,
    pub challenges: Arc<ChallengeStore>,
    pub signal_evaluator: Arc<SignalEvaluator>,
    pub settings: Arc<Settings>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    #[serde(rename = "challengeId")]
    challenge_id: String,
    challenge: String,
    #[serde(rename = "timingChallenge")]
    timing_challenge: i64,
}

/// GET /api/challenge (spec §6.1).
pub async fn get_challenge(State(state): State<AppState>) -> Json<ChallengeResponse> {
    let issued = state.challenges.issue();
    Json(ChallengeResponse {
        challenge_id: issued.id,
        challenge: issued.challenge,
        timing_challenge: issued.timing_challenge,
    })
}

#[derive(Debug, Deserialize)]
pub struct VerifyChallengeRequest {
    #[serde(rename = "challengeId")]
    challenge_id: String,
    answer: i64,
    #[serde(rename = "timingProof")]
    timing_proof: i64,
    #[serde(rename = "executionTime")]
    execution_time: i64,
}

#[derive(Debug, Serialize)]
pub struct VerifyChallengeResponse {
    valid: bool,
    #[serde(rename = "timingValid")]
    timing_valid: bool,
    #[serde(rename = "executionTime")]
    execution_time: i64,
    #[serde(rename = "solveTime")]
    solve_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// POST /api/challenge/verify (spec §4.3, §6.1).
pub async fn verify_challenge(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Json(req): Json<VerifyChallengeRequest>,
) -> Json<VerifyChallengeResponse> {
    let result = state.challenges.verify(
        &req.challenge_id,
        req.answer,
        req.timing_proof,
        req.execution_time,
    );
    logging::log_challenge_verify(&ip, &result);
    Json(VerifyChallengeResponse {
        valid: result.valid,
        timing_valid: result.timing_valid,
        execution_time: result.execution_time,
        solve_time: result.solve_time_ms,
        reason: result.reason,
    })
}

/// POST /api/visit: arbitrary client-metrics JSON, logged and acknowledged
/// with no further processing (spec §4.5, §6.1).
pub async fn post_visit(
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Json(_metrics): Json<Value>,
) -> StatusCode {
    logging::log_visit(&ip);
    StatusCode::NO_CONTENT
}

/// POST /api/bot: the §4.2 early-reject path, or a full Signal Evaluator
/// pass, always ending the session (spec §4.5).
pub async fn post_bot(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Extension(headers): Extension<RequestHeaders>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.tracker.mark_analysis_requested(&ip);

    let bundle = Bundle::new(body);
    let verdict = if SignalEvaluator::needs_early_reject(&bundle) {
        SignalEvaluator::early_reject_verdict()
    } else {
        state.signal_evaluator.evaluate(&bundle, &headers)
    };

    state.tracker.complete(&ip, verdict.clone());
    logging::log_bot_analysis(&ip, &verdict);

    Json(verdict)
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum VisitStatusResponse {
    Verdict(Verdict),
    Plain {
        verdict: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<u32>,
    },
}

/// GET /api/visit-status (spec §4.4, §6.1).
pub async fn get_visit_status(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
) -> Json<VisitStatusResponse> {
    let response = match state.tracker.status(&ip) {
        TrackerStatus::Verdict(verdict) => {
            logging::log_visit_status(&ip, verdict.verdict.as_str());
            VisitStatusResponse::Verdict(verdict)
        }
        TrackerStatus::PendingAnalysis => {
            logging::log_visit_status(&ip, "pending-analysis");
            VisitStatusResponse::Plain {
                verdict: "pending-analysis",
                reason: None,
                code: None,
            }
        }
        TrackerStatus::TimedOutUnflushed => {
            logging::log_visit_status(&ip, "bot");
            VisitStatusResponse::Plain {
                verdict: "bot",
                reason: Some("Never called /api/bot - no JS execution".to_string()),
                code: Some(1006),
            }
        }
        TrackerStatus::Pending { remaining_secs } => {
            logging::log_visit_status(&ip, "pending");
            VisitStatusResponse::Plain {
                verdict: "pending",
                reason: Some(format!("{:.0}s remaining", remaining_secs.max(0.0))),
                code: None,
            }
        }
        TrackerStatus::NoSession => {
            logging::log_visit_status(&ip, "no-session");
            VisitStatusResponse::Plain {
                verdict: "no-session",
                reason: None,
                code: None,
            }
        }
    };
    Json(response)
}
