use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::challenge::store::VerifyResult;
use crate::models::verdict::Verdict;

/// Emits the six tag-prefixed, structured JSON-line events the core is
/// contractually required to produce (spec §6.3), independent of whatever
/// the `tracing` subscriber is configured to do with internal diagnostics.
///
/// Mirrors the teacher's `AccessLogger`: one JSON object per line, written
/// directly rather than routed through a generic logging framework — except
/// the sink here is stdout, since the spec treats log collection itself as
/// an external collaborator.
///
/// `ip` is a string rather than `IpAddr` because the client-IP contract
/// (spec §4.5) allows the literal `"unknown"` when neither a forwarded
/// header nor a socket peer is available.
fn emit(tag: &str, ip: &str, mut fields: Value) {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Value::Object(ref mut map) = fields {
        map.insert("timestamp".to_string(), json!(timestamp));
        map.insert("ip".to_string(), json!(ip));
    }
    println!("[{}] {}", tag, fields);
}

pub fn log_header_analysis(ip: &str, verdict: &str) {
    emit("header-analysis", ip, json!({ "verdict": verdict }));
}

pub fn log_header_analysis_verdict(ip: &str, verdict: &Verdict) {
    emit(
        "header-analysis",
        ip,
        json!({ "verdict": verdict.verdict, "score": verdict.score }),
    );
}

pub fn log_challenge_verify(ip: &str, result: &VerifyResult) {
    emit(
        "challenge-verify",
        ip,
        json!({
            "valid": result.valid,
            "timingValid": result.timing_valid,
            "solveTime": result.solve_time_ms,
        }),
    );
}

pub fn log_visit(ip: &str) {
    emit("visit", ip, json!({}));
}

pub fn log_bot_analysis(ip: &str, verdict: &Verdict) {
    emit(
        "bot-analysis",
        ip,
        json!({
            "verdict": verdict.verdict,
            "score": verdict.score,
            "code": verdict.code,
        }),
    );
}

pub fn log_bot_verdict(ip: &str, verdict: &Verdict) {
    emit(
        "bot-verdict",
        ip,
        json!({
            "verdict": verdict.verdict,
            "code": verdict.code,
            "reason": verdict.reason,
        }),
    );
}

pub fn log_visit_status(ip: &str, verdict: &str) {
    emit("visit-status", ip, json!({ "verdict": verdict }));
}
