use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use tracing::debug;

use crate::config::settings::ChallengeConfig;

/// A challenge issued to a client, returned verbatim by `/api/challenge`.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub id: String,
    pub challenge: String,
    pub timing_challenge: i64,
}

/// Outcome of redeeming a challenge id, returned by `/api/challenge/verify`.
#[derive(Debug, Clone)]
pub struct VerifyResult {
    pub valid: bool,
    pub timing_valid: bool,
    pub execution_time: i64,
    pub solve_time_ms: i64,
    pub reason: Option<String>,
}

struct StoredChallenge {
    expected_answer: i64,
    issued_at_instant: Instant,
    issued_at_epoch_ms: i64,
}

enum Op {
    Add,
    Sub,
    Mul,
}

impl Op {
    fn pick(rng: &mut impl Rng) -> Self {
        match rng.random_range(0..3) {
            0 => Op::Add,
            1 => Op::Sub,
            _ => Op::Mul,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
        }
    }

    fn apply(&self, a: i64, b: i64) -> i64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
        }
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 13;

/// Issues, retains, and redeems short-lived arithmetic "proof of execution"
/// challenges (spec §4.3). Entries are single-use: `verify` removes the id
/// whether or not the answer was correct.
pub struct ChallengeStore {
    challenges: DashMap<String, StoredChallenge>,
    ttl: Duration,
    timing_tolerance_ms: i64,
    max_execution_time_ms: i64,
}

impl ChallengeStore {
    pub fn new(config: &ChallengeConfig) -> Self {
        Self {
            challenges: DashMap::new(),
            ttl: Duration::from_secs(config.ttl_secs),
            timing_tolerance_ms: config.timing_tolerance_ms,
            max_execution_time_ms: config.max_execution_time_ms,
        }
    }

    pub fn issue(&self) -> IssuedChallenge {
        self.sweep_expired();

        let mut rng = rand::rng();
        let a = rng.random_range(0..100);
        let b = rng.random_range(0..100);
        let op = Op::pick(&mut rng);
        let expected_answer = op.apply(a, b);

        let id = random_id(&mut rng);
        let issued_at_epoch_ms = Utc::now().timestamp_millis();

        self.challenges.insert(
            id.clone(),
            StoredChallenge {
                expected_answer,
                issued_at_instant: Instant::now(),
                issued_at_epoch_ms,
            },
        );

        IssuedChallenge {
            id,
            challenge: format!("(function(){{return {} {} {};}})()", a, op.symbol(), b),
            timing_challenge: issued_at_epoch_ms,
        }
    }

    pub fn verify(
        &self,
        challenge_id: &str,
        answer: i64,
        timing_proof: i64,
        execution_time: i64,
    ) -> VerifyResult {
        let entry = self.challenges.remove(challenge_id).map(|(_, v)| v);

        let stored = match entry {
            Some(s) if s.issued_at_instant.elapsed() <= self.ttl => s,
            Some(_) => {
                debug!(id = challenge_id, "challenge expired before verify");
                return Self::not_found_result(execution_time);
            }
            None => {
                debug!(id = challenge_id, "unknown challenge id");
                return Self::not_found_result(execution_time);
            }
        };

        let valid = answer == stored.expected_answer;
        let solve_time_ms = stored.issued_at_instant.elapsed().as_millis() as i64;

        let timing_proof_matches =
            (timing_proof - stored.issued_at_epoch_ms).abs() <= self.timing_tolerance_ms;
        let execution_time_plausible = execution_time > 0 && execution_time < self.max_execution_time_ms;
        let timing_valid = timing_proof_matches && execution_time_plausible;

        VerifyResult {
            valid,
            timing_valid,
            execution_time,
            solve_time_ms,
            reason: None,
        }
    }

    fn not_found_result(execution_time: i64) -> VerifyResult {
        VerifyResult {
            valid: false,
            timing_valid: false,
            execution_time,
            solve_time_ms: 0,
            reason: Some("Challenge not found or expired".to_string()),
        }
    }

    /// Opportunistic sweep of entries older than the TTL, run on each issue
    /// per spec §4.3's GC policy.
    fn sweep_expired(&self) {
        let ttl = self.ttl;
        self.challenges.retain(|_, v| v.issued_at_instant.elapsed() <= ttl);
    }
}

fn random_id(rng: &mut impl Rng) -> String {
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChallengeConfig {
        ChallengeConfig {
            ttl_secs: 60,
            timing_tolerance_ms: 1000,
            max_execution_time_ms: 5000,
        }
    }

    /// Scenario 3 from spec §8: challenge happy path.
    #[test]
    fn correct_answer_within_timing_window_is_valid() {
        let store = ChallengeStore::new(&test_config());
        let issued = store.issue();
        let expected = store.challenges.get(&issued.id).unwrap().expected_answer;

        let result = store.verify(&issued.id, expected, issued.timing_challenge, 15);
        assert!(result.valid);
        assert!(result.timing_valid);
    }

    #[test]
    fn wrong_answer_is_invalid_but_still_consumes_the_id() {
        let store = ChallengeStore::new(&test_config());
        let issued = store.issue();
        let result = store.verify(&issued.id, i64::MIN, issued.timing_challenge, 15);
        assert!(!result.valid);
        let second = store.verify(&issued.id, i64::MIN, issued.timing_challenge, 15);
        assert_eq!(second.reason.as_deref(), Some("Challenge not found or expired"));
    }

    #[test]
    fn verify_is_single_use() {
        let store = ChallengeStore::new(&test_config());
        let issued = store.issue();
        let _ = store.verify(&issued.id, 0, issued.timing_challenge, 15);
        let second = store.verify(&issued.id, 0, issued.timing_challenge, 15);
        assert!(!second.valid);
        assert_eq!(second.reason.as_deref(), Some("Challenge not found or expired"));
    }

    #[test]
    fn unknown_id_reports_not_found() {
        let store = ChallengeStore::new(&test_config());
        let result = store.verify("does-not-exist", 1, 0, 15);
        assert!(!result.valid);
        assert!(!result.timing_valid);
        assert_eq!(result.reason.as_deref(), Some("Challenge not found or expired"));
    }

    #[test]
    fn timing_proof_outside_tolerance_is_not_timing_valid() {
        let store = ChallengeStore::new(&test_config());
        let issued = store.issue();
        let result = store.verify(&issued.id, 0, issued.timing_challenge - 5000, 15);
        assert!(!result.timing_valid);
    }

    #[test]
    fn expression_is_parenthesised_iife_text() {
        let store = ChallengeStore::new(&test_config());
        let issued = store.issue();
        assert!(issued.challenge.starts_with("(function(){return "));
        assert!(issued.challenge.ends_with(";})()"));
    }
}
