use super::settings::{ChallengeConfig, HttpConfig, LoggingConfig, ServerConfig, TrackerConfig};

pub fn default_server_config() -> ServerConfig {
    ServerConfig {
        port: default_port(),
        static_dir: default_static_dir(),
    }
}

pub fn default_port() -> u16 {
    4173
}

pub fn default_static_dir() -> String {
    "./dist".to_string()
}

pub fn default_tracker_config() -> TrackerConfig {
    TrackerConfig {
        session_deadline_ms: default_session_deadline_ms(),
        session_ttl_secs: default_session_ttl_secs(),
    }
}

pub fn default_session_deadline_ms() -> u64 {
    5_000
}

pub fn default_session_ttl_secs() -> u64 {
    60
}

pub fn default_challenge_config() -> ChallengeConfig {
    ChallengeConfig {
        ttl_secs: default_challenge_ttl_secs(),
        timing_tolerance_ms: default_timing_tolerance_ms(),
        max_execution_time_ms: default_max_execution_time_ms(),
    }
}

pub fn default_challenge_ttl_secs() -> u64 {
    60
}

pub fn default_timing_tolerance_ms() -> i64 {
    1_000
}

pub fn default_max_execution_time_ms() -> i64 {
    5_000
}

pub fn default_http_config() -> HttpConfig {
    HttpConfig {
        max_body_bytes: default_max_body_bytes(),
    }
}

pub fn default_max_body_bytes() -> usize {
    1024 * 1024
}

pub fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
    }
}

pub fn default_log_level() -> String {
    "info".to_string()
}
