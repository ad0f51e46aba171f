use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::challenge::store::ChallengeStore;
use crate::config::settings::Settings;
use crate::detection::signal_evaluator::SignalEvaluator;
use crate::tracker::visit_tracker::VisitTracker;

use super::middleware as classify_mw;
use super::routes::{self, AppState};

/// The bot-detection HTTP surface (spec §4.5, §6.1).
///
/// Generalizes the teacher's `AdminApiServer` bootstrap shape: build an
/// `AppState`, assemble a `Router`, bind, serve until shutdown.
pub struct BotDetectionServer {
    state: AppState,
    bind_addr: SocketAddr,
}

impl BotDetectionServer {
    pub fn new(
        settings: Arc<Settings>,
        tracker: Arc<VisitTracker>,
        challenges: Arc<ChallengeStore>,
        signal_evaluator: Arc<SignalEvaluator>,
        bind_addr: SocketAddr,
    ) -> Self {
        let state = AppState {
            tracker,
            challenges,
            signal_evaluator,
            settings,
        };
        Self { state, bind_addr }
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let static_dir = self.state.settings.server.static_dir.clone();
        let index_path = format!("{}/index.html", static_dir);
        let serve_dir = ServeDir::new(&static_dir).fallback(ServeFile::new(index_path));

        let max_body_bytes = self.state.settings.http.max_body_bytes;

        let app = Router::new()
            .route("/api/challenge", get(routes::get_challenge))
            .route("/api/challenge/verify", post(routes::verify_challenge))
            .route("/api/visit", post(routes::post_visit))
            .route("/api/bot", post(routes::post_bot))
            .route("/api/visit-status", get(routes::get_visit_status))
            .fallback_service(serve_dir)
            .layer(
                ServiceBuilder::new()
                    .layer(DefaultBodyLimit::max(max_body_bytes))
                    .layer(middleware::from_fn_with_state(
                        self.state.clone(),
                        classify_mw::classify,
                    )),
            )
            .with_state(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        info!("Bot-detection server listening on {}", self.bind_addr);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }
}
