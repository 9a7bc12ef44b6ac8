//! # frameprompt-relay
//!
//! AI API 릴레이 서버.
//! Axum 기반으로 클라이언트 요청을 받아 업스트림 제공자에 전달한다.
//!
//! ## 엔드포인트
//! - `POST /api/chat/completions`: 채팅 완성 (프레임 설명, 번역)
//! - `POST /api/images/generations`: 이미지 생성
//! - `GET /health`: 헬스 체크

pub mod error;
pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use frameprompt_core::config::RelayConfig;
use frameprompt_core::error::CoreError;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// 요청 본문 최대 크기 (데이터 URI 이미지 포함)
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// 릴레이 애플리케이션 상태
#[derive(Clone)]
pub struct RelayState {
    /// 업스트림 HTTP 클라이언트
    pub http: reqwest::Client,
    /// 업스트림 기본 URL (끝 `/` 제거)
    pub upstream_base_url: String,
}

impl RelayState {
    /// 새 상태 생성
    pub fn new(upstream_base_url: &str) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;
        Ok(Self {
            http,
            upstream_base_url: upstream_base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// 릴레이 라우터 구성
pub fn router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat/completions", post(handlers::chat_completions))
        .route("/api/images/generations", post(handlers::image_generations))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 릴레이 서버
pub struct RelayServer {
    config: RelayConfig,
    state: RelayState,
}

impl RelayServer {
    /// 설정으로 서버 생성
    pub fn new(config: RelayConfig) -> Result<Self, CoreError> {
        let state = RelayState::new(&config.upstream_base_url)?;
        Ok(Self { config, state })
    }

    /// 바인드 주소
    pub fn bind_addr(&self) -> SocketAddr {
        let host = if self.config.allow_external {
            [0, 0, 0, 0]
        } else {
            [127, 0, 0, 1]
        };
        SocketAddr::from((host, self.config.port))
    }

    /// 서버 실행
    ///
    /// 클라이언트가 고정 URL로 접속하므로 다른 포트로 바꿔 시도하지 않는다.
    ///
    /// # Arguments
    /// * `shutdown_rx` - 종료 신호 수신 채널
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let addr = self.bind_addr();
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_rx).await
    }

    /// 이미 바인드된 리스너로 서버 실행
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        info!(
            upstream = %self.state.upstream_base_url,
            "릴레이 서버 시작: http://{}", addr
        );

        let app = router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("릴레이 서버 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("릴레이 서버 종료");
        Ok(())
    }
}
