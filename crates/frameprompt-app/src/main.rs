//! # frameprompt
//!
//! 비디오 프레임 → AI 프롬프트 → 이미지 생성 CLI 진입점.
//! 설정 로드, 로깅 초기화, 서브커맨드 분기를 담당한다.

mod analyze;
mod lifecycle;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use frameprompt_core::config::AppConfig;
use frameprompt_core::config_manager::ConfigManager;
use frameprompt_relay::RelayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::analyze::AnalyzeArgs;
use crate::lifecycle::LifecycleManager;

/// frameprompt: 비디오 프레임에서 이미지 생성 프롬프트 추출
#[derive(Parser, Debug)]
#[command(name = "frameprompt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼별 설정 디렉토리)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 비디오 또는 이미지 세트 분석
    Analyze(AnalyzeArgs),
    /// AI API 릴레이 서버 실행
    Relay(RelayArgs),
    /// 설정 확인/변경
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct RelayArgs {
    /// 포트 (기본: 설정값)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 업스트림 제공자 기본 URL
    #[arg(long)]
    upstream: Option<String>,

    /// 외부 접근 허용 (0.0.0.0 바인드)
    #[arg(long)]
    allow_external: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 설정 파일 경로와 현재 설정 출력 (API 키는 마스킹)
    Show,
    /// 설정 필드 변경 후 저장
    Set(ConfigSetArgs),
}

#[derive(clap::Args, Debug, Default)]
struct ConfigSetArgs {
    #[arg(long)]
    description_endpoint: Option<String>,
    #[arg(long)]
    description_api_key: Option<String>,
    #[arg(long)]
    description_model_id: Option<String>,
    #[arg(long)]
    prompt_template: Option<String>,
    #[arg(long)]
    image_endpoint: Option<String>,
    #[arg(long)]
    image_api_key: Option<String>,
    #[arg(long)]
    image_model_id: Option<String>,
    /// 클라이언트가 호출할 릴레이 URL
    #[arg(long)]
    relay_url: Option<String>,
    /// 릴레이 서버의 업스트림 URL
    #[arg(long)]
    upstream: Option<String>,
    /// 기본 샘플링 간격 (초)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,
}

impl ConfigSetArgs {
    fn apply(self, config: &mut AppConfig) {
        let api = &mut config.api;
        let fields = [
            (self.description_endpoint, &mut api.description_endpoint),
            (self.description_api_key, &mut api.description_api_key),
            (self.description_model_id, &mut api.description_model_id),
            (self.prompt_template, &mut api.prompt_template),
            (self.image_endpoint, &mut api.image_endpoint),
            (self.image_api_key, &mut api.image_api_key),
            (self.image_model_id, &mut api.image_model_id),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(url) = self.relay_url {
            config.relay.url = url;
        }
        if let Some(upstream) = self.upstream {
            config.relay.upstream_base_url = upstream;
        }
        if let Some(secs) = self.interval {
            config.sampling.interval_secs = secs;
        }
    }
}

/// API 키 마스킹 (앞 4자만 표시)
fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{head}****")
}

fn masked(mut config: AppConfig) -> AppConfig {
    config.api.description_api_key = mask_secret(&config.api.description_api_key);
    config.api.image_api_key = mask_secret(&config.api.image_api_key);
    config
}

fn init_tracing(level: &str) {
    let log_filter = [
        "frameprompt",
        "frameprompt_app",
        "frameprompt_core",
        "frameprompt_vision",
        "frameprompt_network",
        "frameprompt_relay",
        "frameprompt_pipeline",
        "tower_http",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect::<Vec<_>>()
    .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config_manager = match args.config {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    info!(path = %config_manager.config_path().display(), "설정 로드");

    match args.command {
        Command::Analyze(analyze_args) => analyze::run(config_manager.get(), analyze_args).await,
        Command::Relay(relay_args) => run_relay(config_manager.get(), relay_args).await,
        Command::Config { action } => run_config(&config_manager, action),
    }
}

// ============================================================
// 서브커맨드
// ============================================================

async fn run_relay(mut config: AppConfig, args: RelayArgs) -> Result<()> {
    if let Some(port) = args.port {
        config.relay.port = port;
    }
    if let Some(upstream) = args.upstream {
        config.relay.upstream_base_url = upstream;
    }
    config.relay.allow_external |= args.allow_external;

    let server = RelayServer::new(config.relay)?;
    println!("릴레이 서버: http://{}", server.bind_addr());

    let lifecycle = LifecycleManager::new();
    let mut server_task = tokio::spawn(server.run(lifecycle.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        _ = lifecycle.wait_for_signal() => {}
    }

    server_task.await??;
    Ok(())
}

fn run_config(manager: &ConfigManager, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("설정 파일: {}", manager.config_path().display());
            println!("{}", serde_json::to_string_pretty(&masked(manager.get()))?);
        }
        ConfigAction::Set(set) => {
            let updated = manager.update_with(|config| set.apply(config))?;
            println!("설정 저장 완료: {}", manager.config_path().display());
            println!("{}", serde_json::to_string_pretty(&masked(updated))?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_analyze_video() {
        let args = Args::try_parse_from([
            "frameprompt",
            "analyze",
            "clip.mp4",
            "--interval",
            "2",
            "--generate",
        ])
        .unwrap();
        match args.command {
            Command::Analyze(a) => {
                assert_eq!(a.video, Some(PathBuf::from("clip.mp4")));
                assert_eq!(a.interval, Some(2.0));
                assert!(a.generate);
                assert!(!a.translate);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_video_and_images_together() {
        let result = Args::try_parse_from([
            "frameprompt",
            "analyze",
            "clip.mp4",
            "--images",
            "a.png",
        ]);
        assert!(result.is_err());
        assert!(Args::try_parse_from(["frameprompt", "analyze"]).is_err());
    }

    #[test]
    fn config_set_rejects_zero_interval() {
        assert!(Args::try_parse_from(["frameprompt", "config", "set", "--interval", "0"]).is_err());
    }

    #[test]
    fn config_set_applies_only_given_fields() {
        let mut config = AppConfig::default();
        config.api.description_model_id = "old-model".to_string();

        ConfigSetArgs {
            description_api_key: Some("sk-123456".to_string()),
            interval: Some(5),
            ..ConfigSetArgs::default()
        }
        .apply(&mut config);

        assert_eq!(config.api.description_api_key, "sk-123456");
        assert_eq!(config.api.description_model_id, "old-model");
        assert_eq!(config.sampling.interval_secs, 5);
        assert_eq!(config.relay.port, 3001);
    }

    #[test]
    fn secrets_are_masked() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("sk-abcdef"), "sk-a****");

        let mut config = AppConfig::default();
        config.api.image_api_key = "img-secret".to_string();
        let shown = masked(config);
        assert_eq!(shown.api.image_api_key, "img-****");
        assert_eq!(shown.api.description_api_key, "");
    }
}
