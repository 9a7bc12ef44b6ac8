//! `analyze` 서브커맨드.
//!
//! 어댑터를 조립해 파이프라인을 실행하고 결과를 내보낸다.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use frameprompt_core::config::AppConfig;
use frameprompt_core::error::CoreError;
use frameprompt_core::models::run::PipelineRun;
use frameprompt_network::image_gen_client::ImageGenClient;
use frameprompt_network::prompt_client::PromptClient;
use frameprompt_network::relay_client::RelayClient;
use frameprompt_network::translation::TranslationAssist;
use frameprompt_pipeline::runner::PipelineRunner;
use frameprompt_pipeline::session::Session;
use frameprompt_vision::ffmpeg_source::FfmpegVideoSource;
use frameprompt_vision::image_set::load_image_set;
use frameprompt_vision::sampler::FrameSampler;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::lifecycle::LifecycleManager;
use crate::report;

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// 분석할 비디오 파일
    #[arg(conflicts_with = "images", required_unless_present = "images")]
    pub video: Option<PathBuf>,

    /// 비디오 대신 분석할 이미지 파일들
    #[arg(long, num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// 샘플링 간격 (초, 기본: 설정값)
    #[arg(long, short = 'i')]
    pub interval: Option<f64>,

    /// 설명 후 모든 항목에 대해 이미지 생성
    #[arg(long, short = 'g')]
    pub generate: bool,

    /// 설명 번역
    #[arg(long, short = 't')]
    pub translate: bool,

    /// 결과 출력 디렉토리
    #[arg(long, short = 'o', default_value = "frameprompt-output")]
    pub output: PathBuf,

    /// 결과 파일을 쓰지 않음
    #[arg(long)]
    pub no_export: bool,

    /// 릴레이 URL (기본: 설정값)
    #[arg(long)]
    pub relay_url: Option<String>,
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

/// 설정으로 파이프라인 실행기 조립
fn build_runner(config: &AppConfig, relay: RelayClient) -> PipelineRunner {
    let session = Session::shared(config.api.clone());
    PipelineRunner::new(
        session,
        Arc::new(PromptClient::new(relay.clone())),
        Arc::new(ImageGenClient::new(relay.clone())),
        Arc::new(TranslationAssist::new(relay)),
    )
    .with_sampler(FrameSampler::from_config(&config.sampling))
}

pub async fn run(config: AppConfig, args: AnalyzeArgs) -> Result<()> {
    let relay_url = args
        .relay_url
        .clone()
        .unwrap_or_else(|| config.relay.url.clone());
    let interval_ms = args
        .interval
        .map(secs_to_ms)
        .unwrap_or_else(|| config.sampling.interval_ms());

    let relay = RelayClient::new(&relay_url)?;
    let runner = build_runner(&config, relay);
    info!(relay = %relay_url, interval_ms, "분석 시작");

    let progress = tokio::spawn(log_progress(runner.subscribe()));
    let lifecycle = LifecycleManager::new();

    let outcome = tokio::select! {
        result = process(&runner, &args, interval_ms) => result,
        _ = lifecycle.wait_for_signal() => {
            runner.clear();
            Err(anyhow!("사용자 요청으로 분석 중단"))
        }
    };
    progress.abort();
    if let Err(e) = &outcome {
        eprintln!("{}", failure_message(e));
    }
    outcome?;

    print_items(&runner);

    if !args.no_export {
        let http = reqwest::Client::new();
        let report = report::export(&runner.session(), &http, &args.output).await?;
        println!(
            "결과 저장: {} ({}개 항목)",
            args.output.display(),
            report.item_count
        );
    }
    Ok(())
}

/// 실패 원인 안내 문구
///
/// 배치를 중단시키는 에러(설정 누락, 샘플링 실패)는 원인을 그대로 보여주고,
/// 그 밖의 에러는 재시도를 안내한다.
fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<CoreError>() {
        Some(core) if core.is_batch_fatal() => format!("분석 중단: {core}"),
        Some(core) => format!("분석 실패 (다시 시도해 보세요): {core}"),
        None => format!("분석 실패: {err}"),
    }
}

async fn process(runner: &PipelineRunner, args: &AnalyzeArgs, interval_ms: u64) -> Result<()> {
    let described = if args.images.is_empty() {
        let path = args
            .video
            .as_ref()
            .ok_or_else(|| anyhow!("비디오 파일 또는 --images를 지정하세요"))?;
        let mut source = FfmpegVideoSource::open(path).await?;
        runner.analyze_video(&mut source, interval_ms).await?
    } else {
        let images = load_image_set(&args.images).await?;
        runner.analyze_images(images).await?
    };
    println!(
        "설명 완료: {}/{} 성공, {} 실패",
        described.ready, described.total, described.failed
    );

    if args.generate {
        let generated = runner.run_generate_all().await?;
        println!(
            "이미지 생성 완료: {}개 생성 (대체 이미지 {}개), {}개 건너뜀",
            generated.produced, generated.fallbacks, generated.skipped
        );
    }

    if args.translate {
        for item_id in 0..described.total {
            let usable = runner
                .session()
                .lock()
                .item(item_id)
                .map(|item| item.usable_description().is_some())
                .unwrap_or(false);
            if !usable {
                continue;
            }
            if let Err(e) = runner.translate_one(item_id).await {
                warn!(item_id, "번역 건너뜀: {e}");
            }
        }
    }
    Ok(())
}

async fn log_progress(mut rx: watch::Receiver<PipelineRun>) {
    while rx.changed().await.is_ok() {
        let run = rx.borrow_and_update().clone();
        info!(
            phase = ?run.phase,
            done = run.completed_count,
            total = run.total_items,
            "진행률 {}%",
            run.progress_percent
        );
    }
}

fn print_items(runner: &PipelineRunner) {
    let session = runner.session();
    let session = session.lock();
    let Ok(batch) = session.batch() else {
        return;
    };
    for item in &batch.items {
        println!(
            "[{}] {:?} {}",
            item.id + 1,
            item.description_state,
            item.description.as_deref().unwrap_or_default()
        );
        if let Some(translation) = &item.translation {
            println!("    번역: {translation}");
        }
        if let Some(image) = &item.generated_image {
            if !image.is_fallback() {
                println!("    이미지: {}", image.uri());
            }
        }
    }
}
