//! 릴레이 서버 + 파이프라인 통합 테스트.
//!
//! 실제 릴레이 서버를 임시 포트에 띄우고 업스트림 제공자는 mockito로 대체한다.
//! 클라이언트 → 릴레이 → 업스트림 전체 경로를 검증.

use std::sync::Arc;
use std::time::Duration;

use frameprompt_core::config::{ApiConfig, RelayConfig};
use frameprompt_core::error::CoreError;
use frameprompt_core::models::description::ERROR_MARKER;
use frameprompt_core::models::frame::RawFrame;
use frameprompt_core::models::image::ImageHandle;
use frameprompt_core::models::item::{DescriptionState, GeneratedImage, GenerationState};
use frameprompt_network::image_gen_client::ImageGenClient;
use frameprompt_network::prompt_client::PromptClient;
use frameprompt_network::relay_client::RelayClient;
use frameprompt_network::translation::TranslationAssist;
use frameprompt_pipeline::runner::PipelineRunner;
use frameprompt_pipeline::session::Session;
use frameprompt_relay::RelayServer;
use frameprompt_vision::encoder::encode_frame;
use mockito::Matcher;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct RunningRelay {
    url: String,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningRelay {
    async fn start(upstream: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = RelayServer::new(RelayConfig {
            upstream_base_url: upstream.to_string(),
            ..RelayConfig::default()
        })
        .unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(server.serve(listener, shutdown_rx));
        Self {
            url: format!("http://{addr}"),
            shutdown_tx,
            handle,
        }
    }

    async fn stop(self) {
        self.shutdown_tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}

fn config() -> ApiConfig {
    ApiConfig {
        description_api_key: "desc-key".to_string(),
        description_model_id: "vision-model".to_string(),
        image_api_key: "img-key".to_string(),
        image_model_id: "gen-model".to_string(),
        ..ApiConfig::default()
    }
}

fn runner(relay_url: &str, config: ApiConfig) -> PipelineRunner {
    let relay = RelayClient::new(relay_url).unwrap();
    PipelineRunner::new(
        Session::shared(config),
        Arc::new(PromptClient::new(relay.clone())),
        Arc::new(ImageGenClient::new(relay.clone())),
        Arc::new(TranslationAssist::new(relay)),
    )
}

fn frames(n: u64) -> Vec<ImageHandle> {
    (0..n)
        .map(|i| {
            let frame = RawFrame::solid(8, 8, [200, 40, 40], Duration::from_secs(i * 3));
            encode_frame(&frame, 80).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn describe_generate_translate_through_relay() {
    let mut upstream = mockito::Server::new_async().await;
    let describe = upstream
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer desc-key")
        .match_body(Matcher::Regex("image_url".to_string()))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"红色蛋糕，专业美食摄影"}}]}"#)
        .expect(2)
        .create_async()
        .await;
    let translate = upstream
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("翻译成英文".to_string()))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"red cake, food photography"}}]}"#)
        .expect(1)
        .create_async()
        .await;
    let generate = upstream
        .mock("POST", "/images/generations")
        .match_header("authorization", "Bearer img-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(serde_json::json!({
                "model": "gen-model",
                "prompt": "红色蛋糕，专业美食摄影",
                "size": "2K"
            })),
            Matcher::Regex(r#""image":"data:image/jpeg;base64,"#.to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"data":[{"url":"https://cdn.example/out.png"}]}"#)
        .expect(2)
        .create_async()
        .await;

    let relay = RunningRelay::start(&upstream.url()).await;
    let runner = runner(&relay.url, config());

    let described = runner.analyze_images(frames(2)).await.unwrap();
    assert_eq!(described.ready, 2);

    let generated = runner.run_generate_all().await.unwrap();
    assert_eq!(generated.produced, 2);
    assert_eq!(generated.fallbacks, 0);

    let translated = runner.translate_one(0).await.unwrap();
    assert_eq!(translated, "red cake, food photography");

    {
        let session = runner.session();
        let session = session.lock();
        let batch = session.batch().unwrap();
        for item in &batch.items {
            assert_eq!(item.description_state, DescriptionState::Ready);
            assert_eq!(item.generation_state, GenerationState::Ready);
            assert_eq!(
                item.generated_image,
                Some(GeneratedImage::Remote {
                    url: "https://cdn.example/out.png".to_string()
                })
            );
            assert_eq!(item.source_image.active_leases(), 0);
        }
        assert_eq!(
            batch.items[0].translation.as_deref(),
            Some("red cake, food photography")
        );
        assert!(batch.items[1].translation.is_none());
    }
    assert_eq!(runner.progress().progress_percent, 100);

    describe.assert_async().await;
    translate.assert_async().await;
    generate.assert_async().await;
    relay.stop().await;
}

#[tokio::test]
async fn upstream_errors_become_placeholders_and_fallbacks() {
    let mut upstream = mockito::Server::new_async().await;
    let describe = upstream
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"草莓蛋糕"}}]}"#)
        .expect(1)
        .create_async()
        .await;
    let generate = upstream
        .mock("POST", "/images/generations")
        .with_status(503)
        .with_body("overloaded")
        .expect(1)
        .create_async()
        .await;

    let relay = RunningRelay::start(&upstream.url()).await;
    let runner = runner(&relay.url, config());

    runner.analyze_images(frames(1)).await.unwrap();
    let generated = runner.run_generate_all().await.unwrap();

    assert_eq!(generated.produced, 1);
    assert_eq!(generated.fallbacks, 1);
    {
        let session = runner.session();
        let session = session.lock();
        let item = session.item(0).unwrap();
        assert_eq!(item.generation_state, GenerationState::Failed);
        let image = item.generated_image.as_ref().unwrap();
        assert!(image.is_fallback());
        assert!(image.uri().starts_with("data:image/svg+xml;base64,"));
    }

    describe.assert_async().await;
    generate.assert_async().await;
    relay.stop().await;
}

#[tokio::test]
async fn describe_failure_marks_item_and_skips_generation() {
    let mut upstream = mockito::Server::new_async().await;
    let describe = upstream
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("boom")
        .expect(1)
        .create_async()
        .await;
    let generate = upstream
        .mock("POST", "/images/generations")
        .expect(0)
        .create_async()
        .await;

    let relay = RunningRelay::start(&upstream.url()).await;
    let runner = runner(&relay.url, config());

    let described = runner.analyze_images(frames(1)).await.unwrap();
    assert_eq!(described.failed, 1);

    let generated = runner.run_generate_all().await.unwrap();
    assert_eq!(generated.skipped, 1);
    {
        let session = runner.session();
        let session = session.lock();
        let item = session.item(0).unwrap();
        assert_eq!(item.description_state, DescriptionState::Failed);
        assert!(item.description.as_deref().unwrap().contains(ERROR_MARKER));
        assert!(item.generated_image.is_none());
    }

    describe.assert_async().await;
    generate.assert_async().await;
    relay.stop().await;
}

#[tokio::test]
async fn missing_credentials_make_no_network_calls() {
    let mut upstream = mockito::Server::new_async().await;
    let any = upstream
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let relay = RunningRelay::start(&upstream.url()).await;
    let runner = runner(&relay.url, ApiConfig::default());

    let err = runner.analyze_images(frames(2)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotConfigured(_)));
    assert!(runner.session().lock().batch.is_none());

    any.assert_async().await;
    relay.stop().await;
}
