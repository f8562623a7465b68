//! # filamentreload-app
//!
//! FilamentReload 필라멘트 센서 상태 클라이언트 바이너리 진입점.
//! DI 컨테이너 역할, 호스트 훅 디스패치, 폴링 라이프사이클 관리.

mod event_bus;
mod host;
mod lifecycle;
mod presenter;
mod view_model;

use anyhow::{anyhow, Result};
use clap::Parser;
use filamentreload_core::config::AppConfig;
use filamentreload_core::config_manager::ConfigManager;
use filamentreload_core::models::message::PluginMessage;
use filamentreload_core::ports::status_source::PushClient;
use filamentreload_network::auth::ApiKeyAuth;
use filamentreload_network::http_client::HttpStatusClient;
use filamentreload_network::settings_client::RemoteSettings;
use filamentreload_network::ws_client::WsPushClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::event_bus::{AppEvent, EventBus};
use crate::host::{spawn_login_watcher, HostDispatcher, HostHook};
use crate::lifecycle::{LifecycleManager, LifecycleSignal};
use crate::presenter::{render_navbar, TerminalPresenter};
use crate::view_model::{RequestOutcome, StatusViewModel};

/// FilamentReload 클라이언트
///
/// 프린터 호스트의 필라멘트 런아웃 센서 상태를 네비게이션 바 아이콘으로 표시
#[derive(Parser, Debug)]
#[command(name = "filamentreload")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 서버 URL 지정 (기본: 설정 파일 값)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// API 키 (X-Api-Key 헤더)
    #[arg(long, env = "FILAMENTRELOAD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 푸시 채널(웹소켓) 비활성화, 폴링만 사용
    #[arg(long)]
    no_push: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 상태를 한 번 조회해 출력하고 종료
    #[arg(long)]
    once: bool,
}

/// CLI 인자로 설정 오버라이드 (파일에는 저장하지 않음)
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(ref server_url) = args.server {
        config.server.base_url = server_url.trim_end_matches('/').to_string();
    }
    if let Some(ref api_key) = args.api_key {
        config.server.api_key = Some(api_key.clone());
    }
    if args.no_push {
        config.push.enabled = false;
    }
}

/// 한 번 조회 모드
async fn run_once(view_model: &StatusViewModel) -> Result<()> {
    match view_model.request_status().await {
        // 바뀐 값은 프레젠터가 이미 출력했다
        RequestOutcome::Updated(_) => Ok(()),
        RequestOutcome::Unchanged => {
            println!("{}", render_navbar(&view_model.display()));
            Ok(())
        }
        RequestOutcome::Failed => {
            println!("{}", render_navbar(&view_model.display()));
            let reason = view_model
                .diagnostics()
                .last_failure
                .unwrap_or_else(|| "알 수 없는 에러".to_string());
            Err(anyhow!("상태 조회 실패: {reason}"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "filamentreload={0},filamentreload_app={0},filamentreload_core={0},filamentreload_network={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("FilamentReload 클라이언트 시작");

    // 설정 로드
    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    info!("설정 파일: {}", config_manager.config_path().display());
    let config_manager = Arc::new(config_manager);

    let mut config = config_manager.get();
    apply_overrides(&mut config, &args);
    info!("서버: {}", config.server.base_url);

    // 어댑터 생성
    let api_base = config.api_base_url();
    let auth = Arc::new(ApiKeyAuth::new(&api_base, config.server.api_key.as_deref()));
    let status_client = Arc::new(HttpStatusClient::new(
        &api_base,
        auth.clone(),
        config.request_timeout(),
    )?);
    let remote_settings = Arc::new(
        RemoteSettings::new(&api_base, auth.clone(), config.request_timeout())?
            .with_fallback(config_manager.clone()),
    );
    let presenter = Arc::new(TerminalPresenter::stdout());

    let view_model = Arc::new(StatusViewModel::new(
        status_client,
        remote_settings.clone(),
        presenter,
    ));

    if args.once {
        return run_once(&view_model).await;
    }

    let lifecycle = LifecycleManager::new();
    let mut signals = lifecycle
        .signals()
        .map_err(|e| anyhow!("시그널 핸들러 등록 실패: {e}"))?;
    let bus = Arc::new(EventBus::default());

    // 디스패처는 첫 훅 발행 전에 구독해야 한다
    let dispatcher =
        HostDispatcher::new(view_model.clone()).with_remote_settings(remote_settings.clone());
    let dispatcher_rx = bus.subscribe();
    let dispatcher_shutdown = lifecycle.subscribe();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(dispatcher_rx, dispatcher_shutdown).await;
    });

    bus.publish(AppEvent::Host(HostHook::BeforeBinding));

    // 세션 로그인 + 원격 설정
    if auth.has_api_key() {
        if let Err(e) = auth.login().await {
            warn!("세션 로그인 실패, API 키만으로 계속: {e}");
        }
    }
    if let Err(e) = remote_settings.refresh().await {
        warn!("원격 설정 조회 실패, 로컬 설정 사용: {e}");
    }

    let login_watcher = spawn_login_watcher(auth.clone(), bus.clone());

    // 푸시 채널
    let mut push_tasks = Vec::new();
    if config.push.enabled {
        let push_client = WsPushClient::new(
            &config.server.base_url,
            auth.clone(),
            config.server.push_max_retry_secs,
        )?;
        let (push_tx, mut push_rx) = mpsc::channel::<PluginMessage>(64);

        push_tasks.push(tokio::spawn(async move {
            if let Err(e) = push_client.connect(push_tx).await {
                error!("푸시 채널 에러: {e}");
            }
        }));

        let push_bus = bus.clone();
        push_tasks.push(tokio::spawn(async move {
            while let Some(message) = push_rx.recv().await {
                push_bus.publish(AppEvent::PushMessage(message));
            }
        }));
    } else {
        info!("푸시 채널 비활성화, 폴링만 사용");
    }

    bus.publish(AppEvent::Host(HostHook::StartupComplete));

    // 시그널 루프
    loop {
        match signals.recv().await {
            LifecycleSignal::Reload => {
                if let Err(e) = config_manager.reload() {
                    warn!("설정 다시 로드 실패: {e}");
                }
                bus.publish(AppEvent::Host(HostHook::SettingsShown));
                bus.publish(AppEvent::Host(HostHook::SettingsHidden));
            }
            LifecycleSignal::Shutdown => break,
        }
    }

    // 정리
    info!("FilamentReload 클라이언트 종료 중...");
    view_model.on_user_logged_out();
    login_watcher.abort();
    for task in push_tasks {
        task.abort();
    }
    if let Err(e) = auth.logout().await {
        warn!("로그아웃 실패: {e}");
    }
    lifecycle.shutdown();

    if tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
        .await
        .is_err()
    {
        warn!("호스트 디스패처 종료 대기 시간 초과");
    }

    let diagnostics = view_model.diagnostics();
    info!(
        "종료: 상태={} ({}, {}), 조회 실패 {}회, 마지막 변경 {}",
        view_model.status(),
        view_model.icon_class(),
        view_model.tooltip(),
        diagnostics.failure_count,
        diagnostics
            .last_change_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "없음".to_string())
    );
    Ok(())
}
