//! Camcar Server
//!
//! Main entry point: control port and stream port on simulated hardware.

use camcar_server::{
    hardware::{
        self,
        sim::{
            LoggingFlashlight, LoggingMotorDriver, LoggingPanServo, StaticLink,
            SupervisedProcess, TestPatternCamera,
        },
    },
    motion_controller::MotionTicker,
    state::{AppConfig, AppState, Hardware},
    web_api,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camcar_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Camcar Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        host = %config.host,
        port = config.port,
        stream_port = config.stream_port,
        static_dir = %config.static_dir.display(),
        initial_frame_size = %config.initial_frame_size,
        "Configuration loaded"
    );

    // Hardware
    let camera = Arc::new(TestPatternCamera::new(config.initial_frame_size));
    let system = Arc::new(SupervisedProcess::new(config.wifi_credentials_path.clone()));
    let restart = system.restart_signal();

    hardware::init_or_restart(
        &*camera,
        &*system,
        Duration::from_secs(config.restart_delay_secs),
    )
    .await?;

    let hardware = Hardware {
        motors: Arc::new(LoggingMotorDriver),
        servo: Arc::new(LoggingPanServo),
        flashlight: Arc::new(LoggingFlashlight),
        camera,
        link: Arc::new(StaticLink::new(config.sim_rssi)),
        system,
    };
    let state = AppState::new(config, hardware);

    // Start motion ticker
    let ticker = Arc::new(MotionTicker::new(
        state.motion.clone(),
        state.config.motion_tick_ms,
    ));
    ticker.start();

    // Control port with static file fallback
    let serve_dir = ServeDir::new(&state.config.static_dir);
    let control_app = web_api::create_router(state.clone())
        .fallback_service(serve_dir)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let stream_app = web_api::create_stream_router(state.clone())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start servers
    let control_addr = format!("{}:{}", state.config.host, state.config.port);
    let control_listener = tokio::net::TcpListener::bind(&control_addr).await?;
    tracing::info!("Control server listening on {}", control_addr);

    let stream_addr = format!("{}:{}", state.config.host, state.config.stream_port);
    let stream_listener = tokio::net::TcpListener::bind(&stream_addr).await?;
    tracing::info!("Stream server listening on {}", stream_addr);

    tokio::select! {
        result = axum::serve(control_listener, control_app).into_future() => result?,
        result = axum::serve(stream_listener, stream_app).into_future() => result?,
        _ = restart.notified() => {
            tracing::warn!("Exiting for restart");
        }
    }

    Ok(())
}
