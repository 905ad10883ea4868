//! Radio Script Studio HTTP server.
//!
//! Configuration comes from `RADIO_SCRIPT__*` environment variables (see
//! [`radio_script_studio::config`]). Set `RUST_LOG` to override the configured
//! log filter.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use radio_script_studio::adapters::ai::{MockGenerationClient, OpenAIGenerationClient};
use radio_script_studio::adapters::http::{chat_router, ChatAppState};
use radio_script_studio::adapters::storage::InMemorySessionStore;
use radio_script_studio::application::handlers::chat::SendChatMessageHandler;
use radio_script_studio::config::{AiProvider, AppConfig};
use radio_script_studio::domain::dialogue::{PromptBuilder, StageTransitionEngine};
use radio_script_studio::ports::{GenerationClient, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let client = build_client(&config)?;
    let info = client.provider_info();
    tracing::info!(provider = %info.name, model = %info.model, "generation client ready");

    let sessions = InMemorySessionStore::new(config.dialogue.max_history)
        .with_idle_ttl(config.dialogue.session_idle_ttl());
    let _sweep = sessions.spawn_idle_sweep(config.dialogue.session_sweep_interval());
    tracing::info!(
        idle_ttl_secs = config.dialogue.session_idle_ttl_secs,
        "session store ready"
    );
    let store: Arc<dyn SessionStore> = Arc::new(sessions);
    let engine = StageTransitionEngine::new(
        config.dialogue.transition_config(),
        PromptBuilder::new(config.dialogue.prompt_config()),
    );
    let handler = SendChatMessageHandler::new(
        store,
        client,
        engine,
        config.dialogue.handler_config(),
    );

    let app = chat_router(
        ChatAppState::new(Arc::new(handler)),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "radio script studio listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if config.is_production() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn build_client(config: &AppConfig) -> Result<Arc<dyn GenerationClient>, Box<dyn std::error::Error>> {
    match config.ai.provider {
        AiProvider::OpenAI => {
            let client = OpenAIGenerationClient::new(config.ai.openai_config()?)?;
            Ok(Arc::new(client))
        }
        AiProvider::Mock => {
            tracing::warn!("running with the mock generation client; drafts echo the brief");
            Ok(Arc::new(MockGenerationClient::new()))
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix. In-flight requests complete before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
