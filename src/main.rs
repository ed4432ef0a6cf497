use std::sync::Arc;

use bionext::config::Config;
use bionext::identity::{IdentityProvider, NullIdentityProvider};
use bionext::logging;
use bionext::relay::LlmClient;
use bionext::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
    match logging::cleanup_old_logs() {
        Ok(removed) if removed > 0 => {
            logging::log_session(None, &format!("Removed {} old log file(s)", removed));
        }
        Ok(_) => {}
        Err(e) => logging::log_error(None, &format!("Log cleanup failed: {}", e)),
    }

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("Configuration problem: {}", problem);
        }
        if config.is_production() {
            return Err("invalid configuration".into());
        }
    }

    // Identity is informational only; no handoff means an anonymous session.
    let identity = NullIdentityProvider;
    if let Some(handoff) = identity.current_user().await {
        logging::log_session(None, &format!("External identity: {}", handoff.user.email));
    }

    let bind_addr = config.bind_addr.clone();
    let relay = Arc::new(LlmClient::new(&config));
    let state = AppState::new(Arc::new(config), relay);
    let app = server::router(state);

    logging::log_session(None, &format!("Listening on {}", bind_addr));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
