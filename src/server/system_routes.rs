//! Host management routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tokio::process::Command;
use tracing::{error, info, warn};

use super::api_error::error_response;
use super::session::Session;
use super::state::ServerState;
use super::ServerConfig;

#[derive(Debug, Serialize)]
struct RebootResponse {
    message: String,
}

/// Runs `program args`, returning its stderr on failure.
async fn run_command(program: &str, args: &[&str]) -> Result<(), String> {
    match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => Err(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        Err(e) => Err(e.to_string()),
    }
}

async fn reboot(session: Session, State(config): State<ServerConfig>) -> Response {
    if !config.enable_reboot {
        warn!("User {} requested a reboot while disabled", session.user_id);
        return error_response(StatusCode::FORBIDDEN, "Reboot is disabled on this server");
    }
    if !cfg!(target_os = "linux") {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Reboot is only supported on Linux hosts",
        );
    }

    info!("User {} requested a system reboot", session.user_id);
    let result = match run_command("sudo", &["reboot"]).await {
        Ok(()) => Ok(()),
        Err(sudo_err) => {
            warn!("sudo reboot failed ({}), trying reboot", sudo_err);
            run_command("reboot", &[]).await
        }
    };
    match result {
        Ok(()) => Json(RebootResponse {
            message: "Reboot initiated".to_string(),
        })
        .into_response(),
        Err(stderr) => {
            error!("Reboot failed: {}", stderr);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Reboot failed: {}", stderr),
            )
        }
    }
}

pub fn system_routes() -> Router<ServerState> {
    Router::new().route("/reboot", post(reboot))
}
