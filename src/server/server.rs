use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, error, info};

use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::api_error::{error_response, JsonBody};
use super::library_routes::{playlist_routes, video_routes};
use super::player_routes::{player_routes, player_settings_routes, public_routes};
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::stream_video::{get_thumbnail, stream_video};
use super::system_routes::system_routes;
use super::{http_cache, log_requests, state::*, ServerConfig};
use crate::user::auth::AuthTokenValue;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
    user_id: usize,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    JsonBody(body): JsonBody<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.email);
    let Ok(locked_manager) = user_manager.lock() else {
        error!("User manager lock poisoned");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    match locked_manager.login(body.email.trim(), &body.password) {
        Ok(Some(auth_token)) => {
            info!("User {} logged in", auth_token.user_id);
            let cookie = session_cookie(auth_token.value.0.clone());
            (
                StatusCode::CREATED,
                [(header::SET_COOKIE, cookie.to_string())],
                Json(LoginSuccessResponse {
                    token: auth_token.value.0,
                    user_id: auth_token.user_id,
                }),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::UNAUTHORIZED, "Invalid email or password"),
        Err(err) => {
            error!("Error with auth token generation: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    let Ok(locked_manager) = user_manager.lock() else {
        error!("User manager lock poisoned");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    match locked_manager.delete_auth_token(session.user_id, &AuthTokenValue(session.token)) {
        Ok(()) => {
            let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie.to_string())],
            )
                .into_response()
        }
        Err(err) => {
            debug!("logout() failed: {}", err);
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

pub fn make_app(state: ServerState) -> Router {
    let config = state.config.clone();

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state.clone());

    let media_routes: Router = Router::new()
        .route(
            "/videos/{id}",
            get(stream_video).layer(middleware::from_fn_with_state(
                config.content_cache_age_sec,
                http_cache,
            )),
        )
        .route("/videos/{id}/thumbnail", get(get_thumbnail))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path.as_ref() {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    #[allow(unused_mut)]
    let mut app: Router = home_router
        .nest("/v1/auth", auth_routes)
        .nest(
            "/v1/videos",
            video_routes(config.max_upload_size).with_state(state.clone()),
        )
        .nest("/v1/media", media_routes)
        .nest("/v1/playlists", playlist_routes().with_state(state.clone()))
        .nest(
            "/v1/player-settings",
            player_settings_routes().with_state(state.clone()),
        )
        .nest("/v1/player", player_routes().with_state(state.clone()))
        .nest("/v1/public", public_routes().with_state(state.clone()))
        .nest("/v1/system", system_routes().with_state(state.clone()));

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(super::slowdown_request));
    }
    app.layer(middleware::from_fn_with_state(config, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    library: GuardedLibraryManager,
    user_manager: GuardedUserManager,
) -> Result<()> {
    let port = config.port;
    let app = make_app(ServerState::new(config, library, user_manager));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(listener, app).await?)
}
