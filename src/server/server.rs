use anyhow::{Context, Result};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::notifications::{NotificationService, NotificationStore};
use crate::user::{UserManager, UserStore};
use axum_extra::extract::cookie::{Cookie, SameSite};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::metrics::{self, metrics_handler};
use super::notification_routes::make_notification_routes;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, ServerConfig};
use crate::user::auth::AuthTokenValue;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
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
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
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
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    debug!("login() called for {}", body.user_handle);

    let auth_token = match user_manager.login(&body.user_handle, &body.password)? {
        Some(auth_token) => auth_token,
        None => {
            metrics::record_login_attempt("failure");
            return Err(ApiError::Unauthenticated);
        }
    };
    metrics::record_login_attempt("success");

    let cookie = session_cookie(auth_token.value.0.clone());
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(LoginSuccessResponse {
            token: auth_token.value.0,
        }),
    )
        .into_response())
}

async fn logout(
    State(user_manager): State<GuardedUserManager>,
    session: Option<Session>,
) -> Result<Response, ApiError> {
    if let Some(session) = session {
        user_manager.logout(&AuthTokenValue(session.token))?;
    }

    let mut cookie = session_cookie(String::new());
    // Expire it in the past
    cookie.set_expires(time::OffsetDateTime::now_utc() - time::Duration::days(1));

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]).into_response())
}

impl ServerState {
    fn new(
        config: ServerConfig,
        user_store: Arc<dyn UserStore>,
        notification_store: Arc<dyn NotificationStore>,
    ) -> ServerState {
        let user_manager = Arc::new(UserManager::new(user_store));
        let notification_service = Arc::new(NotificationService::new(
            notification_store.clone(),
            user_manager.clone(),
        ));
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager,
            notification_store,
            notification_service,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    user_store: Arc<dyn UserStore>,
    notification_store: Arc<dyn NotificationStore>,
) -> Result<Router> {
    let state = ServerState::new(config, user_store, notification_store);

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/auth", auth_routes)
        .merge(make_notification_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    user_store: Arc<dyn UserStore>,
    notification_store: Arc<dyn NotificationStore>,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, user_store, notification_store)?;

    let metrics_app = Router::new().route("/metrics", get(metrics_handler));
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    info!("Serving metrics on port {}", metrics_port);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_app).await {
            tracing::error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
