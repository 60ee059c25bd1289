use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use coursekit_llm::LlmProvider;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, method_not_allowed, tutor_handler};
use super::server::AppState;

/// Paths answering tutor questions.
pub const TUTOR_PATHS: [&str; 2] = ["/api/ai-tutor", "/api/tutor"];

const MAX_TRACKED_CLIENTS: usize = 10_000;
const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    hits: u32,
}

/// Fixed one-minute window per client IP.
#[derive(Clone)]
struct RateLimiter {
    per_minute: u32,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a hit; `Err` carries the time left in the window when over the limit.
    async fn hit(&self, ip: IpAddr, now: Instant) -> Result<(), Duration> {
        if self.per_minute == 0 {
            return Ok(());
        }
        let mut windows = self.windows.lock().await;
        if windows.len() >= MAX_TRACKED_CLIENTS && !windows.contains_key(&ip) {
            windows.retain(|_, w| now.duration_since(w.opened) < RATE_WINDOW);
        }
        let window = windows.entry(ip).or_insert(Window {
            opened: now,
            hits: 0,
        });
        let age = now.duration_since(window.opened);
        if age >= RATE_WINDOW {
            *window = Window {
                opened: now,
                hits: 1,
            };
            return Ok(());
        }
        window.hits += 1;
        if window.hits > self.per_minute {
            Err(RATE_WINDOW - age)
        } else {
            Ok(())
        }
    }
}

pub(crate) fn build_router<P: LlmProvider + 'static>(
    state: AppState<P>,
    rate_limit: u32,
    max_body_size: usize,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut tutor = Router::new();
    for path in TUTOR_PATHS {
        tutor = tutor.route(path, post(tutor_handler::<P>).get(method_not_allowed));
    }
    let tutor = tutor
        .layer(middleware::from_fn_with_state(
            RateLimiter::new(rate_limit),
            throttle,
        ))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/health", get(health_handler::<P>))
        .merge(tutor)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn throttle(State(limiter): State<RateLimiter>, req: Request<Body>, next: Next) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ci| ci.0.ip());

    match limiter.hit(ip, Instant::now()).await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            tracing::debug!(%ip, "tutor rate limit exceeded");
            let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
            if let Ok(value) = HeaderValue::from_str(&wait.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}
