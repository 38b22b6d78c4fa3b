//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (request ID, tracing,
//!   timeout, body limit, cache policy)
//! - Dispatch every request through the site's route table
//! - Enforce per-route cookie parsing and the CSRF crumb
//! - Stamp security headers onto responses of routes that want them
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::SiteConfig;
use crate::error::{SiteError, SiteResult};
use crate::http::cache_policy::{cache_policy_middleware, NotFoundPage};
use crate::http::cookies::CookieJar;
use crate::http::request::{self, MakeRequestUuid};
use crate::http::response::Reply;
use crate::lifecycle::{shutdown, StartupError};
use crate::observability::metrics;
use crate::routing::{
    site_routes, ApiEndpoint, Handler, Route, RouteParams, Router as SiteRouter,
    UserAgentClassifier,
};
use crate::security::csrf::CRUMB_FIELD;
use crate::security::{Crumb, CrumbGuard, SecurityHeaders};
use crate::upstream::{build_http_client, CdnPurger, FastlyClient, MailchimpClient, MailingList};

/// Everything a request handler needs, built once at startup.
pub struct SiteState {
    pub config: SiteConfig,
    pub router: SiteRouter,
    pub classifier: UserAgentClassifier,
    pub cdn: Arc<dyn CdnPurger>,
    pub mailing_list: Arc<dyn MailingList>,
    pub security_headers: SecurityHeaders,
    pub crumbs: CrumbGuard,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<SiteState>,
}

/// HTTP server for the site.
pub struct HttpServer {
    router: Router,
    config: SiteConfig,
}

impl HttpServer {
    /// Create the server with the real Fastly and Mailchimp clients.
    pub fn new(config: SiteConfig) -> Result<Self, StartupError> {
        let client = build_http_client(config.timeouts.upstream_secs)?;
        let cdn = Arc::new(FastlyClient::new(
            client.clone(),
            &config.cdn.api_base,
            &config.cdn.api_key,
        ));
        let mailing_list = Arc::new(MailchimpClient::new(client, &config.mailing_list));
        Self::with_upstreams(config, cdn, mailing_list)
    }

    /// Create the server around the given upstream clients.
    pub fn with_upstreams(
        config: SiteConfig,
        cdn: Arc<dyn CdnPurger>,
        mailing_list: Arc<dyn MailingList>,
    ) -> Result<Self, StartupError> {
        let site = SiteState {
            router: SiteRouter::new(site_routes()),
            classifier: UserAgentClassifier::new()?,
            cdn,
            mailing_list,
            security_headers: SecurityHeaders::from_config(&config.security),
            crumbs: CrumbGuard::new(&config.csrf)?,
            config: config.clone(),
        };
        tracing::info!(routes = site.router.routes().len(), "Route table loaded");

        let state = AppState {
            inner: Arc::new(site),
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SiteConfig, state: AppState) -> Router {
        let not_found = Arc::new(NotFoundPage::new(config.static_files.not_found_path()));

        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(not_found, cache_policy_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            static_root = %self.config.static_files.root.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }
}

/// Main handler.
/// Looks up the route, applies its cookie, crumb and header settings, and
/// runs its handler.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let site = state.inner.as_ref();
    let request_id = request::request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let Some(matched) = site.router.match_request(&method, &path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request("none", &method, 404, start_time);
        return SiteError::NotFound.into_response();
    };
    let route = matched.route;

    let jar = match CookieJar::from_headers(request.headers(), route.options.cookies) {
        Ok(jar) => jar,
        Err(e) => {
            tracing::warn!(request_id = %request_id, route = route.name, error = %e, "Rejected cookie header");
            metrics::record_request(route.name, &method, e.status().as_u16(), start_time);
            return e.into_response();
        }
    };
    let crumb = route.options.csrf.then(|| site.crumbs.crumb_for(&jar));

    let mut response = match handle(site, route, matched.params, crumb.as_ref(), request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    if let Some(crumb) = crumb.as_ref().filter(|c| c.fresh) {
        match site.crumbs.set_cookie(&crumb.token) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(e) => tracing::error!(error = %e, "Unusable crumb cookie"),
        }
    }
    site.security_headers
        .apply(&route.options, response.headers_mut());

    let status = response.status().as_u16();
    tracing::debug!(
        request_id = %request_id,
        route = route.name,
        status,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request handled"
    );
    metrics::record_request(route.name, &method, status, start_time);
    response
}

/// Run a matched route's handler.
async fn handle(
    site: &SiteState,
    route: &Route,
    params: RouteParams,
    crumb: Option<&Crumb>,
    request: Request<Body>,
) -> SiteResult<Response> {
    let request = match crumb {
        Some(crumb) if CrumbGuard::requires_check(request.method()) => {
            check_crumb(site, crumb, request).await?
        }
        _ => request,
    };

    let root = &site.config.static_files.root;
    let reply = match &route.handler {
        Handler::File(file) => Reply::File(root.join(file)),
        Handler::Directory => Reply::Directory(root.clone()),
        Handler::Redirect {
            target,
            append_tail,
        } => {
            let mut location = target.clone();
            if *append_tail {
                if let Some(tail) = params.tail.as_deref() {
                    location.push_str(tail);
                }
            }
            Reply::Redirect(location)
        }
        Handler::Download => {
            let user_agent = request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok());
            let target = site.classifier.classify(user_agent);
            tracing::debug!(?target, "Download redirect");
            Reply::Redirect(target.url().to_string())
        }
        Handler::Api(ApiEndpoint::Purge) => {
            api::purge::purge(site.cdn.as_ref(), &site.config.cdn, request.uri().query()).await?
        }
        Handler::Api(ApiEndpoint::Crumb) => api::crumb::echo_cookie(request.headers()),
        Handler::Api(ApiEndpoint::MailingList) => {
            let (parts, body) = request.into_parts();
            let bytes = read_body(body, site.config.security.max_body_size).await?;
            let payload = request::parse_payload(&parts.headers, &bytes)?;
            let reply = api::mailing_list::subscribe(site.mailing_list.as_ref(), payload).await?;
            return Ok(reply.into_response(Request::from_parts(parts, Body::empty())).await);
        }
    };

    Ok(reply.into_response(request).await)
}

/// Verify the crumb of an unsafe request.
///
/// The header is checked first; otherwise the body is read for a `crumb`
/// field and put back for the handler.
async fn check_crumb(
    site: &SiteState,
    crumb: &Crumb,
    request: Request<Body>,
) -> SiteResult<Request<Body>> {
    if let Some(token) = site.crumbs.header_token(request.headers()) {
        site.crumbs.verify(crumb, Some(token))?;
        return Ok(request);
    }

    let (parts, body) = request.into_parts();
    let bytes = read_body(body, site.config.security.max_body_size).await?;
    let payload = request::parse_payload(&parts.headers, &bytes)?;
    let submitted = match payload.get(CRUMB_FIELD) {
        Some(Value::String(token)) => Some(token.as_str()),
        _ => None,
    };
    site.crumbs.verify(crumb, submitted)?;
    Ok(Request::from_parts(parts, Body::from(bytes)))
}

async fn read_body(body: Body, limit: usize) -> SiteResult<bytes::Bytes> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| SiteError::BadRequest(format!("unreadable request body: {}", e)))
}
