use std::{
    future::IntoFuture as _,
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, graphql, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use juniper::EmptySubscription;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// [`log::Level`]s written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] being written, set once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| passes(meta, false))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| passes(meta, true))),
        )
        .init();

    _ = start().await;
}

/// Checks whether the event or span described by `meta` is written to the
/// `stderr` (or `stdout`) output.
fn passes(meta: &log::Metadata<'_>, stderr: bool) -> bool {
    let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
    let level = *meta.level();
    meta.is_span() || (STDERR_LEVELS.contains(&level) == stderr && max >= level)
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let (service, background) = Service::new(service.into(), postgres);

    let cors = server.cors.layer().map_err(|e| {
        log::error!("invalid CORS origins `{:?}`: {e}", server.cors.origins);
    })?;
    let schema =
        api::Schema::new(api::Query, api::Mutation, EmptySubscription::new());

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    log::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions()
                        )
                            .map(|ip| ip.0.to_string())
                            .ok(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.status_code = log::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &log::Span| {
                        _ = span.record(
                            "http.status_code",
                            log::field::display(r.status().as_u16()),
                        );

                        let duration = format!("{}ms", dur.as_millis());
                        if r.status().is_server_error() {
                            log::error!(duration = %duration);
                        } else if r.status().is_client_error() {
                            log::warn!(duration = %duration);
                        } else {
                            log::info!(duration = %duration);
                        }
                    },
                ),
        );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;
    log::info!("listening on `{addr}`");

    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .into_future();

    // The background tasks never end on their own, so the server stopping
    // stops the whole application.
    tokio::select! {
        res = serve => res.map_err(|e| log::error!("webserver failed: {e}")),
        res = background.into_future() => {
            res.map_err(|e| log::error!("background task failed: {e}"))
        }
    }
}

/// Resolves once the application is requested to stop.
async fn shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        log::error!("failed to listen for `Ctrl+C`: {e}");
        return;
    }
    log::info!("shutting down");
}
