//! sysmon_agent: HTTP service reporting host resource metrics, with a
//! round-robin scheduling stub and SIGTERM-based process control.

mod metrics;
mod ops;
mod routes;
mod scheduler;
mod state;
mod types;

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

const DEFAULT_PORT: u16 = 5000;

// Flags win over the PORT env var, which wins over the default.
fn parse_port<I: IntoIterator<Item = String>>(
    args: I,
    env_port: Option<String>,
    default_port: u16,
) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .or(env_port)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = parse_port(std::env::args(), std::env::var("PORT").ok(), DEFAULT_PORT);

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/metrics", get(routes::get_metrics))
        .route("/schedule", post(routes::schedule))
        .route("/kill_process", post(routes::kill_process))
        // The agent is called cross-origin by a browser frontend.
        .layer(CorsLayer::permissive())
        .with_state(AppState::new());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("system monitor agent listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_port;

    #[test]
    fn port_flag_env_default_precedence() {
        let args = |v: &[&str]| {
            std::iter::once("agent".to_string())
                .chain(v.iter().map(|s| s.to_string()))
                .collect::<Vec<_>>()
        };
        assert_eq!(parse_port(args(&["--port", "9001"]), None, 5000), 9001);
        assert_eq!(parse_port(args(&["-p", "9002"]), None, 5000), 9002);
        assert_eq!(parse_port(args(&["--port=9003"]), None, 5000), 9003);
        // Flag beats env var.
        assert_eq!(
            parse_port(args(&["--port", "9004"]), Some("8000".into()), 5000),
            9004
        );
        // Env var beats the default.
        assert_eq!(parse_port(args(&[]), Some("8000".into()), 5000), 8000);
        // Unparseable values fall through to the default.
        assert_eq!(parse_port(args(&[]), Some("not-a-port".into()), 5000), 5000);
        assert_eq!(parse_port(args(&[]), None, 5000), 5000);
    }
}
