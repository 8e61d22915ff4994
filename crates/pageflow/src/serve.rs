use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use pageflow_core::query::QueryState;
use pageflow_core::view::{Page, Record};
use rand::Rng;
use tower_http::cors::{Any, CorsLayer};

use crate::prelude::{eprintln, *};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "PAGEFLOW_PORT", default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Number of generated people
    #[arg(long, default_value = "72")]
    pub rows: usize,

    /// Seed for the generated data set
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Fixed delay added to every response, in milliseconds
    #[arg(long, env = "PAGEFLOW_DELAY_MS", default_value = "0")]
    pub delay_ms: u64,

    /// Random extra delay of up to this many milliseconds per response
    #[arg(long, env = "PAGEFLOW_JITTER_MS", default_value = "0")]
    pub jitter_ms: u64,
}

pub struct ServerState {
    pub people: Vec<Record>,
    pub delay_ms: u64,
    pub jitter_ms: u64,
}

pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/users", post(users_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let addr = format!("{}:{}", options.host, options.port);

    let state = Arc::new(ServerState {
        people: crate::mock::make_people(options.rows, options.seed),
        delay_ms: options.delay_ms,
        jitter_ms: options.jitter_ms,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("mock backend listening on http://{addr}/users");
    if global.verbose {
        eprintln!("Serving {} people on http://{}/users", options.rows, addr);
        eprintln!(
            "Response delay: {}ms + up to {}ms jitter",
            options.delay_ms, options.jitter_ms
        );
    }

    axum::serve(listener, router(state))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

async fn users_handler(
    State(state): State<Arc<ServerState>>,
    Json(query): Json<QueryState>,
) -> Result<Json<Page>, StatusCode> {
    let delay = state.delay_ms + jitter(state.jitter_ms);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    log::debug!(
        "query page {} size {} after {delay}ms",
        query.page_index,
        query.page_size
    );

    crate::mock::query_people(&state.people, &query)
        .map(Json)
        .ok_or(StatusCode::BAD_REQUEST)
}

fn jitter(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpTransport, Transport};
    use pageflow_core::query::{Filter, SortRule};

    async fn spawn_server(people: usize) -> String {
        let state = Arc::new(ServerState {
            people: crate::mock::make_people(people, 7),
            delay_ms: 0,
            jitter_ms: 0,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{addr}/users")
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        let endpoint = spawn_server(72).await;
        let transport = HttpTransport::new(endpoint, Duration::from_secs(5)).unwrap();

        let query = QueryState::new(10)
            .with_page_index(7)
            .with_sort(vec![SortRule::ascending("age")]);
        let page = transport.fetch(&query).await.unwrap();

        assert_eq!(page.total, 72);
        assert_eq!(page.total_pages, 8);
        assert_eq!(page.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_is_applied_by_server() {
        let endpoint = spawn_server(72).await;
        let transport = HttpTransport::new(endpoint, Duration::from_secs(5)).unwrap();

        let query = QueryState::new(10)
            .with_filter(Filter::from([("q".to_string(), "no-such-name".to_string())]));
        let page = transport.fetch(&query).await.unwrap();

        assert!(page.rows.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_zero_page_size_is_a_bad_request() {
        let endpoint = spawn_server(5).await;
        let transport = HttpTransport::new(endpoint, Duration::from_secs(5)).unwrap();

        let err = transport.fetch(&QueryState::new(0)).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Status(400)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport =
            HttpTransport::new(format!("http://{addr}/users"), Duration::from_secs(5)).unwrap();
        let err = transport.fetch(&QueryState::new(10)).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Network(_)));
    }

    #[tokio::test]
    async fn test_stalled_body_is_a_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                      content-length: 100\r\n\r\n{\"data\":[",
                )
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let transport =
            HttpTransport::new(format!("http://{addr}/users"), Duration::from_millis(300))
                .unwrap();
        let err = transport.fetch(&QueryState::new(10)).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Timeout(300)));
    }
}
