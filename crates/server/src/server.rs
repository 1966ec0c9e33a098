use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, header, http};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use pprof_flame_core::{FlameConfig, Profile, render_flamegraph};
use tracing::{debug, error, info};

/// Query parameter naming the series to show.
const SERIES_PARAM: &str = "t";

type HttpResponse = Response<Full<Bytes>>;

/// Serves flame graph pages for one loaded profile.
///
/// The profile is shared read-only between connections; each request
/// builds and discards its own call tree.
#[derive(Clone)]
pub struct FlameServer {
    profile: Arc<Profile>,
    config: Arc<FlameConfig>,
}

impl FlameServer {
    pub fn new(profile: Profile, config: FlameConfig) -> Self {
        Self {
            profile: Arc::new(profile),
            config: Arc::new(config),
        }
    }

    /// Accept connections on `addr` until interrupted.
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("serving flame graph on http://{addr}{}", self.config.base_url);

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();
        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, peer)) => {
                        debug!(%peer, "accepted connection");
                        conn
                    }
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        std::panic::resume_unwind(e.into_panic());
                    },
                    Ok(()) | Err(_) => continue,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                    return Ok(());
                }
            };
            let conn = TokioIo::new(conn);
            let server = server.clone();
            let handler = self.clone();
            joinset.spawn(async move {
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { handler.handle(&req) }
                });
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }

    fn handle<B>(&self, req: &Request<B>) -> http::Result<HttpResponse> {
        let series = req
            .uri()
            .query()
            .and_then(|query| query_param(query, SERIES_PARAM));
        debug!(method = %req.method(), path = req.uri().path(), ?series, "request");
        self.respond(req.method(), req.uri().path(), series.as_deref())
    }

    /// Route one request. `series` is the decoded `t` query parameter.
    pub fn respond(
        &self,
        method: &Method,
        path: &str,
        series: Option<&str>,
    ) -> http::Result<HttpResponse> {
        let base = self.config.base_url.as_str();
        let json_path = format!("{base}.json");
        let is_read = matches!(*method, Method::GET | Method::HEAD);

        if path == "/" && is_read {
            return Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, base)
                .body(Full::new(Bytes::new()));
        }
        if path != base && path != json_path {
            return text_response(StatusCode::NOT_FOUND, "text/plain", "not found");
        }
        if !is_read {
            return text_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "text/plain",
                "method not allowed",
            );
        }

        let response = match render_flamegraph(&self.profile, series, &self.config) {
            Ok(page) if path == json_path => {
                text_response(StatusCode::OK, "application/json", page.data)
            }
            Ok(page) => text_response(StatusCode::OK, "text/html; charset=utf-8", page.to_html()),
            Err(e) => {
                error!("{e}");
                text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    "error serializing flame graph",
                )
            }
        }?;
        if *method == Method::HEAD {
            return Ok(response.map(|_| Full::new(Bytes::new())));
        }
        Ok(response)
    }
}

fn text_response(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> http::Result<HttpResponse> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(body.into()))
}

/// Decoded value of the first `key` parameter in a query string.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (decode_component(k) == key).then(|| decode_component(v))
    })
}

/// Form-style decoding: `+` is a space, malformed escapes stay literal.
fn decode_component(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}
