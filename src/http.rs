//! One-shot HTTP/1.1 GET plumbing shared by the Docker Engine client and the
//! status-endpoint fetcher.
//!
//! Every request opens a fresh connection (Unix domain socket or TCP), drives
//! it for a single request/response exchange, and drops it. There is no
//! connection pooling, no retry, and no redirect handling; the callers issue
//! one best-effort GET per target per cycle.

use std::path::Path;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::{Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid endpoint url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: hyper::http::uri::InvalidUri,
    },
    #[error("endpoint url `{0}` is missing a host")]
    MissingHost(String),
    #[error("failed to build request: {0}")]
    RequestBuild(#[from] hyper::http::Error),
    #[error("failed to connect to `{authority}`: {source}")]
    Connect {
        authority: String,
        #[source]
        source: std::io::Error,
    },
    #[error("http handshake with `{authority}` failed: {source}")]
    Handshake {
        authority: String,
        #[source]
        source: hyper::Error,
    },
    #[error("request to `{authority}` failed: {source}")]
    Request {
        authority: String,
        #[source]
        source: hyper::Error,
    },
    #[error("failed to read response body from `{authority}`: {source}")]
    Body {
        authority: String,
        #[source]
        source: hyper::Error,
    },
    #[error("request to `{url}` returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("request to `{url}` timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Issues a GET against an HTTP endpoint listening on a Unix domain socket.
pub async fn get_unix(socket: impl AsRef<Path>, path_and_query: &str) -> Result<(StatusCode, Bytes)> {
    let socket = socket.as_ref();
    let authority = socket.display().to_string();
    let stream = tokio::net::UnixStream::connect(socket)
        .await
        .map_err(|source| Error::Connect {
            authority: authority.clone(),
            source,
        })?;

    // The daemon behind a unix socket ignores the host, but HTTP/1.1 requires one.
    let request = Request::get(path_and_query)
        .header(hyper::header::HOST, "localhost")
        .body(Empty::<Bytes>::new())?;

    roundtrip(stream, request, &authority).await
}

/// Issues a GET against a plain TCP HTTP endpoint. `authority` is the
/// `host:port` pair used both to connect and as the `Host` header.
pub async fn get_tcp(authority: &str, path_and_query: &str) -> Result<(StatusCode, Bytes)> {
    let stream = tokio::net::TcpStream::connect(authority)
        .await
        .map_err(|source| Error::Connect {
            authority: authority.to_owned(),
            source,
        })?;

    let request = Request::get(path_and_query)
        .header(hyper::header::HOST, authority)
        .body(Empty::<Bytes>::new())?;

    roundtrip(stream, request, authority).await
}

/// Fetches a status endpoint URL, bounded by `timeout`.
///
/// # Errors
///
/// Fails on a malformed URL, any transport error, an expired deadline, or a
/// non-200 response status. The body of a non-200 response is discarded.
pub async fn fetch_status(url: &str, timeout: Duration) -> Result<Bytes> {
    let uri: Uri = url.parse().map_err(|source| Error::InvalidUrl {
        url: url.to_owned(),
        source,
    })?;
    let host = uri.host().ok_or_else(|| Error::MissingHost(url.to_owned()))?;
    let authority = format!("{}:{}", host, uri.port_u16().unwrap_or(80));
    let path_and_query = uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_owned();

    let (status, body) = tokio::time::timeout(timeout, get_tcp(&authority, &path_and_query))
        .await
        .map_err(|_| Error::Timeout {
            url: url.to_owned(),
            timeout,
        })??;

    if status != StatusCode::OK {
        return Err(Error::Status {
            url: url.to_owned(),
            status,
        });
    }

    Ok(body)
}

async fn roundtrip<T>(
    stream: T,
    request: Request<Empty<Bytes>>,
    authority: &str,
) -> Result<(StatusCode, Bytes)>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) =
        http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|source| Error::Handshake {
                authority: authority.to_owned(),
                source,
            })?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::debug!("connection closed with error: {err}");
        }
    });

    let response = sender
        .send_request(request)
        .await
        .map_err(|source| Error::Request {
            authority: authority.to_owned(),
            source,
        })?;
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|source| Error::Body {
            authority: authority.to_owned(),
            source,
        })?
        .to_bytes();

    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serves canned HTTP responses on a local TCP port, one per connection.
    async fn serve(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body,
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}/status")
    }

    #[tokio::test]
    async fn test_fetch_status_returns_body() {
        let url = serve("200 OK", "pool: www\n").await;
        let body = fetch_status(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(body.as_ref(), b"pool: www\n");
    }

    #[tokio::test]
    async fn test_fetch_status_rejects_non_200() {
        let url = serve("500 Internal Server Error", "boom").await;
        let err = fetch_status(&url, Duration::from_secs(5)).await.unwrap_err();
        match err {
            Error::Status { status, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected status error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_status_rejects_invalid_url() {
        let err = fetch_status("http://", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidUrl { .. } | Error::MissingHost(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_status_rejects_unreachable_endpoint() {
        // reserved port on localhost with nothing listening
        let err = fetch_status("http://127.0.0.1:1/status", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connect { .. }));
    }

    #[tokio::test]
    async fn test_fetch_status_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // accept and hold the connection open without answering
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });

        let url = format!("http://{addr}/status");
        let err = fetch_status(&url, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
