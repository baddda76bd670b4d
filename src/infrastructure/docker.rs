//! Container engine transport
//!
//! Builds and pushes go through the Docker Engine HTTP API. Both calls
//! answer with a line-delimited status stream; see [`super::status_stream`]
//! for how the outcome is read from it.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use std::collections::BTreeMap;
use tracing::debug;

use super::status_stream::StatusStream;
use crate::error::TransportError;

/// Header carrying the encoded registry credential on push
const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";

/// Parameters of one image build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Full image reference to tag the result with
    pub tag: String,
    /// Name of the Dockerfile entry inside the context archive
    pub dockerfile: String,
    /// `--build-arg` values
    pub build_args: BTreeMap<String, String>,
    /// Remove intermediate containers after a successful build
    pub remove: bool,
}

/// Minimal capability the pipeline needs from a container engine
#[async_trait]
pub trait ImageTransport: Send + Sync {
    /// Start a build from an uncompressed tar context.
    async fn build_image(
        &self,
        options: &BuildOptions,
        context: Vec<u8>,
    ) -> Result<StatusStream, TransportError>;

    /// Push `repository:tag` using an encoded registry credential.
    async fn push_image(
        &self,
        repository: &str,
        tag: &str,
        registry_auth: &str,
    ) -> Result<StatusStream, TransportError>;
}

/// Docker Engine API client
pub struct DockerClient {
    http: reqwest::Client,
    base_url: String,
}

impl DockerClient {
    /// Create a client for a `DOCKER_HOST`-style address.
    ///
    /// Accepts `tcp://host:port`, `http://…` and `https://…`.
    pub fn new(host: &str) -> Result<Self, TransportError> {
        let base_url = Self::resolve_base_url(host)?;
        let http = reqwest::Client::builder()
            .user_agent(format!("langmatrix/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(base_url = %base_url, "Created engine client");
        Ok(Self { http, base_url })
    }

    /// Engine root URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve_base_url(host: &str) -> Result<String, TransportError> {
        let host = host.trim().trim_end_matches('/');
        if let Some(rest) = host.strip_prefix("tcp://") {
            return Ok(format!("http://{}", rest));
        }
        if host.starts_with("http://") || host.starts_with("https://") {
            return Ok(host.to_string());
        }
        let reason = if host.starts_with("unix://") {
            "unix sockets are not supported; expose the engine over TCP (e.g. tcp://localhost:2375)"
        } else {
            "expected tcp://, http:// or https://"
        };
        Err(TransportError::UnsupportedHost {
            host: host.to_string(),
            reason: reason.to_string(),
        })
    }

    async fn into_status_stream(
        response: reqwest::Response,
    ) -> Result<StatusStream, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(std::io::Error::other));
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl ImageTransport for DockerClient {
    async fn build_image(
        &self,
        options: &BuildOptions,
        context: Vec<u8>,
    ) -> Result<StatusStream, TransportError> {
        let build_args = serde_json::to_string(&options.build_args)?;
        let remove = if options.remove { "1" } else { "0" };

        let response = self
            .http
            .post(format!("{}/build", self.base_url))
            .query(&[
                ("t", options.tag.as_str()),
                ("dockerfile", options.dockerfile.as_str()),
                ("rm", remove),
                ("buildargs", build_args.as_str()),
            ])
            .header(CONTENT_TYPE, "application/x-tar")
            .body(context)
            .send()
            .await?;

        Self::into_status_stream(response).await
    }

    async fn push_image(
        &self,
        repository: &str,
        tag: &str,
        registry_auth: &str,
    ) -> Result<StatusStream, TransportError> {
        let response = self
            .http
            .post(format!("{}/images/{}/push", self.base_url, repository))
            .query(&[("tag", tag)])
            .header(REGISTRY_AUTH_HEADER, registry_auth)
            .send()
            .await?;

        Self::into_status_stream(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::status_stream::consume_status_stream;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            let header_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break request.len();
                }
            };

            let head = String::from_utf8_lossy(&request[..header_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let lower = l.to_ascii_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            while request.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(head);
        });

        (format!("tcp://{}", addr), rx)
    }

    #[test]
    fn test_base_url() {
        assert_eq!(
            DockerClient::resolve_base_url("tcp://localhost:2375").unwrap(),
            "http://localhost:2375"
        );
        assert_eq!(
            DockerClient::resolve_base_url("https://engine.example:2376/").unwrap(),
            "https://engine.example:2376"
        );
        assert!(matches!(
            DockerClient::resolve_base_url("unix:///var/run/docker.sock"),
            Err(TransportError::UnsupportedHost { .. })
        ));
        assert!(DockerClient::resolve_base_url("localhost").is_err());
    }

    #[tokio::test]
    async fn test_build_sends_query_and_streams_body() {
        let (host, request) = serve_once(
            "200 OK",
            "{\"stream\":\"Step 1/1\\n\"}\n{\"error\":\"boom\"}\n",
        )
        .await;
        let client = DockerClient::new(&host).unwrap();

        let mut build_args = BTreeMap::new();
        build_args.insert("ALPINE_VERSION".to_string(), "3.13".to_string());
        let options = BuildOptions {
            tag: "ghcr.io/unfor19/release-action:python-3.9".to_string(),
            dockerfile: "Dockerfile.base".to_string(),
            build_args,
            remove: true,
        };

        let stream = client.build_image(&options, b"tar".to_vec()).await.unwrap();
        let mut sink = Vec::new();
        let outcome = consume_status_stream(stream, &mut sink).await.unwrap();
        assert_eq!(outcome.reported_error().as_deref(), Some("boom"));

        let head = request.await.unwrap();
        assert!(head.starts_with("POST /build?"));
        assert!(head.contains("dockerfile=Dockerfile.base"));
        assert!(head.contains("rm=1"));
        assert!(head.to_ascii_lowercase().contains("content-type: application/x-tar"));
    }

    #[tokio::test]
    async fn test_push_sends_auth_header() {
        let (host, request) = serve_once("200 OK", "{\"status\":\"Pushed\"}\n").await;
        let client = DockerClient::new(&host).unwrap();

        let stream = client
            .push_image("ghcr.io/unfor19/release-action", "python-3.9", "e30=")
            .await
            .unwrap();
        let mut sink = Vec::new();
        let outcome = consume_status_stream(stream, &mut sink).await.unwrap();
        assert!(outcome.reported_error().is_none());

        let head = request.await.unwrap();
        assert!(head.starts_with("POST /images/ghcr.io/unfor19/release-action/push?tag=python-3.9"));
        assert!(head.to_ascii_lowercase().contains("x-registry-auth: e30="));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let (host, _request) = serve_once("500 Internal Server Error", "{\"message\":\"daemon down\"}").await;
        let client = DockerClient::new(&host).unwrap();

        let err = client.push_image("repo", "tag", "e30=").await.err().unwrap();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("daemon down"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
