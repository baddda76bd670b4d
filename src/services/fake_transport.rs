//! Recording transport that replays canned status streams.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::infrastructure::{BuildOptions, ImageTransport, StatusStream};

/// How the fake answers one call
#[derive(Debug, Clone)]
pub enum Reply {
    /// Call succeeds and streams these lines
    Lines(Vec<String>),
    /// Call itself fails with this HTTP status
    Refuse(u16),
    /// Call succeeds but the stream never ends
    Hang,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Lines(vec![
            "{\"stream\":\"Step 1/1 : FROM base\\n\"}".to_string(),
            "{\"stream\":\"Successfully built 0123456789ab\\n\"}".to_string(),
        ])
    }

    pub fn error(message: &str) -> Self {
        Reply::Lines(vec![
            "{\"stream\":\"Step 1/2 : FROM base\\n\"}".to_string(),
            format!("{{\"error\":\"{0}\",\"errorDetail\":{{\"message\":\"{0}\"}}}}", message),
        ])
    }

    fn into_stream(self) -> Result<StatusStream, TransportError> {
        match self {
            Reply::Lines(lines) => {
                let items: Vec<std::io::Result<Vec<u8>>> = lines
                    .into_iter()
                    .map(|line| Ok(format!("{}\r\n", line).into_bytes()))
                    .collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Reply::Refuse(status) => Err(TransportError::Status {
                status,
                body: "refused".to_string(),
            }),
            Reply::Hang => Ok(Box::pin(futures::stream::pending::<
                std::io::Result<Vec<u8>>,
            >())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushCall {
    pub repository: String,
    pub tag: String,
    pub registry_auth: String,
}

/// Fake engine keyed by combination tag (`<language>-<version>`)
#[derive(Default)]
pub struct FakeTransport {
    pub builds: Mutex<Vec<(BuildOptions, Vec<u8>)>>,
    pub pushes: Mutex<Vec<PushCall>>,
    build_replies: Vec<(String, Reply)>,
    push_replies: Vec<(String, Reply)>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_build(mut self, tag: &str, reply: Reply) -> Self {
        self.build_replies.push((tag.to_string(), reply));
        self
    }

    pub fn on_push(mut self, tag: &str, reply: Reply) -> Self {
        self.push_replies.push((tag.to_string(), reply));
        self
    }

    pub fn build_tags(&self) -> Vec<String> {
        self.builds
            .lock()
            .unwrap()
            .iter()
            .map(|(options, _)| options.tag.clone())
            .collect()
    }

    pub fn push_tags(&self) -> Vec<String> {
        self.pushes
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.tag.clone())
            .collect()
    }
}

#[async_trait]
impl ImageTransport for FakeTransport {
    async fn build_image(
        &self,
        options: &BuildOptions,
        context: Vec<u8>,
    ) -> Result<StatusStream, TransportError> {
        self.builds
            .lock()
            .unwrap()
            .push((options.clone(), context));
        let reply = self
            .build_replies
            .iter()
            .find(|(tag, _)| options.tag.ends_with(&format!(":{}", tag)))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(Reply::ok);
        reply.into_stream()
    }

    async fn push_image(
        &self,
        repository: &str,
        tag: &str,
        registry_auth: &str,
    ) -> Result<StatusStream, TransportError> {
        self.pushes.lock().unwrap().push(PushCall {
            repository: repository.to_string(),
            tag: tag.to_string(),
            registry_auth: registry_auth.to_string(),
        });
        let reply = self
            .push_replies
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Lines(vec!["{\"status\":\"Pushed\"}".to_string()]));
        reply.into_stream()
    }
}
