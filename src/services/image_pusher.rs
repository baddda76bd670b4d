//! Image pusher
//!
//! Pushes a built tag with the encoded registry credential. Success is read
//! from the final status line exactly as for builds.

use std::io::Write;
use std::time::Duration;
use tracing::info;

use crate::error::{PushError, TransportError};
use crate::infrastructure::{consume_status_stream, ImageTransport, RegistryCredentials};

pub struct ImagePusher<'a, T: ImageTransport + ?Sized> {
    transport: &'a T,
    registry_auth: String,
    timeout: Duration,
}

impl<'a, T: ImageTransport + ?Sized> ImagePusher<'a, T> {
    pub fn new(
        transport: &'a T,
        credentials: &RegistryCredentials,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        Ok(Self {
            transport,
            registry_auth: credentials.encode()?,
            timeout,
        })
    }

    /// Push `image` (`<repository>:<tag>`).
    pub async fn push(
        &self,
        image: &str,
        observer: &mut (dyn Write + Send),
    ) -> Result<(), PushError> {
        let (repository, tag) = split_reference(image);
        info!(image = %image, "Pushing image");

        let transport = self.transport;
        let registry_auth = self.registry_auth.as_str();
        let outcome = tokio::time::timeout(self.timeout, async {
            let stream = transport
                .push_image(repository, tag, registry_auth)
                .await
                .map_err(|source| PushError::Transport {
                    tag: image.to_string(),
                    source,
                })?;
            consume_status_stream(stream, observer)
                .await
                .map_err(|e| PushError::Transport {
                    tag: image.to_string(),
                    source: TransportError::Stream(e),
                })
        })
        .await
        .map_err(|_| PushError::Timeout {
            tag: image.to_string(),
            timeout: self.timeout,
        })??;

        if let Some(message) = outcome.reported_error() {
            return Err(PushError::Reported {
                tag: image.to_string(),
                message,
            });
        }

        info!(image = %image, "Image pushed");
        Ok(())
    }
}

/// Split `repo[:port]/path:tag` into repository and tag.
///
/// Only a colon after the last `/` separates the tag, so registry ports are
/// left alone. A reference without a tag pushes `latest`.
pub fn split_reference(image: &str) -> (&str, &str) {
    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(offset) => {
            let at = name_start + offset;
            (&image[..at], &image[at + 1..])
        }
        None => (image, "latest"),
    }
}
