use super::error::TransferError;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use std::future::Future;

pub type BodyStream = BoxStream<'static, Result<Bytes, TransferError>>;

pub struct RangedBody {
    /// True when the server answered with partial content from the requested offset.
    pub resumed: bool,
    pub stream: BodyStream,
}

/// Where the engine gets sizes and bodies from.
pub trait RemoteSource {
    /// Size of the remote resource, taken from a metadata-only request.
    fn content_length(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<u64, TransferError>> + Send;

    /// Streams the resource starting at `offset`.
    fn fetch_from(
        &self,
        url: &str,
        offset: u64,
    ) -> impl Future<Output = Result<RangedBody, TransferError>> + Send;
}

#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl RemoteSource for HttpSource {
    async fn content_length(&self, url: &str) -> Result<u64, TransferError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TransferError::Metadata {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| TransferError::MissingContentLength {
                url: url.to_string(),
            })
    }

    async fn fetch_from(&self, url: &str, offset: u64) -> Result<RangedBody, TransferError> {
        let response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes={}-", offset))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TransferError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let resumed = response.status() == StatusCode::PARTIAL_CONTENT;
        tracing::trace!(url = %url, offset, status = %response.status(), "Body response received");

        let stream = response
            .bytes_stream()
            .map_err(|e| TransferError::Stream {
                reason: e.to_string(),
            })
            .boxed();

        Ok(RangedBody { resumed, stream })
    }
}
