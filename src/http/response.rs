//! Response streaming and body capture.
//!
//! # Responsibilities
//! - Relay upstream response bodies frame by frame
//! - Optionally accumulate the body and hand it to a completion callback
//!
//! # Design Decisions
//! - Bodies are only buffered when a completion callback is registered
//! - The callback fires once, after the final frame, never on abnormal close
//! - A panicking callback is contained and logged

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use crate::http::request::RequestId;

/// A fully received pass-through response.
#[derive(Debug, Clone)]
pub struct CompletedResponse {
    /// Id of the inbound request, when the request-id middleware ran.
    pub request_id: Option<RequestId>,
    /// Method sent to the upstream.
    pub method: Method,
    /// Inbound path and query.
    pub path: String,
    /// Upstream status.
    pub status: StatusCode,
    /// Upstream response headers.
    pub headers: HeaderMap,
    /// Concatenation of every body chunk streamed to the client.
    pub body: Bytes,
}

/// Callback invoked with each completed pass-through response.
pub type CompletionFn = Arc<dyn Fn(CompletedResponse) + Send + Sync>;

/// Response metadata held until the body completes.
pub struct PendingCompletion {
    pub callback: CompletionFn,
    pub request_id: Option<RequestId>,
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

pin_project! {
    /// Streams the inner body through while keeping a copy of every chunk.
    pub struct CapturingBody<B> {
        #[pin]
        inner: B,
        buffer: BytesMut,
        pending: Option<PendingCompletion>,
    }
}

impl<B> CapturingBody<B> {
    pub fn new(inner: B, pending: PendingCompletion) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            pending: Some(pending),
        }
    }
}

impl<B> Body for CapturingBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();

        match ready!(this.inner.as_mut().poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.buffer.extend_from_slice(data);
                }
                // A length-delimited body is not polled again once its last
                // byte is written, so completion cannot wait for `None`.
                if this.inner.is_end_stream() {
                    if let Some(pending) = this.pending.take() {
                        complete(pending, std::mem::take(this.buffer).freeze());
                    }
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => {
                if let Some(pending) = this.pending.take() {
                    tracing::warn!(
                        path = %pending.path,
                        received = this.buffer.len(),
                        "Upstream closed before the response completed"
                    );
                }
                this.buffer.clear();
                Poll::Ready(Some(Err(e)))
            }
            None => {
                if let Some(pending) = this.pending.take() {
                    let body = std::mem::take(this.buffer).freeze();
                    complete(pending, body);
                }
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Wrap `body` so the completion callback sees it; a body that is already
/// finished completes immediately.
pub fn capture<B>(body: B, pending: PendingCompletion) -> axum::body::Body
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    if body.is_end_stream() {
        complete(pending, Bytes::new());
        axum::body::Body::new(body)
    } else {
        axum::body::Body::new(CapturingBody::new(body, pending))
    }
}

fn complete(pending: PendingCompletion, body: Bytes) {
    let path = pending.path.clone();
    let completed = CompletedResponse {
        request_id: pending.request_id,
        method: pending.method,
        path: pending.path,
        status: pending.status,
        headers: pending.headers,
        body,
    };
    let callback = pending.callback;
    if catch_unwind(AssertUnwindSafe(|| callback(completed))).is_err() {
        tracing::error!(path = %path, "Response completion callback panicked");
    }
}
