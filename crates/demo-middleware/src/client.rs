//! Service clients.
//!
//! A [`Client`] sends requests to whichever server is registered under its
//! service name.  Requests are fire-and-callback: [`Client::async_send_request`]
//! returns immediately and the callback runs on the runtime once the response
//! is in.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use demo_types::codec;
use demo_types::{MwError, RequestHeader, ServiceType};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::Context;

/// Sends requests of service type `S`.
pub struct Client<S: ServiceType> {
    service: String,
    gid: Uuid,
    sequence: AtomicI64,
    context: Context,
    _service: PhantomData<fn() -> S>,
}

impl<S: ServiceType> Client<S> {
    pub(crate) fn new(service: String, context: Context) -> Self {
        Self {
            service,
            gid: Uuid::new_v4(),
            sequence: AtomicI64::new(0),
            context,
            _service: PhantomData,
        }
    }

    /// Fully qualified service name.
    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// `true` when a server of the right type is registered right now.
    pub fn service_is_ready(&self) -> bool {
        self.context
            .graph()
            .service_server(&self.service, S::TYPE_NAME)
            .is_ok()
    }

    /// Wait up to `timeout` for a server to appear.
    ///
    /// Returns `true` as soon as the service is ready, `false` when the
    /// timeout expires or the context shuts down first.
    pub async fn wait_for_service(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut changes = self.context.graph().subscribe_changes();
        loop {
            if !self.context.ok() {
                return false;
            }
            if self.service_is_ready() {
                return true;
            }
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
                _ = tokio::time::sleep_until(deadline) => return self.service_is_ready(),
                _ = self.context.shutdown_requested() => return false,
            }
        }
    }

    /// Send `request` and run `callback` with the outcome once it arrives.
    ///
    /// The request is encoded before this returns, so encoding problems are
    /// reported directly.  Delivery problems (no server, a server of another
    /// type, an undecodable response) reach the callback as `Err`.  If the
    /// context shuts down before the response arrives the callback never
    /// runs.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn async_send_request<F>(
        &self,
        request: S::Request,
        callback: F,
    ) -> Result<PendingRequest<S>, MwError>
    where
        F: FnOnce(Result<S::Response, MwError>) + Send + 'static,
    {
        if !self.context.ok() {
            return Err(MwError::ShutdownRequested);
        }

        let payload: Arc<[u8]> = codec::encode(&request)?.into();

        let header = RequestHeader {
            client_gid: self.gid,
            sequence_number: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
        };
        debug!(
            service = %self.service,
            sequence_number = header.sequence_number,
            "sending request"
        );

        let context = self.context.clone();
        let service = self.service.clone();
        let handle = tokio::spawn(async move {
            let exchange = async {
                let server = context.graph().service_server(&service, S::TYPE_NAME)?;
                let response = server.call(header, payload).await?;
                codec::decode::<S::Response>(&response)
            };
            let result = tokio::select! {
                result = exchange => result,
                _ = context.shutdown_requested() => return Err(MwError::ShutdownRequested),
            };
            if let Err(e) = &result {
                warn!(service = %service, error = %e, "request failed");
            }
            callback(result.clone());
            result
        });

        Ok(PendingRequest {
            sequence_number: header.sequence_number,
            handle,
        })
    }
}

/// An in-flight request returned by [`Client::async_send_request`].
///
/// Dropping it does not cancel the request; the callback still runs.
pub struct PendingRequest<S: ServiceType> {
    sequence_number: i64,
    handle: JoinHandle<Result<S::Response, MwError>>,
}

impl<S: ServiceType> PendingRequest<S> {
    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    /// Wait for the same outcome the callback receives.
    pub async fn wait(self) -> Result<S::Response, MwError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(MwError::Channel(format!("request task failed: {e}"))),
        }
    }
}
