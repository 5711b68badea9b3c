//! Service servers.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use demo_types::codec;
use demo_types::{MwError, RequestHeader, ServiceType};
use tracing::debug;

use crate::context::Context;
use crate::graph::ServiceEndpoint;

/// Decodes requests, runs the user handler, encodes responses.
pub(crate) struct TypedServer<S, F> {
    service: String,
    handler: F,
    _service: PhantomData<fn() -> S>,
}

impl<S, F> TypedServer<S, F>
where
    S: ServiceType,
    F: Fn(&RequestHeader, S::Request) -> S::Response + Send + Sync + 'static,
{
    pub(crate) fn new(service: String, handler: F) -> Self {
        Self {
            service,
            handler,
            _service: PhantomData,
        }
    }
}

#[async_trait]
impl<S, F> ServiceEndpoint for TypedServer<S, F>
where
    S: ServiceType,
    F: Fn(&RequestHeader, S::Request) -> S::Response + Send + Sync + 'static,
{
    async fn call(&self, header: RequestHeader, request: Arc<[u8]>) -> Result<Vec<u8>, MwError> {
        let request: S::Request = codec::decode(&request)?;
        debug!(
            service = %self.service,
            sequence_number = header.sequence_number,
            "handling request"
        );
        let response = (self.handler)(&header, request);
        codec::encode(&response)
    }
}

/// Handle to a registered service server.
///
/// The server answers requests for as long as this handle is alive; dropping
/// it removes the service from the graph.
pub struct Service<S: ServiceType> {
    service: String,
    context: Context,
    _service: PhantomData<fn() -> S>,
}

impl<S: ServiceType> Service<S> {
    pub(crate) fn new(service: String, context: Context) -> Self {
        Self {
            service,
            context,
            _service: PhantomData,
        }
    }

    /// Fully qualified service name.
    pub fn service_name(&self) -> &str {
        &self.service
    }
}

impl<S: ServiceType> Drop for Service<S> {
    fn drop(&mut self) {
        self.context.graph().remove_service(&self.service);
    }
}
