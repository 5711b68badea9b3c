//! Nodes: the named handle every endpoint is created from.

use std::sync::Arc;
use std::time::Duration;

use demo_types::{Message, MwError, RequestHeader, ServiceType};
use tracing::info;

use crate::client::Client;
use crate::context::Context;
use crate::names::{expand_name, validate_node_name};
use crate::publisher::Publisher;
use crate::qos::QoS;
use crate::service::{Service, TypedServer};
use crate::subscription::Subscription;
use crate::timer::WallTimer;

/// A named participant in the graph.
#[derive(Clone)]
pub struct Node {
    name: String,
    context: Context,
}

impl Node {
    /// Create a node called `name` on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`MwError::InvalidName`] if `name` is not a single valid
    /// token, and [`MwError::ShutdownRequested`] if the context is already
    /// shut down.
    pub fn new(name: &str, context: &Context) -> Result<Self, MwError> {
        validate_node_name(name)?;
        if !context.ok() {
            return Err(MwError::ShutdownRequested);
        }
        info!(node = name, "node created");
        Ok(Self {
            name: name.to_string(),
            context: context.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn create_publisher<M: Message>(
        &self,
        topic: &str,
        qos: QoS,
    ) -> Result<Publisher<M>, MwError> {
        let topic = expand_name(topic)?;
        let sender = self
            .context
            .graph()
            .add_publisher(&topic, M::TYPE_NAME, qos.depth())?;
        info!(node = %self.name, topic = %topic, msg_type = M::TYPE_NAME, "publisher created");
        Ok(Publisher::new(topic, sender, self.context.clone()))
    }

    pub fn create_subscription<M: Message>(
        &self,
        topic: &str,
        qos: QoS,
    ) -> Result<Subscription<M>, MwError> {
        let topic = expand_name(topic)?;
        let receiver = self
            .context
            .graph()
            .add_subscription(&topic, M::TYPE_NAME, qos.depth())?;
        info!(node = %self.name, topic = %topic, msg_type = M::TYPE_NAME, "subscription created");
        Ok(Subscription::new(topic, receiver, self.context.clone()))
    }

    /// Create a client.  The service does not need to exist yet.
    pub fn create_client<S: ServiceType>(&self, service: &str) -> Result<Client<S>, MwError> {
        let service = expand_name(service)?;
        info!(node = %self.name, service = %service, srv_type = S::TYPE_NAME, "client created");
        Ok(Client::new(service, self.context.clone()))
    }

    /// Register `handler` as the server for `service`.
    ///
    /// # Errors
    ///
    /// Returns [`MwError::ServiceAlreadyExists`] when another server already
    /// owns the name.
    pub fn create_service<S, F>(&self, service: &str, handler: F) -> Result<Service<S>, MwError>
    where
        S: ServiceType,
        F: Fn(&RequestHeader, S::Request) -> S::Response + Send + Sync + 'static,
    {
        let service = expand_name(service)?;
        let server = Arc::new(TypedServer::<S, F>::new(service.clone(), handler));
        self.context
            .graph()
            .add_service(&service, S::TYPE_NAME, server)?;
        info!(node = %self.name, service = %service, srv_type = S::TYPE_NAME, "service created");
        Ok(Service::new(service, self.context.clone()))
    }

    /// Create a timer firing every `period`.  Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MwError::InvalidArgument`] for a zero period.
    pub fn create_wall_timer(&self, period: Duration) -> Result<WallTimer, MwError> {
        if period.is_zero() {
            return Err(MwError::InvalidArgument(
                "timer period must be non-zero".to_string(),
            ));
        }
        Ok(WallTimer::new(period, self.context.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo_types::{AddTwoInts, AddTwoIntsRequest, AddTwoIntsResponse, StringMsg};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::serialized::{SerializedMessage, serialize};

    fn adder(_header: &RequestHeader, request: AddTwoIntsRequest) -> AddTwoIntsResponse {
        AddTwoIntsResponse {
            sum: request.a.wrapping_add(request.b),
        }
    }

    #[test]
    fn node_names_are_validated() {
        let ctx = Context::new();
        assert!(Node::new("talker", &ctx).is_ok());
        assert!(matches!(Node::new("bad name", &ctx), Err(MwError::InvalidName { .. })));
    }

    #[test]
    fn node_cannot_be_created_after_shutdown() {
        let ctx = Context::new();
        ctx.shutdown();
        assert!(matches!(Node::new("late", &ctx), Err(MwError::ShutdownRequested)));
    }

    #[tokio::test]
    async fn published_message_reaches_subscription() {
        let ctx = Context::new();
        let node = Node::new("pubsub", &ctx).unwrap();
        let mut sub = node
            .create_subscription::<StringMsg>("chatter", QoS::default())
            .unwrap();
        let publisher = node
            .create_publisher::<StringMsg>("/chatter", QoS::keep_last(7))
            .unwrap();

        assert_eq!(publisher.subscription_count(), 1);
        assert_eq!(publisher.publish(&StringMsg::new("hello")).unwrap(), 1);

        let (msg, info) = sub.recv().await.unwrap();
        assert_eq!(msg.data, "hello");
        assert_eq!(info.publisher_gid, publisher.gid());
        assert_eq!(info.sequence_number, 1);
    }

    #[tokio::test]
    async fn serialized_publish_delivers_identical_bytes() {
        let ctx = Context::new();
        let node = Node::new("raw", &ctx).unwrap();
        let mut sub = node
            .create_subscription::<StringMsg>("chatter", QoS::default())
            .unwrap();
        let publisher = node
            .create_publisher::<StringMsg>("chatter", QoS::default())
            .unwrap();

        let mut out = SerializedMessage::with_capacity(0).unwrap();
        serialize(&StringMsg::new("raw bytes"), &mut out).unwrap();
        publisher.publish_serialized(&out).unwrap();

        let (received, _) = sub.recv_serialized().await.unwrap();
        assert_eq!(received.as_bytes().unwrap(), out.as_bytes().unwrap());
    }

    #[test]
    fn publishing_without_subscribers_is_not_an_error() {
        let ctx = Context::new();
        let node = Node::new("lonely", &ctx).unwrap();
        let publisher = node
            .create_publisher::<StringMsg>("chatter", QoS::default())
            .unwrap();
        assert_eq!(publisher.publish(&StringMsg::new("anyone?")).unwrap(), 0);
    }

    #[test]
    fn publishing_after_shutdown_fails() {
        let ctx = Context::new();
        let node = Node::new("late", &ctx).unwrap();
        let publisher = node
            .create_publisher::<StringMsg>("chatter", QoS::default())
            .unwrap();
        ctx.shutdown();
        assert_eq!(
            publisher.publish(&StringMsg::new("x")),
            Err(MwError::ShutdownRequested)
        );
    }

    #[test]
    fn dropping_endpoints_unregisters_them() {
        let ctx = Context::new();
        let node = Node::new("scoped", &ctx).unwrap();
        {
            let _publisher = node
                .create_publisher::<StringMsg>("chatter", QoS::default())
                .unwrap();
            let _service = node
                .create_service::<AddTwoInts, _>("add_two_ints", adder)
                .unwrap();
            assert_eq!(ctx.graph().publisher_count("chatter"), 1);
            assert!(ctx.graph().service_is_available("add_two_ints"));
        }
        assert!(ctx.graph().topic_names().is_empty());
        assert!(ctx.graph().service_names().is_empty());
    }

    #[tokio::test]
    async fn request_roundtrip_invokes_callback() {
        let ctx = Context::new();
        let node = Node::new("adder", &ctx).unwrap();
        let _service = node
            .create_service::<AddTwoInts, _>("add_two_ints", adder)
            .unwrap();
        let client = node.create_client::<AddTwoInts>("add_two_ints").unwrap();
        assert!(client.service_is_ready());

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let pending = client
            .async_send_request(AddTwoIntsRequest { a: 2, b: 3 }, move |result| {
                assert_eq!(result.unwrap().sum, 5);
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(pending.sequence_number(), 1);
        assert_eq!(pending.wait().await.unwrap().sum, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn request_without_server_reports_unavailable() {
        let ctx = Context::new();
        let node = Node::new("orphan", &ctx).unwrap();
        let client = node.create_client::<AddTwoInts>("nobody_home").unwrap();
        let pending = client
            .async_send_request(AddTwoIntsRequest { a: 1, b: 1 }, |result| {
                assert!(matches!(result, Err(MwError::ServiceUnavailable(_))));
            })
            .unwrap();
        assert!(matches!(pending.wait().await, Err(MwError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn wait_for_service_times_out_then_sees_late_server() {
        let ctx = Context::new();
        let node = Node::new("waiter", &ctx).unwrap();
        let client = node.create_client::<AddTwoInts>("late_service").unwrap();
        assert!(!client.wait_for_service(Duration::from_millis(20)).await);

        let server_node = node.clone();
        let registration = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            server_node
                .create_service::<AddTwoInts, _>("late_service", adder)
                .unwrap()
        });
        assert!(client.wait_for_service(Duration::from_secs(2)).await);
        drop(registration.await.unwrap());
    }

    #[tokio::test]
    async fn wait_for_service_returns_early_on_shutdown() {
        let ctx = Context::new();
        let node = Node::new("impatient", &ctx).unwrap();
        let client = node.create_client::<AddTwoInts>("never").unwrap();

        let stopper = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stopper.shutdown();
        });
        let waited = tokio::time::timeout(
            Duration::from_secs(2),
            client.wait_for_service(Duration::from_secs(30)),
        )
        .await
        .expect("shutdown must interrupt the wait");
        assert!(!waited);
    }

    #[tokio::test]
    async fn timer_ticks_until_shutdown() {
        let ctx = Context::new();
        let node = Node::new("ticker", &ctx).unwrap();
        let mut timer = node.create_wall_timer(Duration::from_millis(5)).unwrap();
        assert!(timer.tick().await);
        assert!(timer.tick().await);
        ctx.shutdown();
        assert!(!timer.tick().await);
    }

    #[test]
    fn zero_period_timer_is_rejected() {
        let ctx = Context::new();
        let node = Node::new("ticker", &ctx).unwrap();
        assert!(matches!(
            node.create_wall_timer(Duration::ZERO),
            Err(MwError::InvalidArgument(_))
        ));
    }
}
