//! The graph: which topics and services exist, with which types, and who is
//! attached to them.
//!
//! Endpoints register here when they are created and unregister when they are
//! dropped.  Every change bumps a generation counter so that
//! [`Client::wait_for_service`][crate::Client::wait_for_service] can sleep
//! until something actually changes instead of polling.
//!
//! The read-only half of the API (`topic_names`, `publisher_count`, …) is what
//! tests use to check which endpoints a node really created.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use demo_types::{MessageInfo, MwError, RequestHeader};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::names::expand_name;

/// One published message as it travels between publisher and subscriptions.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub payload: Arc<[u8]>,
    pub info: MessageInfo,
}

/// Type-erased server side of a service, as seen by clients.
#[async_trait]
pub(crate) trait ServiceEndpoint: Send + Sync {
    /// Handle one CDR-encoded request and return the CDR-encoded response.
    async fn call(&self, header: RequestHeader, request: Arc<[u8]>) -> Result<Vec<u8>, MwError>;
}

struct TopicEntry {
    type_name: &'static str,
    depth: usize,
    sender: broadcast::Sender<Frame>,
    publishers: usize,
    subscriptions: usize,
}

struct ServiceEntry {
    type_name: &'static str,
    server: Arc<dyn ServiceEndpoint>,
}

#[derive(Default)]
struct GraphState {
    topics: HashMap<String, TopicEntry>,
    services: HashMap<String, ServiceEntry>,
}

/// Name registry shared by every node on a [`Context`][crate::Context].
pub struct Graph {
    state: Mutex<GraphState>,
    generation: watch::Sender<u64>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            state: Mutex::new(GraphState::default()),
            generation,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All topics with at least one endpoint, as `(name, type)` pairs sorted
    /// by name.
    pub fn topic_names(&self) -> Vec<(String, String)> {
        let state = self.state();
        let mut names: Vec<_> = state
            .topics
            .iter()
            .map(|(name, entry)| (name.clone(), entry.type_name.to_string()))
            .collect();
        names.sort();
        names
    }

    /// All services with a live server, as `(name, type)` pairs sorted by
    /// name.
    pub fn service_names(&self) -> Vec<(String, String)> {
        let state = self.state();
        let mut names: Vec<_> = state
            .services
            .iter()
            .map(|(name, entry)| (name.clone(), entry.type_name.to_string()))
            .collect();
        names.sort();
        names
    }

    /// Number of publishers on `topic`.  Relative names are expanded; invalid
    /// names have no publishers.
    pub fn publisher_count(&self, topic: &str) -> usize {
        self.with_topic(topic, |entry| entry.publishers)
    }

    /// Number of subscriptions on `topic`.
    pub fn subscription_count(&self, topic: &str) -> usize {
        self.with_topic(topic, |entry| entry.subscriptions)
    }

    /// Queue depth of `topic`'s channel, set by the first endpoint that
    /// registered on it.  `None` for a topic with no endpoints.
    pub fn topic_depth(&self, topic: &str) -> Option<usize> {
        let name = expand_name(topic).ok()?;
        self.state().topics.get(&name).map(|entry| entry.depth)
    }

    /// `true` when a server is registered for `service`.
    pub fn service_is_available(&self, service: &str) -> bool {
        let Ok(name) = expand_name(service) else {
            return false;
        };
        self.state().services.contains_key(&name)
    }

    // -----------------------------------------------------------------------
    // Registration (crate internal)
    // -----------------------------------------------------------------------

    /// Register a publisher on an already expanded topic name.
    pub(crate) fn add_publisher(
        &self,
        topic: &str,
        type_name: &'static str,
        depth: usize,
    ) -> Result<broadcast::Sender<Frame>, MwError> {
        let sender = {
            let mut state = self.state();
            let entry = Self::topic_entry(&mut state, topic, type_name, depth)?;
            entry.publishers += 1;
            entry.sender.clone()
        };
        debug!(topic, type_name, "publisher registered");
        self.bump();
        Ok(sender)
    }

    pub(crate) fn remove_publisher(&self, topic: &str) {
        self.release_topic(topic, |entry| entry.publishers = entry.publishers.saturating_sub(1));
    }

    /// Register a subscription on an already expanded topic name.
    pub(crate) fn add_subscription(
        &self,
        topic: &str,
        type_name: &'static str,
        depth: usize,
    ) -> Result<broadcast::Receiver<Frame>, MwError> {
        let receiver = {
            let mut state = self.state();
            let entry = Self::topic_entry(&mut state, topic, type_name, depth)?;
            entry.subscriptions += 1;
            entry.sender.subscribe()
        };
        debug!(topic, type_name, "subscription registered");
        self.bump();
        Ok(receiver)
    }

    pub(crate) fn remove_subscription(&self, topic: &str) {
        self.release_topic(topic, |entry| {
            entry.subscriptions = entry.subscriptions.saturating_sub(1)
        });
    }

    /// Register the single server for an already expanded service name.
    pub(crate) fn add_service(
        &self,
        service: &str,
        type_name: &'static str,
        server: Arc<dyn ServiceEndpoint>,
    ) -> Result<(), MwError> {
        {
            let mut state = self.state();
            if state.services.contains_key(service) {
                return Err(MwError::ServiceAlreadyExists(service.to_string()));
            }
            state
                .services
                .insert(service.to_string(), ServiceEntry { type_name, server });
        }
        debug!(service, type_name, "service registered");
        self.bump();
        Ok(())
    }

    pub(crate) fn remove_service(&self, service: &str) {
        let removed = self.state().services.remove(service).is_some();
        if removed {
            debug!(service, "service unregistered");
            self.bump();
        }
    }

    /// Look up the server for `service`, checking that its type matches.
    pub(crate) fn service_server(
        &self,
        service: &str,
        type_name: &'static str,
    ) -> Result<Arc<dyn ServiceEndpoint>, MwError> {
        let state = self.state();
        let entry = state
            .services
            .get(service)
            .ok_or_else(|| MwError::ServiceUnavailable(service.to_string()))?;
        if entry.type_name != type_name {
            return Err(MwError::TypeMismatch {
                name: service.to_string(),
                existing: entry.type_name.to_string(),
                requested: type_name.to_string(),
            });
        }
        Ok(Arc::clone(&entry.server))
    }

    /// Receiver that observes every graph change.
    pub(crate) fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn state(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    fn with_topic(&self, topic: &str, read: impl FnOnce(&TopicEntry) -> usize) -> usize {
        let Ok(name) = expand_name(topic) else {
            return 0;
        };
        self.state().topics.get(&name).map(read).unwrap_or(0)
    }

    fn topic_entry<'a>(
        state: &'a mut GraphState,
        topic: &str,
        type_name: &'static str,
        depth: usize,
    ) -> Result<&'a mut TopicEntry, MwError> {
        let entry = state.topics.entry(topic.to_string()).or_insert_with(|| {
            let depth = depth.max(1);
            let (sender, _) = broadcast::channel(depth);
            TopicEntry {
                type_name,
                depth,
                sender,
                publishers: 0,
                subscriptions: 0,
            }
        });
        if entry.type_name != type_name {
            return Err(MwError::TypeMismatch {
                name: topic.to_string(),
                existing: entry.type_name.to_string(),
                requested: type_name.to_string(),
            });
        }
        // A broadcast channel cannot grow, so later endpoints share the
        // first one's queue.
        if depth > entry.depth {
            warn!(
                topic,
                requested = depth,
                depth = entry.depth,
                "topic queue is shallower than requested"
            );
        }
        Ok(entry)
    }

    fn release_topic(&self, topic: &str, release: impl FnOnce(&mut TopicEntry)) {
        {
            let mut state = self.state();
            let Some(entry) = state.topics.get_mut(topic) else {
                return;
            };
            release(entry);
            if entry.publishers == 0 && entry.subscriptions == 0 {
                state.topics.remove(topic);
            }
        }
        debug!(topic, "topic endpoint unregistered");
        self.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ServiceEndpoint for Echo {
        async fn call(&self, _header: RequestHeader, request: Arc<[u8]>) -> Result<Vec<u8>, MwError> {
            Ok(request.to_vec())
        }
    }

    #[test]
    fn topic_lives_while_any_endpoint_does() {
        let graph = Graph::new();
        let _tx = graph.add_publisher("/chatter", "std_msgs/msg/String", 7).unwrap();
        let _rx = graph.add_subscription("/chatter", "std_msgs/msg/String", 10).unwrap();
        assert_eq!(graph.publisher_count("chatter"), 1);
        assert_eq!(graph.subscription_count("/chatter"), 1);

        graph.remove_publisher("/chatter");
        assert_eq!(
            graph.topic_names(),
            vec![("/chatter".to_string(), "std_msgs/msg/String".to_string())]
        );

        graph.remove_subscription("/chatter");
        assert!(graph.topic_names().is_empty());
    }

    #[test]
    fn first_endpoint_sizes_the_topic_queue() {
        let graph = Graph::new();
        let tx = graph.add_publisher("/chatter", "std_msgs/msg/String", 4).unwrap();
        let mut rx = graph.add_subscription("/chatter", "std_msgs/msg/String", 10).unwrap();
        assert_eq!(graph.topic_depth("chatter"), Some(4));
        assert_eq!(graph.topic_depth("/other"), None);

        // Ten frames into a queue of four: the subscription lags by six.
        for sequence_number in 1..=10 {
            tx.send(Frame {
                payload: Arc::from(&[][..]),
                info: MessageInfo {
                    publisher_gid: Default::default(),
                    sequence_number,
                    source_timestamp: chrono::Utc::now(),
                },
            })
            .unwrap();
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(6))
        ));
        assert_eq!(rx.try_recv().unwrap().info.sequence_number, 7);
    }

    #[test]
    fn topic_queue_outlives_the_endpoint_that_sized_it() {
        let graph = Graph::new();
        let _rx = graph.add_subscription("/chatter", "std_msgs/msg/String", 10).unwrap();
        let _tx = graph.add_publisher("/chatter", "std_msgs/msg/String", 7).unwrap();
        graph.remove_subscription("/chatter");
        assert_eq!(graph.topic_depth("/chatter"), Some(10));
        graph.remove_publisher("/chatter");
        assert_eq!(graph.topic_depth("/chatter"), None);
    }

    #[test]
    fn conflicting_topic_type_is_rejected() {
        let graph = Graph::new();
        let _tx = graph.add_publisher("/chatter", "std_msgs/msg/String", 7).unwrap();
        let result = graph.add_subscription("/chatter", "std_msgs/msg/Int64", 7);
        assert!(matches!(result, Err(MwError::TypeMismatch { .. })));
        assert_eq!(graph.subscription_count("/chatter"), 0);
    }

    #[test]
    fn only_one_server_per_service() {
        let graph = Graph::new();
        graph.add_service("/add_two_ints", "srv/A", Arc::new(Echo)).unwrap();
        let result = graph.add_service("/add_two_ints", "srv/A", Arc::new(Echo));
        assert!(matches!(result, Err(MwError::ServiceAlreadyExists(_))));
        assert!(graph.service_is_available("add_two_ints"));

        graph.remove_service("/add_two_ints");
        assert!(!graph.service_is_available("/add_two_ints"));
    }

    #[test]
    fn service_lookup_checks_type() {
        let graph = Graph::new();
        graph.add_service("/svc", "srv/A", Arc::new(Echo)).unwrap();
        assert!(graph.service_server("/svc", "srv/A").is_ok());
        assert!(matches!(
            graph.service_server("/svc", "srv/B"),
            Err(MwError::TypeMismatch { .. })
        ));
        assert!(matches!(
            graph.service_server("/other", "srv/A"),
            Err(MwError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn every_change_bumps_generation() {
        let graph = Graph::new();
        let rx = graph.subscribe_changes();
        let before = *rx.borrow();
        graph.add_service("/svc", "srv/A", Arc::new(Echo)).unwrap();
        graph.remove_service("/svc");
        assert_eq!(*rx.borrow(), before + 2);
    }

    #[test]
    fn invalid_query_names_report_nothing() {
        let graph = Graph::new();
        assert_eq!(graph.publisher_count("not a name"), 0);
        assert!(!graph.service_is_available(""));
    }
}
