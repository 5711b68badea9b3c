//! Typed publishers.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use demo_types::codec;
use demo_types::{Message, MessageInfo, MwError};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::context::Context;
use crate::graph::Frame;
use crate::serialized::SerializedMessage;

/// Sends messages of type `M` on one topic.
///
/// Dropping the publisher removes it from the graph.
pub struct Publisher<M: Message> {
    topic: String,
    gid: Uuid,
    sequence: AtomicU64,
    sender: broadcast::Sender<Frame>,
    context: Context,
    _message: PhantomData<fn(M)>,
}

impl<M: Message> Publisher<M> {
    pub(crate) fn new(topic: String, sender: broadcast::Sender<Frame>, context: Context) -> Self {
        Self {
            topic,
            gid: Uuid::new_v4(),
            sequence: AtomicU64::new(0),
            sender,
            context,
            _message: PhantomData,
        }
    }

    /// Fully qualified topic name.
    pub fn topic_name(&self) -> &str {
        &self.topic
    }

    /// Globally unique identity stamped on every frame this publisher sends.
    pub fn gid(&self) -> Uuid {
        self.gid
    }

    /// Number of subscriptions currently matched on the topic.
    pub fn subscription_count(&self) -> usize {
        self.context.graph().subscription_count(&self.topic)
    }

    /// Serialize `message` and send it.
    ///
    /// Returns the number of subscriptions the frame was handed to; zero is
    /// normal when nobody is listening.
    pub fn publish(&self, message: &M) -> Result<usize, MwError> {
        self.send(codec::encode(message)?.into())
    }

    /// Send an already serialized message as-is.
    ///
    /// The bytes are not checked against `M`; sending a buffer of the wrong
    /// type is the caller's mistake and shows up as a decode failure on the
    /// receiving side.
    pub fn publish_serialized(&self, message: &SerializedMessage) -> Result<usize, MwError> {
        let bytes = message.as_bytes()?;
        self.send(Arc::from(bytes))
    }

    fn send(&self, payload: Arc<[u8]>) -> Result<usize, MwError> {
        if !self.context.ok() {
            return Err(MwError::ShutdownRequested);
        }
        let sequence_number = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let frame = Frame {
            payload,
            info: MessageInfo {
                publisher_gid: self.gid,
                sequence_number,
                source_timestamp: Utc::now(),
            },
        };
        // A send error only means there is no receiver right now.
        let delivered = self.sender.send(frame).unwrap_or(0);
        trace!(topic = %self.topic, sequence_number, delivered, "frame published");
        Ok(delivered)
    }
}

impl<M: Message> Drop for Publisher<M> {
    fn drop(&mut self) {
        self.context.graph().remove_publisher(&self.topic);
    }
}
