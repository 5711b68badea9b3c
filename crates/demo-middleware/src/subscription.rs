//! Typed subscriptions.

use std::marker::PhantomData;

use demo_types::{Message, MessageInfo};
use tokio::sync::broadcast;
use tracing::warn;

use crate::context::Context;
use crate::graph::Frame;
use crate::serialized::{SerializedMessage, deserialize};

/// Receives messages of type `M` from one topic.
///
/// Dropping the subscription removes it from the graph.
pub struct Subscription<M: Message> {
    topic: String,
    receiver: broadcast::Receiver<Frame>,
    context: Context,
    _message: PhantomData<fn() -> M>,
}

impl<M: Message> Subscription<M> {
    pub(crate) fn new(topic: String, receiver: broadcast::Receiver<Frame>, context: Context) -> Self {
        Self {
            topic,
            receiver,
            context,
            _message: PhantomData,
        }
    }

    /// Fully qualified topic name.
    pub fn topic_name(&self) -> &str {
        &self.topic
    }

    /// Wait for the next frame and hand it over still serialized.
    ///
    /// Returns `None` once the context shuts down.  Frames lost because this
    /// subscription fell behind its QoS depth are logged and skipped.
    pub async fn recv_serialized(&mut self) -> Option<(SerializedMessage, MessageInfo)> {
        loop {
            tokio::select! {
                _ = self.context.shutdown_requested() => return None,
                result = self.receiver.recv() => match result {
                    Ok(frame) => {
                        return Some((SerializedMessage::from_bytes(&frame.payload), frame.info));
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(topic = %self.topic, lagged_by = n, "subscription lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
            }
        }
    }

    /// Wait for the next frame that decodes as `M`.
    ///
    /// Frames that fail to decode are logged and skipped.
    pub async fn recv(&mut self) -> Option<(M, MessageInfo)> {
        loop {
            let (serialized, info) = self.recv_serialized().await?;
            match deserialize::<M>(&serialized) {
                Ok(message) => return Some((message, info)),
                Err(e) => {
                    warn!(topic = %self.topic, error = %e, "dropping undecodable frame");
                }
            }
        }
    }
}

impl<M: Message> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.context.graph().remove_subscription(&self.topic);
    }
}
