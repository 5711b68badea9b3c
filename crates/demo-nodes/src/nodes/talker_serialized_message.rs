//! Talker that serializes its messages by hand.
//!
//! Every tick builds a `std_msgs/msg/String` reading `Hello World:<count>`,
//! encodes it into a reusable [`SerializedMessage`], prints both forms and
//! publishes the raw bytes.  An encoded string looks like
//!
//! ```text
//! 00 01 00 00   encapsulation: CDR, little endian
//! 0e 00 00 00   string length, terminator included
//! 48 65 6c ...  "Hello World:1"
//! 00            terminator
//! ```
//!
//! so the buffer is sized to the 8 header bytes plus the payload before
//! encoding and never has to grow underneath the codec.

use async_trait::async_trait;
use colored::Colorize;
use demo_middleware::{Context, Node, Publisher, QoS, SerializedMessage, WallTimer, serialize};
use demo_types::msg::STRING_MSG_HEADER_LEN;
use demo_types::{MwError, StringMsg};
use tracing::{debug, error};

use crate::config::Config;
use crate::container::Component;
use crate::nodes::hex_dump;
use crate::options::NodeOptions;

pub const COMPONENT_NAME: &str = "serialized_message_talker";
pub const DEFAULT_TOPIC_NAME: &str = "chatter";

/// Encodes a [`StringMsg`] into a serialized buffer.
pub type SerializeFn = fn(&StringMsg, &mut SerializedMessage) -> Result<(), MwError>;

pub struct SerializedMessageTalker {
    publisher: Publisher<StringMsg>,
    timer: WallTimer,
    serialized_msg: SerializedMessage,
    serialize_fn: SerializeFn,
    count: u64,
}

impl SerializedMessageTalker {
    /// Build the node with the middleware's own CDR encoder, or print usage
    /// and shut down when `-h` is given.
    pub fn new(
        context: &Context,
        options: &NodeOptions,
        config: &Config,
    ) -> Result<Option<Self>, MwError> {
        Self::with_serializer(context, options, config, serialize::<StringMsg>)
    }

    /// Like [`new`][Self::new] with a caller-supplied encoder.
    ///
    /// # Errors
    ///
    /// Failing to initialise the serialized buffer is fatal and returned
    /// as-is.
    pub fn with_serializer(
        context: &Context,
        options: &NodeOptions,
        config: &Config,
        serialize_fn: SerializeFn,
    ) -> Result<Option<Self>, MwError> {
        if options.has_flag("-h") {
            print_usage();
            context.shutdown();
            return Ok(None);
        }
        let topic_name = options.flag_value("-t").unwrap_or(DEFAULT_TOPIC_NAME);

        let node = Node::new(COMPONENT_NAME, context)?;
        let serialized_msg = SerializedMessage::with_capacity(0).inspect_err(|e| {
            error!(node = COMPONENT_NAME, error = %e, "failed to initialize serialized message");
        })?;
        let publisher =
            node.create_publisher::<StringMsg>(topic_name, QoS::keep_last(config.talker_qos_depth))?;
        let timer = node.create_wall_timer(config.publish_period())?;

        Ok(Some(Self {
            publisher,
            timer,
            serialized_msg,
            serialize_fn,
            count: 1,
        }))
    }

    pub fn topic_name(&self) -> &str {
        self.publisher.topic_name()
    }

    /// Counter value the next message will carry.
    pub fn next_count(&self) -> u64 {
        self.count
    }

    pub fn serialized_message(&self) -> &SerializedMessage {
        &self.serialized_msg
    }

    /// Build, encode, print and publish one message.
    ///
    /// An encoder failure is logged and the tick skipped.  A buffer resize
    /// failure is returned and ends the node.
    pub fn publish_message(&mut self) -> Result<(), MwError> {
        let string_msg = StringMsg::new(format!("Hello World:{}", self.count));
        self.count += 1;

        self.serialized_msg
            .resize(STRING_MSG_HEADER_LEN + string_msg.payload_len())
            .inspect_err(|e| {
                error!(node = COMPONENT_NAME, error = %e, "failed to resize serialized message");
            })?;

        if let Err(e) = (self.serialize_fn)(&string_msg, &mut self.serialized_msg) {
            error!(node = COMPONENT_NAME, error = %e, "failed to serialize serialized message");
            return Ok(());
        }

        let bytes = self.serialized_msg.as_bytes()?;
        println!("ROS message:");
        println!("{}", string_msg.data);
        println!("serialized message:");
        println!("{}", hex_dump(bytes));

        let delivered = self.publisher.publish_serialized(&self.serialized_msg)?;
        debug!(node = COMPONENT_NAME, delivered, "serialized message published");
        Ok(())
    }
}

impl Drop for SerializedMessageTalker {
    fn drop(&mut self) {
        if let Err(e) = self.serialized_msg.fini() {
            error!(node = COMPONENT_NAME, error = %e, "could not clean up memory for serialized message");
        }
    }
}

#[async_trait]
impl Component for SerializedMessageTalker {
    fn component_name(&self) -> &'static str {
        COMPONENT_NAME
    }

    async fn spin(self: Box<Self>) -> Result<(), MwError> {
        let mut talker = self;
        while talker.timer.tick().await {
            match talker.publish_message() {
                Ok(()) => {}
                // Shutdown landed between the tick and the publish.
                Err(MwError::ShutdownRequested) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

pub(crate) fn factory(
    context: &Context,
    options: &NodeOptions,
    config: &Config,
) -> Result<Option<Box<dyn Component>>, MwError> {
    Ok(SerializedMessageTalker::new(context, options, config)?
        .map(|node| Box::new(node) as Box<dyn Component>))
}

fn print_usage() {
    println!("{}", "Usage for talker app:".bold());
    println!("talker [-t topic_name] [-h]");
    println!("options:");
    println!("-h : Print this help function.");
    println!("-t topic_name : Specify the topic on which to publish. Defaults to chatter.");
}
