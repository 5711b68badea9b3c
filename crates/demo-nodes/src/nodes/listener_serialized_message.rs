//! Listener that receives raw serialized frames and decodes them by hand.

use async_trait::async_trait;
use colored::Colorize;
use demo_middleware::{Context, Node, QoS, SerializedMessage, Subscription, deserialize};
use demo_types::{MwError, StringMsg};
use tracing::error;

use crate::config::Config;
use crate::container::Component;
use crate::nodes::hex_dump;
use crate::options::NodeOptions;

pub const COMPONENT_NAME: &str = "serialized_message_listener";
pub const DEFAULT_TOPIC_NAME: &str = "chatter";

pub struct SerializedMessageListener {
    subscription: Subscription<StringMsg>,
}

impl SerializedMessageListener {
    /// Build the node, or print usage and shut down when `-h` is given.
    pub fn new(
        context: &Context,
        options: &NodeOptions,
        config: &Config,
    ) -> Result<Option<Self>, MwError> {
        if options.has_flag("-h") {
            print_usage();
            context.shutdown();
            return Ok(None);
        }
        let topic_name = options.flag_value("-t").unwrap_or(DEFAULT_TOPIC_NAME);

        let node = Node::new(COMPONENT_NAME, context)?;
        let subscription = node
            .create_subscription::<StringMsg>(topic_name, QoS::keep_last(config.listener_qos_depth))?;
        Ok(Some(Self { subscription }))
    }

    pub fn topic_name(&self) -> &str {
        self.subscription.topic_name()
    }

    /// Print one received frame, then decode and print its content.
    ///
    /// Returns the decoded message, or `None` if the bytes are not a valid
    /// string message.
    pub fn handle_frame(&self, serialized: &SerializedMessage) -> Option<StringMsg> {
        println!("I heard data of length: {}", serialized.buffer_length());
        if let Ok(bytes) = serialized.as_bytes() {
            println!("{}", hex_dump(bytes));
        }

        match deserialize::<StringMsg>(serialized) {
            Ok(msg) => {
                println!("serialized data after deserialization: {}", msg.data);
                Some(msg)
            }
            Err(e) => {
                error!(node = COMPONENT_NAME, error = %e, "failed to deserialize serialized message");
                None
            }
        }
    }
}

#[async_trait]
impl Component for SerializedMessageListener {
    fn component_name(&self) -> &'static str {
        COMPONENT_NAME
    }

    async fn spin(self: Box<Self>) -> Result<(), MwError> {
        let mut listener = self;
        while let Some((serialized, _info)) = listener.subscription.recv_serialized().await {
            listener.handle_frame(&serialized);
        }
        Ok(())
    }
}

pub(crate) fn factory(
    context: &Context,
    options: &NodeOptions,
    config: &Config,
) -> Result<Option<Box<dyn Component>>, MwError> {
    Ok(SerializedMessageListener::new(context, options, config)?
        .map(|node| Box::new(node) as Box<dyn Component>))
}

fn print_usage() {
    println!("{}", "Usage for listener app:".bold());
    println!("listener [-t topic_name] [-h]");
    println!("options:");
    println!("-h : Print this help function.");
    println!("-t topic_name : Specify the topic on which to subscribe. Defaults to chatter.");
}
