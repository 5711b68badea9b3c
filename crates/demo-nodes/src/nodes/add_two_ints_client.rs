//! Asynchronous `add_two_ints` client.
//!
//! Waits for the service, sends `2 + 3` once, logs the sum from the response
//! callback and shuts the context down.

use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use demo_middleware::{Client, Context, Node, PendingRequest};
use demo_types::{AddTwoInts, AddTwoIntsRequest, MwError};
use tracing::{error, info};

use crate::config::Config;
use crate::container::Component;
use crate::options::NodeOptions;

pub const COMPONENT_NAME: &str = "add_two_ints_client";
pub const DEFAULT_SERVICE_NAME: &str = "add_two_ints";

pub struct AddTwoIntsClient {
    node: Node,
    client: Client<AddTwoInts>,
    wait_timeout: Duration,
}

impl AddTwoIntsClient {
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
        let service_name = options.flag_value("-s").unwrap_or(DEFAULT_SERVICE_NAME);

        let node = Node::new(COMPONENT_NAME, context)?;
        let client = node.create_client::<AddTwoInts>(service_name)?;
        Ok(Some(Self {
            node,
            client,
            wait_timeout: config.service_wait_timeout(),
        }))
    }

    pub fn service_name(&self) -> &str {
        self.client.service_name()
    }

    /// Wait for the service and send the request.
    ///
    /// Returns `None` without sending anything if the context shuts down
    /// while waiting.
    pub async fn queue_async_request(&self) -> Result<Option<PendingRequest<AddTwoInts>>, MwError> {
        while !self.client.wait_for_service(self.wait_timeout).await {
            if !self.node.context().ok() {
                error!(node = COMPONENT_NAME, "Interrupted while waiting for the service. Exiting.");
                return Ok(None);
            }
            info!(node = COMPONENT_NAME, "service not available, waiting again...");
        }

        let request = AddTwoIntsRequest { a: 2, b: 3 };
        let context = self.node.context().clone();
        let pending = self.client.async_send_request(request, move |result| {
            match result {
                Ok(response) => {
                    info!(node = COMPONENT_NAME, "Result of add_two_ints: {}", response.sum);
                }
                Err(e) => error!(node = COMPONENT_NAME, error = %e, "add_two_ints request failed"),
            }
            context.shutdown();
        })?;
        Ok(Some(pending))
    }
}

#[async_trait]
impl Component for AddTwoIntsClient {
    fn component_name(&self) -> &'static str {
        COMPONENT_NAME
    }

    async fn spin(self: Box<Self>) -> Result<(), MwError> {
        if let Some(pending) = self.queue_async_request().await? {
            // The callback already logged the outcome; an interrupted wait is
            // not a failure of this node.
            let _ = pending.wait().await;
        }
        Ok(())
    }
}

pub(crate) fn factory(
    context: &Context,
    options: &NodeOptions,
    config: &Config,
) -> Result<Option<Box<dyn Component>>, MwError> {
    Ok(AddTwoIntsClient::new(context, options, config)?.map(|node| Box::new(node) as Box<dyn Component>))
}

fn print_usage() {
    println!("{}", "Usage for add_two_ints_client app:".bold());
    println!("add_two_ints_client [-s service_name] [-h]");
    println!("options:");
    println!("-h : Print this help function.");
    println!("-s service_name : Specify the service name for client. Defaults to add_two_ints.");
}
