//! `add_two_ints` server – the peer the client example talks to.

use async_trait::async_trait;
use colored::Colorize;
use demo_middleware::{Context, Node, Service};
use demo_types::{AddTwoInts, AddTwoIntsRequest, AddTwoIntsResponse, MwError, RequestHeader};
use tracing::info;

use crate::config::Config;
use crate::container::Component;
use crate::options::NodeOptions;

pub const COMPONENT_NAME: &str = "add_two_ints_server";
pub const DEFAULT_SERVICE_NAME: &str = "add_two_ints";

pub struct AddTwoIntsServer {
    node: Node,
    service: Service<AddTwoInts>,
}

impl AddTwoIntsServer {
    /// Build the node, or print usage and shut down when `-h` is given.
    pub fn new(
        context: &Context,
        options: &NodeOptions,
        _config: &Config,
    ) -> Result<Option<Self>, MwError> {
        if options.has_flag("-h") {
            print_usage();
            context.shutdown();
            return Ok(None);
        }
        let service_name = options.flag_value("-s").unwrap_or(DEFAULT_SERVICE_NAME);

        let node = Node::new(COMPONENT_NAME, context)?;
        let service = node.create_service::<AddTwoInts, _>(service_name, handle_add_two_ints)?;
        Ok(Some(Self { node, service }))
    }

    pub fn service_name(&self) -> &str {
        self.service.service_name()
    }
}

fn handle_add_two_ints(header: &RequestHeader, request: AddTwoIntsRequest) -> AddTwoIntsResponse {
    info!(
        node = COMPONENT_NAME,
        sequence_number = header.sequence_number,
        "Incoming request\na: {} b: {}",
        request.a,
        request.b
    );
    AddTwoIntsResponse {
        sum: request.a.wrapping_add(request.b),
    }
}

#[async_trait]
impl Component for AddTwoIntsServer {
    fn component_name(&self) -> &'static str {
        COMPONENT_NAME
    }

    async fn spin(self: Box<Self>) -> Result<(), MwError> {
        self.node.context().shutdown_requested().await;
        Ok(())
    }
}

pub(crate) fn factory(
    context: &Context,
    options: &NodeOptions,
    config: &Config,
) -> Result<Option<Box<dyn Component>>, MwError> {
    Ok(AddTwoIntsServer::new(context, options, config)?.map(|node| Box::new(node) as Box<dyn Component>))
}

fn print_usage() {
    println!("{}", "Usage for add_two_ints_server app:".bold());
    println!("add_two_ints_server [-s service_name] [-h]");
    println!("options:");
    println!("-h : Print this help function.");
    println!("-s service_name : Specify the service name for this server. Defaults to add_two_ints.");
}
