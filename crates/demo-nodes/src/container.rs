//! Component registry and container.
//!
//! Each demo node registers a factory under its component name.  The
//! container builds the requested components on one [`Context`] and drives
//! them concurrently until every one of them has returned.
//!
//! A factory returns `Ok(None)` when the node decided not to run, which is
//! what `-h` does after printing its usage.

use std::collections::BTreeMap;

use async_trait::async_trait;
use demo_middleware::Context;
use demo_types::MwError;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::config::Config;
use crate::nodes::{
    add_two_ints_client, add_two_ints_server, listener_serialized_message,
    talker_serialized_message,
};
use crate::options::NodeOptions;

/// A node that can be loaded into the container.
#[async_trait]
pub trait Component: Send {
    /// Name the component is registered under.
    fn component_name(&self) -> &'static str;

    /// Drive the node until it is done or the context shuts down.
    async fn spin(self: Box<Self>) -> Result<(), MwError>;
}

/// Builds one component.
pub type ComponentFactory =
    fn(&Context, &NodeOptions, &Config) -> Result<Option<Box<dyn Component>>, MwError>;

/// Maps component names to factories.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<&'static str, ComponentFactory>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every demo node in this crate.
    pub fn with_demo_nodes() -> Self {
        let mut registry = Self::new();
        registry.register(add_two_ints_client::COMPONENT_NAME, add_two_ints_client::factory);
        registry.register(add_two_ints_server::COMPONENT_NAME, add_two_ints_server::factory);
        registry.register(
            talker_serialized_message::COMPONENT_NAME,
            talker_serialized_message::factory,
        );
        registry.register(
            listener_serialized_message::COMPONENT_NAME,
            listener_serialized_message::factory,
        );
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &'static str, factory: ComponentFactory) {
        self.factories.insert(name, factory);
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Build the component registered as `name`.
    ///
    /// # Errors
    ///
    /// [`MwError::UnknownComponent`] for an unregistered name, otherwise
    /// whatever the node's constructor reports.
    pub fn create(
        &self,
        name: &str,
        context: &Context,
        options: &NodeOptions,
        config: &Config,
    ) -> Result<Option<Box<dyn Component>>, MwError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| MwError::UnknownComponent(name.to_string()))?;
        factory(context, options, config)
    }
}

/// Spin `components` concurrently until all of them return.
///
/// The first component to fail shuts the context down, so the others wind
/// down too, and its error is returned once everything has stopped.
pub async fn run_components(
    components: Vec<Box<dyn Component>>,
    context: &Context,
) -> Result<(), MwError> {
    let mut tasks = JoinSet::new();
    for component in components {
        let name = component.component_name();
        info!(component = name, "starting component");
        tasks.spawn(async move { (name, component.spin().await) });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok((name, Ok(()))) => {
                info!(component = name, "component finished");
                continue;
            }
            Ok((name, Err(e))) => {
                error!(component = name, error = %e, "component failed");
                e
            }
            Err(e) => {
                error!(error = %e, "component task panicked");
                MwError::Channel(format!("component task failed: {e}"))
            }
        };
        context.shutdown();
        first_error.get_or_insert(outcome);
    }

    first_error.map_or(Ok(()), Err)
}
