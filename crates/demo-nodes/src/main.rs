//! `demo_nodes` – runs one or more demo components in a single process.
//!
//! ```text
//! demo_nodes <component>... [node options]
//! demo_nodes add_two_ints_server add_two_ints_client -s my_service
//! demo_nodes serialized_message_talker serialized_message_listener -t raw
//! ```
//!
//! Every argument up to the first one starting with `-` names a component.
//! The remaining arguments are handed to each component unchanged.

use std::process::ExitCode;

use colored::Colorize;
use demo_middleware::Context;
use demo_nodes::{ComponentRegistry, Config, NodeOptions, config, run_components, telemetry};
use demo_types::MwError;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let _telemetry = telemetry::init_tracing("demo_nodes");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let split = args
        .iter()
        .position(|arg| arg.starts_with('-'))
        .unwrap_or(args.len());
    let (names, node_args) = args.split_at(split);
    let options = NodeOptions::new(node_args.iter().cloned());

    let registry = ComponentRegistry::with_demo_nodes();
    if names.is_empty() {
        print_usage(&registry);
        return if options.has_flag("-h") {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let config = config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load config, using defaults");
        Config::default()
    });

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build the Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let context = Context::new();
    let ctrlc_context = context.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "Ctrl-C received, shutting down".yellow().bold());
        ctrlc_context.shutdown();
    }) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let result = runtime.block_on(run(&registry, names, &context, &options, &config));
    context.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "demo_nodes failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    registry: &ComponentRegistry,
    names: &[String],
    context: &Context,
    options: &NodeOptions,
    config: &Config,
) -> Result<(), MwError> {
    let mut components = Vec::with_capacity(names.len());
    for name in names {
        match registry.create(name, context, options, config)? {
            Some(component) => components.push(component),
            None => info!(component = %name, "component chose not to run"),
        }
    }
    run_components(components, context).await
}

fn print_usage(registry: &ComponentRegistry) {
    println!("{}", "Usage: demo_nodes <component>... [options]".bold());
    println!("components:");
    for name in registry.names() {
        println!("  {}", name.cyan());
    }
    println!("Pass -h after a component name to see its options.");
}
