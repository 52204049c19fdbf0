//! Demo binary dispatching one request against the authentication feature.

mod cli;
mod demo;

use std::{error::Error, fs};

use clap::Parser;
use smartmocks::{
    DispatchConfig,
    Request,
    ScenarioRouter,
    middleware::{Recover, Service, TraceRequests, Transform},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let config = match &cli.config {
        Some(path) => DispatchConfig::from_json(&fs::read_to_string(path)?)?,
        None => DispatchConfig::default(),
    };

    #[cfg(feature = "metrics")]
    let metrics = if cli.metrics {
        Some(metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };
    #[cfg(not(feature = "metrics"))]
    if cli.metrics {
        tracing::warn!("built without the `metrics` feature; no counters to print");
    }

    let dispatcher = ScenarioRouter::new()
        .config(config)
        .feature(demo::authentication())?
        .build();

    let request = cli
        .headers
        .into_iter()
        .fold(Request::new(cli.method, cli.path), |request, (name, value)| {
            request.with_header(name, value)
        });
    let ctx = demo::registry().context(request);

    if cli.render {
        println!("{}", dispatcher.render_documentation(ctx.resolver())?);
        return Ok(());
    }

    let service = TraceRequests.transform(Recover::new(dispatcher)).await;
    let response = service.call(&ctx).await?;
    println!("{}", response.status());
    for (name, value) in response.headers() {
        println!("{name}: {value}");
    }
    println!();
    println!("{}", response.body_text());

    #[cfg(feature = "metrics")]
    if let Some(handle) = metrics {
        print!("\n{}", handle.render());
    }

    Ok(())
}
