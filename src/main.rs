mod avg_range;
mod config;
mod error;
mod store;
mod timeline;

use std::process::exit;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::format::FmtSpan, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::Opt, error::Result, timeline::Timeline};

async fn run(opt: &Opt) -> Result<()> {
    let events = store::load_events(&opt.input_file).await?;
    let timeline = Timeline::new(&events)?;
    // Nothing is written unless the whole sweep succeeded.
    let records = timeline.sweep(opt.window_size);
    store::write_records(&opt.output_file, &records).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Bad arguments exit here, before anything is read.
    let opt = Opt::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(&opt).await {
        error!("Failed to average {}: {}", opt.input_file.display(), err);
        exit(1);
    }
    info!("Done");
}
