use clap::Parser;
use futures::{pin_mut, StreamExt};
use std::process;
use tracing::info;
use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::EnvFilter;

use pagediff::cli::{Args, OutputFormat};
use pagediff::{collect_results, create_formatter, open_source, PageDiffError, PaginationDiff, SourceConfig};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

async fn run() -> Result<(), PageDiffError> {
    // Parse command-line arguments
    let args = Args::parse();
    args.validate()?;

    init_logging(args.verbose);

    let config = args.load_config();
    let source_a = open_source(&args.source_a, &config)?;
    let source_b = open_source(&args.source_b, &config)?;

    info!(compare = %args.compare, buffer_size = args.buffer_size, "computing diff");
    let diff = PaginationDiff::new(
        SourceConfig::from_boxed(source_a, args.buffer_size),
        SourceConfig::from_boxed(source_b, args.buffer_size),
        args.compare.comparator(),
    );

    let formatter = create_formatter(args.format, args.compact);
    let batches = diff.into_stream();

    match args.format {
        OutputFormat::Changes => {
            let changes = collect_results(batches).await?;
            info!(added = changes.add.len(), removed = changes.remove.len(), "diff complete");
            println!("{}", formatter.format(&changes)?);
        }
        OutputFormat::Batches => {
            pin_mut!(batches);
            while let Some(batch) = batches.next().await {
                println!("{}", formatter.format(&batch?)?);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(Uptime::default())
        .with_writer(std::io::stderr)
        .init();
}
