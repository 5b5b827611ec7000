use anyhow::Result;
use clap::Parser;
use saferoute_cli::{build_pipeline, render_failure, render_outcome, Args};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("saferoute_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let pipeline = build_pipeline(&args)?;

    match pipeline.run_detailed(args.origin, args.destination).await {
        Ok(outcome) => {
            println!("{}", render_outcome(&outcome, args.verbose, args.pretty)?);
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", render_failure(&failure, args.pretty)?);
            std::process::exit(1);
        }
    }
}
