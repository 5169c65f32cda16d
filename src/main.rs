use clap::Parser;
use poet::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.init_logger()?;
    cli.run()
}
