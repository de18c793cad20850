use clap::Parser;
use gradfund::cli::{run, Cli};
use gradfund::log::init_logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
