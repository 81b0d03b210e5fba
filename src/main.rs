use clap::Parser;
use pmp_scientist::cli::{self, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Demo(args) => cli::demo::run(args),
        Command::Settings => cli::settings::run(),
    }
}
