use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[macro_use]
extern crate log;

mod cli;
mod color;
mod dedup;
mod error;
mod finalize;
mod geometry;
mod imagebuf;
mod io;
mod logger;
mod output;
mod pack;
mod render;
mod scheduler;
mod sprite;
mod transform;

use cli::PackArgs;

#[derive(Subcommand, Debug)]
enum Command {
    /// Pack a folder of sprite images into one or more sheet slices.
    Pack {
        #[clap(flatten)]
        args: PackArgs,
    },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    logger::init("info");
    info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let res = match args.command {
        Command::Pack { args } => args.execute(),
    };

    if let Err(err) = res {
        error!("{err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
