use bfscan::commands::run::{self, RunArgs};
use clap::Parser;
use std::env;

#[derive(Parser, Debug)]
#[command(name = "bfscan", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bfscan"));

    bfscan::logging::init();

    let cli = Cli::parse();
    std::process::exit(run::run(&program, cli.args));
}
