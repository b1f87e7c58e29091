mod cli;
mod commands;
mod config;
mod logging;
mod run;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    let config = config::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Extract { pdf, out } => commands::extract(&config, &pdf, out),
        Command::Group { dir, json } => commands::group(&config, dir, json),
        Command::Summarize { clean } => run::summarize(&config, clean),
        Command::Render { json, out } => commands::render(&json, out),
    }
}
