use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "slidemap",
    version,
    about = "Group lecture slides and turn them into notes, a summary and a mind map"
)]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    /// Configuration file; defaults to ./slidemap.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the text of every PDF page to its own markdown file.
    Extract {
        pdf: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Group the slides of a markdown directory and print the groups.
    Group {
        dir: Option<PathBuf>,
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Group, take notes, summarize and build the mind map.
    Summarize {
        #[arg(long, action = ArgAction::SetTrue)]
        clean: bool,
    },
    /// Validate a nodes/edges JSON file and write Graphviz DOT.
    Render {
        json: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
