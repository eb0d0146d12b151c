//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Explore a 3D graph with hand gestures over a camera feed.
#[derive(Parser, Debug)]
#[command(name = "gesture-graph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML config file; defaults are used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not read mode commands from stdin
    #[arg(long, global = true)]
    pub no_commands: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run live from the camera
    Run {
        /// Graph file (node-link/adjacency JSON or GraphML) instead of the sample graph
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },

    /// Drive the loop from recorded keypoints on blank frames
    Replay {
        /// JSON script: frames -> hands -> 21 [x, y] points
        #[arg(short, long)]
        script: PathBuf,

        /// Graph file (node-link/adjacency JSON or GraphML) instead of the sample graph
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Write the last rendered frame to this PNG
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_replay_with_global_flags() {
        let cli = Cli::try_parse_from([
            "gesture-graph",
            "replay",
            "--script",
            "moves.json",
            "--snapshot",
            "out.png",
            "--verbose",
            "--no-commands",
        ])
        .unwrap();
        assert!(cli.verbose && cli.no_commands);
        match cli.command {
            Commands::Replay {
                script,
                graph,
                snapshot,
            } => {
                assert_eq!(script, PathBuf::from("moves.json"));
                assert_eq!(snapshot, Some(PathBuf::from("out.png")));
                assert!(graph.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn replay_requires_script() {
        assert!(Cli::try_parse_from(["gesture-graph", "replay"]).is_err());
    }
}
