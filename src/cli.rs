// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build static-site assets from a declarative task plan, with watch and live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Relative task paths are resolved against the directory holding it.
    #[arg(long, global = true, value_name = "PATH", default_value = "Assetdag.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks, plans and watch bindings, but don't run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Clean, run the `develop` plan, then serve the output and watch sources.
    Develop {
        /// Override `[server].port`.
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,

        /// Watch and rebuild without starting the dev server.
        #[arg(long)]
        no_server: bool,

        /// Ignore the incremental filter and reprocess every input.
        #[arg(long)]
        force: bool,
    },

    /// Clean, run the `build` plan once and exit.
    Build {
        /// Ignore the incremental filter and reprocess every input.
        #[arg(long)]
        force: bool,
    },

    /// Remove the build directory.
    Clean,

    /// Run the named tasks (or plans) once, in parallel, without cleaning.
    Run {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,

        #[arg(long)]
        force: bool,
    },

    /// Write the default configuration to `--config`.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn develop_accepts_port_override() {
        let args = CliArgs::try_parse_from(["assetdag", "develop", "--port", "4000"]).unwrap();
        match args.command {
            Command::Develop { port, no_server, force } => {
                assert_eq!(port, Some(4000));
                assert!(!no_server);
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(args.config, "Assetdag.toml");
    }

    #[test]
    fn run_requires_at_least_one_name() {
        assert!(CliArgs::try_parse_from(["assetdag", "run"]).is_err());
        let args = CliArgs::try_parse_from(["assetdag", "run", "js", "html"]).unwrap();
        match args.command {
            Command::Run { names, .. } => assert_eq!(names, vec!["js", "html"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["assetdag", "build", "--config", "site/Assetdag.toml", "--dry-run"])
                .unwrap();
        assert!(args.dry_run);
        assert_eq!(args.config, "site/Assetdag.toml");
    }
}
