//! Command line [`Args`].

use clap::Parser;

/// Lease management REST server.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file to load, missing one means defaults only.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Reads [`Args`] of the current process.
    ///
    /// # Errors
    ///
    /// If the command line is malformed.
    pub fn parse() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn defaults_config_path() {
        let args = Args::try_parse_from(["application"]).unwrap();
        assert_eq!(args.config, "config.toml");

        let args =
            Args::try_parse_from(["application", "-c", "prod.toml"]).unwrap();
        assert_eq!(args.config, "prod.toml");
    }
}
