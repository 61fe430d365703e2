// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - CLI Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Command line interface of the relay binary. Configuration comes from
//   the --config flag, the BABELON_CONFIG environment variable, or pure
//   environment-variable configuration when neither is present.
//
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

/// Returns the crate version, with extra info appended if supplied.
///
/// Set `BABELON_VERSION_EXTRA` at build time to include it in parenthesis
/// after the SemVer version; a common value is a git commit hash.
pub fn version() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("BABELON_VERSION_EXTRA") {
        Some(extra) => format!("{version} ({extra})"),
        None => version.to_string(),
    }
}

/// Command line arguments for the relay
#[derive(Debug, Parser)]
#[command(name = "babelon", version, about = "Real-time multilingual chat relay")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "BABELON_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_contains_package_version() {
        assert!(version().contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_args_parse_with_config_flag() {
        let args = Args::parse_from(["babelon", "--config", "/etc/babelon.toml"]);
        assert_eq!(
            args.config.as_deref(),
            Some(std::path::Path::new("/etc/babelon.toml"))
        );
    }
}
