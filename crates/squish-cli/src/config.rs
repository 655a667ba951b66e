//! Command-line configuration for the `squish` binary.
//!
//! Every option can also be set through an environment variable with the
//! `SQUISH_` prefix:
//!
//! - `SQUISH_TARGET_KB` - Target size in KB (required)
//! - `SQUISH_OUTPUT` - Output path (default: `compressed-<name>` next to the input)
//! - `SQUISH_ALLOW_DOWNSCALE` - Allow reducing resolution (default: false)
//! - `SQUISH_TOLERANCE` - Accepted shortfall below the target (default: 0.02)
//! - `SQUISH_MAX_CALLS` - Maximum number of encodes (default: 100)
//! - `SQUISH_MIN_SCALE` - Smallest scale the fallback may use (default: 0.1)

use std::path::PathBuf;

use clap::Parser;
use squish_core::{download_name, SearchConfig};

// =============================================================================
// Default Values
// =============================================================================

/// Default accepted shortfall below the target, as a fraction.
pub const DEFAULT_TOLERANCE: f32 = 0.02;

/// Default maximum number of encodes per image.
pub const DEFAULT_MAX_CALLS: u32 = 100;

/// Default smallest scale for the resolution fallback.
pub const DEFAULT_MIN_SCALE: f32 = 0.1;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Squish - compress an image to a target file size.
///
/// Searches for the highest JPEG/PNG quality that fits under the target and
/// writes the result next to the input.
#[derive(Parser, Debug, Clone)]
#[command(name = "squish")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Image to compress (JPEG or PNG, at most 10 MB).
    pub input: PathBuf,

    /// Target size in KB (1 KB = 1024 bytes).
    #[arg(short, long, env = "SQUISH_TARGET_KB")]
    pub target_kb: u64,

    /// Where to write the result.
    ///
    /// Defaults to `compressed-<input name>` in the input's directory.
    #[arg(short, long, env = "SQUISH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Reduce resolution when quality alone can't reach the target.
    #[arg(long, default_value_t = false, env = "SQUISH_ALLOW_DOWNSCALE")]
    pub allow_downscale: bool,

    /// Stop once the result is within this fraction below the target.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE, env = "SQUISH_TOLERANCE")]
    pub tolerance: f32,

    /// Maximum number of encodes.
    #[arg(long, default_value_t = DEFAULT_MAX_CALLS, env = "SQUISH_MAX_CALLS")]
    pub max_calls: u32,

    /// Smallest scale the resolution fallback may use.
    #[arg(long, default_value_t = DEFAULT_MIN_SCALE, env = "SQUISH_MIN_SCALE")]
    pub min_scale: f32,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Validate the arguments and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.target_kb == 0 {
            return Err("target size must be greater than 0 KB".to_string());
        }

        self.search_config().validate().map_err(|e| e.to_string())
    }

    /// Search policy built from the defaults and the given flags.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            tolerance: self.tolerance,
            max_oracle_calls: self.max_calls,
            scale_fallback: self.allow_downscale,
            min_scale: self.min_scale,
            ..SearchConfig::default()
        }
    }

    /// Output path, `compressed-<name>` beside the input unless given.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => {
                let name = self.input.file_name().and_then(|name| name.to_str());
                self.input.with_file_name(download_name(name))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cli() -> Cli {
        Cli {
            input: PathBuf::from("photos/beach.jpg"),
            target_kb: 500,
            output: None,
            allow_downscale: false,
            tolerance: DEFAULT_TOLERANCE,
            max_calls: DEFAULT_MAX_CALLS,
            min_scale: DEFAULT_MIN_SCALE,
            verbose: false,
        }
    }

    #[test]
    fn test_valid_cli() {
        assert!(test_cli().validate().is_ok());
    }

    #[test]
    fn test_zero_target_rejected() {
        let mut cli = test_cli();
        cli.target_kb = 0;

        let result = cli.validate();
        assert!(result.unwrap_err().contains("greater than 0"));
    }

    #[test]
    fn test_bad_tolerance_rejected() {
        let mut cli = test_cli();
        cli.tolerance = 1.5;

        let result = cli.validate();
        assert!(result.unwrap_err().contains("tolerance"));
    }

    #[test]
    fn test_search_config_from_flags() {
        let mut cli = test_cli();
        cli.allow_downscale = true;
        cli.max_calls = 30;

        let config = cli.search_config();
        assert!(config.scale_fallback);
        assert_eq!(config.max_oracle_calls, 30);
        assert_eq!(config.max_quality, SearchConfig::default().max_quality);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            test_cli().output_path(),
            PathBuf::from("photos/compressed-beach.jpg")
        );

        let mut cli = test_cli();
        cli.output = Some(PathBuf::from("out.jpg"));
        assert_eq!(cli.output_path(), PathBuf::from("out.jpg"));
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "squish",
            "in.png",
            "--target-kb",
            "200",
            "--allow-downscale",
            "--max-calls",
            "40",
        ])
        .unwrap();

        assert_eq!(cli.input, PathBuf::from("in.png"));
        assert_eq!(cli.target_kb, 200);
        assert!(cli.allow_downscale);
        assert_eq!(cli.max_calls, 40);
        assert_eq!(cli.output_path(), PathBuf::from("compressed-in.png"));
    }
}
