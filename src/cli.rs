//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Rip media galleries through a remote-controlled Chrome tab.
///
/// Tabrip opens the gallery page in a driven Chrome instance, finds every
/// downloadable asset, and captures the bytes straight out of the browser's
/// network stack.
#[derive(Parser, Debug)]
#[command(name = "tabrip")]
#[command(author, version, about)]
pub struct Args {
    /// URL of the gallery listing page
    #[arg(short, long)]
    pub url: Option<String>,

    /// Run the driven Chrome instance headless (pass false to watch it work)
    #[arg(long, action = clap::ArgAction::Set, value_name = "BOOL")]
    pub headless: Option<bool>,

    /// Directory downloads are written into (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Delay between downloads in milliseconds, overriding the site default (max 60000)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay: Option<u64>,

    /// Seconds to wait for a download's network request to finish (1-600)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub fetch_timeout: Option<u64>,

    /// Path to a JSON config file (default: $XDG_CONFIG_HOME/tabrip/config.json)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["tabrip"]).unwrap();
        assert!(args.url.is_none());
        assert!(args.headless.is_none());
        assert!(args.output_dir.is_none());
        assert!(args.delay.is_none());
        assert!(args.fetch_timeout.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_url_flag() {
        let args =
            Args::try_parse_from(["tabrip", "--url", "https://kemono.su/x/user/1/post/2"]).unwrap();
        assert_eq!(
            args.url.as_deref(),
            Some("https://kemono.su/x/user/1/post/2")
        );

        let args = Args::try_parse_from(["tabrip", "-u", "https://e-hentai.org/g/1/a/"]).unwrap();
        assert_eq!(args.url.as_deref(), Some("https://e-hentai.org/g/1/a/"));
    }

    #[test]
    fn test_cli_headless_takes_explicit_bool() {
        let args = Args::try_parse_from(["tabrip", "--headless", "false"]).unwrap();
        assert_eq!(args.headless, Some(false));

        let args = Args::try_parse_from(["tabrip", "--headless", "true"]).unwrap();
        assert_eq!(args.headless, Some(true));
    }

    #[test]
    fn test_cli_headless_rejects_non_bool() {
        let result = Args::try_parse_from(["tabrip", "--headless", "maybe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["tabrip", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["tabrip", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["tabrip", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_output_dir_flag() {
        let args = Args::try_parse_from(["tabrip", "-o", "/tmp/rips"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/rips")));
    }

    #[test]
    fn test_cli_delay_flag() {
        let args = Args::try_parse_from(["tabrip", "-l", "500"]).unwrap();
        assert_eq!(args.delay, Some(500));

        let args = Args::try_parse_from(["tabrip", "--delay", "0"]).unwrap();
        assert_eq!(args.delay, Some(0));
    }

    #[test]
    fn test_cli_delay_over_max_rejected() {
        let result = Args::try_parse_from(["tabrip", "-l", "60001"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_fetch_timeout_flag() {
        let args = Args::try_parse_from(["tabrip", "-t", "60"]).unwrap();
        assert_eq!(args.fetch_timeout, Some(60));
    }

    #[test]
    fn test_cli_fetch_timeout_zero_rejected() {
        let result = Args::try_parse_from(["tabrip", "-t", "0"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["tabrip", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["tabrip", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_combined_flags() {
        let args = Args::try_parse_from([
            "tabrip",
            "-u",
            "https://kemono.su/x/user/1/post/2",
            "-o",
            "out",
            "-l",
            "2000",
            "-t",
            "45",
            "--headless",
            "false",
        ])
        .unwrap();
        assert!(args.url.is_some());
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.delay, Some(2000));
        assert_eq!(args.fetch_timeout, Some(45));
        assert_eq!(args.headless, Some(false));
    }
}
