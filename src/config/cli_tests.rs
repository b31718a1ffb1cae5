//! Tests for CLI argument parsing.

use std::path::PathBuf;

use super::cli::{Cli, Command, ReplayArgs};

fn replay(args: &[&str]) -> ReplayArgs {
    let mut full_args = vec!["navwatch", "replay"];
    full_args.extend(args);
    match Cli::parse_from_iter(full_args).command {
        Command::Replay(args) => args,
        Command::Init { .. } => panic!("expected replay command"),
    }
}

mod init {
    use super::*;

    #[test]
    fn default_output_path() {
        let cli = Cli::parse_from_iter(["navwatch", "init"]);

        assert!(cli.is_init());
        assert!(matches!(
            cli.command,
            Command::Init { ref output } if output == &PathBuf::from("navwatch.toml")
        ));
    }

    #[test]
    fn custom_output_path() {
        let cli = Cli::parse_from_iter(["navwatch", "init", "-o", "custom.toml"]);

        assert!(matches!(
            cli.command,
            Command::Init { ref output } if output == &PathBuf::from("custom.toml")
        ));
    }
}

mod replay {
    use super::*;

    #[test]
    fn script_only() {
        let args = replay(&["script.toml"]);

        assert_eq!(args.script, PathBuf::from("script.toml"));
        assert!(args.config.is_none());
        assert!(args.poll_interval_ms.is_none());
        assert!(!args.no_poll);
        assert!(!args.no_history);
        assert!(args.events.is_empty());
    }

    #[test]
    fn all_options() {
        let args = replay(&[
            "script.toml",
            "--config",
            "navwatch.toml",
            "--poll-interval-ms",
            "250",
            "--no-poll",
            "--no-history",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("navwatch.toml")));
        assert_eq!(args.poll_interval_ms, Some(250));
        assert!(args.no_poll);
        assert!(args.no_history);
    }

    #[test]
    fn events_are_comma_separated() {
        let args = replay(&["script.toml", "--events", "popstate,hashchange"]);

        assert_eq!(args.events, vec!["popstate", "hashchange"]);
    }

    #[test]
    fn events_can_repeat() {
        let args = replay(&["s.toml", "--events", "popstate", "--events", "hashchange"]);

        assert_eq!(args.events.len(), 2);
    }

    #[test]
    fn missing_script_is_rejected() {
        let result = <Cli as clap::Parser>::try_parse_from(["navwatch", "replay"]);

        assert!(result.is_err());
    }
}

mod global {
    use super::*;

    #[test]
    fn verbose_before_subcommand() {
        let cli = Cli::parse_from_iter(["navwatch", "-v", "replay", "s.toml"]);
        assert!(cli.verbose);
    }

    #[test]
    fn verbose_after_subcommand() {
        let cli = Cli::parse_from_iter(["navwatch", "replay", "s.toml", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn subcommand_is_required() {
        let result = <Cli as clap::Parser>::try_parse_from(["navwatch"]);
        assert!(result.is_err());
    }
}
