//! Subscription command implementation

use clap::{Args, Subcommand};
use std::process::ExitCode;

use crate::config::AppConfig;
use crate::subscription::{SubscriberKind, SubscriptionStore};

use super::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Subcommand)]
pub enum SubAction {
    /// List every subscriber
    List,
    /// Subscribe a group or private chat
    Add(Target),
    /// Unsubscribe a group or private chat
    Remove(Target),
}

/// Exactly one of `--group` or `--private`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Group id
    #[arg(long)]
    pub group: Option<i64>,
    /// User id for a private chat
    #[arg(long)]
    pub private: Option<i64>,
}

impl Target {
    fn resolve(&self) -> Option<(SubscriberKind, i64)> {
        match (self.group, self.private) {
            (Some(id), _) => Some((SubscriberKind::Group, id)),
            (None, Some(id)) => Some((SubscriberKind::Private, id)),
            (None, None) => None,
        }
    }
}

/// Execute the sub command
pub fn run_sub(config: &AppConfig, action: &SubAction) -> ExitCode {
    let store = SubscriptionStore::new(config.subscription_path());

    let result = match action {
        SubAction::List => store.load().map(|subs| {
            for (kind, id) in subs.targets() {
                println!("{}\t{}", kind, id);
            }
        }),
        SubAction::Add(target) | SubAction::Remove(target) => {
            let Some((kind, id)) = target.resolve() else {
                return ExitCode::from(super::EXIT_INVALID_ARGS);
            };
            let message = match action {
                SubAction::Add(_) => store.add(kind, id),
                _ => store.remove(kind, id),
            };
            message.map(|m| println!("{}", m))
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;
    use clap::Parser;

    #[test]
    fn test_target_requires_exactly_one() {
        assert!(Cli::try_parse_from(["gsmaterial", "sub", "add"]).is_err());
        assert!(Cli::try_parse_from(["gsmaterial", "sub", "add", "--group", "1", "--private", "2"]).is_err());

        let cli = Cli::try_parse_from(["gsmaterial", "sub", "remove", "--private", "42"]).unwrap();
        match cli.command {
            Commands::Sub { action: SubAction::Remove(target) } => {
                assert_eq!(target.resolve(), Some((SubscriberKind::Private, 42)));
            }
            _ => panic!("expected sub remove"),
        }
    }

    #[test]
    fn test_run_sub_writes_file() {
        let temp = tempfile::TempDir::new().expect("should create temp dir");
        let config = AppConfig::with_data_dir(temp.path());
        let add = SubAction::Add(Target { group: Some(7), private: None });

        assert_eq!(run_sub(&config, &add), ExitCode::from(EXIT_SUCCESS));
        let subs = SubscriptionStore::new(config.subscription_path()).load().unwrap();
        assert_eq!(subs.groups, vec![7]);
    }
}
