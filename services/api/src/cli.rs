use crate::commands::{run_next_action, run_overdue, run_recompute_all, run_score};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lead_engagement::engagement::{BusinessId, FollowupId, ParentRef};
use lead_engagement::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Engagement Engine",
    about = "Score followups and resolve next and overdue actions from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Recompute and print the lead score of a single followup
    Score(ScoreArgs),
    /// Recompute every non-archived followup and print the batch report
    RecomputeAll(RecomputeAllArgs),
    /// Show the earliest upcoming activity or meeting for a followup or business
    NextAction(ParentArgs),
    /// List open activities and meetings whose action date has passed
    Overdue(ParentArgs),
    /// Run an end-to-end demo against seeded engagement data
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON snapshot used to seed the in-memory store (overrides APP_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

/// Data source and clock overrides shared by the one-shot commands.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct StoreArgs {
    /// JSON snapshot holding followups, activities, and meetings (overrides APP_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Evaluate as of this RFC 3339 instant instead of the system clock
    #[arg(long, value_parser = crate::infra::parse_datetime)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Followup identifier
    pub(crate) followup_id: i64,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

#[derive(Args, Debug)]
pub(crate) struct RecomputeAllArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    /// Write the rescored records back to the snapshot file
    #[arg(long)]
    pub(crate) write: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ParentKindArg {
    Followup,
    Business,
}

#[derive(Args, Debug)]
pub(crate) struct ParentArgs {
    /// Kind of record that owns the interactions
    #[arg(value_enum)]
    pub(crate) kind: ParentKindArg,
    /// Identifier of the owning record
    pub(crate) id: i64,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl ParentArgs {
    pub(crate) fn parent(&self) -> ParentRef {
        match self.kind {
            ParentKindArg::Followup => ParentRef::followup(FollowupId(self.id)),
            ParentKindArg::Business => ParentRef::business(BusinessId(self.id)),
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args).await,
        Command::RecomputeAll(args) => run_recompute_all(args).await,
        Command::NextAction(args) => run_next_action(args).await,
        Command::Overdue(args) => run_overdue(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parent_commands_with_overrides() {
        let cli = Cli::try_parse_from([
            "lead-engagement-api",
            "next-action",
            "business",
            "7",
            "--now",
            "2025-08-01T12:00:00Z",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::NextAction(args)) => {
                assert_eq!(args.parent(), ParentRef::business(BusinessId(7)));
                assert!(args.store.now.is_some());
                assert!(args.store.snapshot.is_none());
            }
            other => panic!("expected next-action, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_now_override() {
        let result = Cli::try_parse_from(["lead-engagement-api", "score", "1", "--now", "yesterday"]);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["lead-engagement-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
