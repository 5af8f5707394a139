use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pocket_ledger_core::models::filter::{TimeRange, TypeFilter};
use pocket_ledger_core::models::transaction::{PaymentMethod, TransactionType};

/// Personal income/expense tracker backed by a hosted store.
#[derive(Parser, Debug)]
#[command(name = "pocket-ledger", version, about, long_about = None)]
pub struct Cli {
    /// Keep the "remote" in a local snapshot file instead of the hosted store.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Local cache file (defaults to the platform data directory).
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// Only mirror writes the remote store accepted.
    #[arg(long, global = true)]
    pub invalidate_mirror: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        mobile: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with an email, mobile number or username.
    Signin {
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the persisted session.
    Signout,
    /// Show the signed-in profile.
    Whoami,
    /// Edit the signed-in profile.
    Profile(ProfileArgs),
    /// Record a transaction.
    Add {
        description: String,
        amount: f64,
        #[arg(long = "type", default_value = "EXPENSE")]
        kind: TransactionType,
        #[arg(long, default_value = "CASH")]
        method: PaymentMethod,
    },
    /// Replace fields of an existing transaction.
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long = "type")]
        kind: Option<TransactionType>,
        #[arg(long)]
        method: Option<PaymentMethod>,
    },
    /// Delete a transaction.
    Delete { id: String },
    /// List transactions, newest first.
    List {
        #[arg(long = "type", default_value = "ALL")]
        kind: TypeFilter,
        /// ALL, 24H, 7D, 30D, 3M, 6M, 1Y, 2Y or 5Y
        #[arg(long, default_value = "ALL")]
        range: TimeRange,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Balance, income and expense totals.
    Stats {
        /// Show a single payment method instead of the full breakdown.
        #[arg(long)]
        method: Option<PaymentMethod>,
    },
    /// Write a statement of every transaction.
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        /// Directory to write into.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Manage dashboard ads.
    #[command(subcommand)]
    Ads(AdsCommand),
}

#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub mobile: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    /// Emoji avatar.
    #[arg(long, conflicts_with = "avatar_file")]
    pub avatar: Option<String>,
    /// Image file embedded as the avatar.
    #[arg(long)]
    pub avatar_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum AdsCommand {
    /// Show ads (admins see inactive ones too).
    List,
    /// Create an ad (admin only).
    Add {
        title: String,
        link: String,
        #[arg(long, default_value = "")]
        image_url: String,
    },
    /// Delete an ad (admin only).
    Remove { id: String },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_filters() {
        let cli = Cli::try_parse_from([
            "pocket-ledger", "--offline", "list", "--type", "income", "--range", "7d", "--search", "rent",
        ])
        .unwrap();
        assert!(cli.offline);
        match cli.command {
            Command::List { kind, range, search } => {
                assert_eq!(kind, TypeFilter::Only(TransactionType::Income));
                assert_eq!(range, TimeRange::Last7Days);
                assert_eq!(search, "rent");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn add_defaults_to_cash_expense() {
        let cli = Cli::try_parse_from(["pocket-ledger", "add", "Tea", "2.5"]).unwrap();
        match cli.command {
            Command::Add { kind, method, amount, .. } => {
                assert_eq!(kind, TransactionType::Expense);
                assert_eq!(method, PaymentMethod::Cash);
                assert_eq!(amount, 2.5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn avatar_flags_conflict() {
        let result = Cli::try_parse_from([
            "pocket-ledger", "profile", "--avatar", "🐱", "--avatar-file", "me.png",
        ]);
        assert!(result.is_err());
    }
}
