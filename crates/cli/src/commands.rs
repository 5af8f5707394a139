use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use pocket_ledger_core::models::advertisement::Advertisement;
use pocket_ledger_core::models::filter::TransactionFilter;
use pocket_ledger_core::models::stats::MethodTotals;
use pocket_ledger_core::models::transaction::TransactionDraft;
use pocket_ledger_core::models::user::{ProfileDraft, SignUpForm, UserProfile};
use pocket_ledger_core::services::ledger_service::SyncStatus;
use pocket_ledger_core::services::report_service::ReportService;
use pocket_ledger_core::services::session_service::avatar_from_file;
use pocket_ledger_core::{ExportedReport, PocketLedger};

use crate::cli::{AdsCommand, Command, ExportFormat, ProfileArgs};

pub async fn run(app: &mut PocketLedger, command: Command) -> Result<()> {
    match command {
        Command::Signup {
            email,
            name,
            mobile,
            password,
        } => {
            let form = SignUpForm {
                email,
                name,
                mobile,
                pass: password,
            };
            let user = app.sign_up(form).await?;
            println!("Welcome, {}! Signed in as {}", user.name, user.user_id());
        }
        Command::Signin { login, password } => {
            let user = app.sign_in(&login, &password).await?;
            println!("Signed in as {} ({})", user.name, user.user_id());
            report_migration(app);
        }
        Command::Signout => {
            app.sign_out()?;
            println!("Signed out");
        }
        Command::Whoami => match app.current_user() {
            Some(user) => print_profile(user),
            None => println!("Not signed in"),
        },
        Command::Profile(args) => {
            let draft = profile_draft(args)?;
            if draft.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let user = app.update_profile(&draft).await?;
            println!("Profile updated");
            print_profile(user);
        }
        Command::Add {
            description,
            amount,
            kind,
            method,
        } => {
            let draft = TransactionDraft::new(description, amount, kind, method);
            let (id, status) = app.add_transaction(draft).await?;
            println!("Added {id}{}", sync_note(status));
        }
        Command::Edit {
            id,
            description,
            amount,
            kind,
            method,
        } => {
            let mut tx = app
                .ledger()?
                .get(&id)
                .cloned()
                .with_context(|| format!("No transaction with id {id}"))?;
            if let Some(description) = description {
                tx.description = description;
            }
            if let Some(amount) = amount {
                tx.amount = amount;
            }
            if let Some(kind) = kind {
                tx.kind = kind;
            }
            if let Some(method) = method {
                tx.method = method;
            }
            let status = app.update_transaction(tx).await?;
            println!("Updated {id}{}", sync_note(status));
        }
        Command::Delete { id } => {
            app.delete_transaction(&id).await?;
            println!("Deleted {id}");
        }
        Command::List {
            kind,
            range,
            search,
        } => {
            let filter = TransactionFilter::new()
                .with_kind(kind)
                .with_range(range)
                .with_search(search);
            let rows: Vec<Vec<String>> = app
                .filtered_transactions(&filter)?
                .into_iter()
                .map(|tx| {
                    vec![
                        tx.id.clone(),
                        tx.date.format("%Y-%m-%d %H:%M").to_string(),
                        tx.description.clone(),
                        tx.method.to_string(),
                        tx.kind.to_string(),
                        ReportService::format_amount(tx.amount),
                    ]
                })
                .collect();
            if rows.is_empty() {
                println!("No transactions match");
            } else {
                let headers = ["ID", "DATE", "DESCRIPTION", "METHOD", "TYPE", "AMOUNT"];
                println!("{}", pretty_table(&headers, rows));
            }
        }
        Command::Stats { method } => {
            let totals = match method {
                Some(method) => {
                    app.select_method(method)?;
                    vec![app.totals()?]
                }
                None => app.breakdown()?,
            };
            let rows = totals.iter().map(totals_row).collect();
            println!(
                "{}",
                pretty_table(&["METHOD", "INCOME", "EXPENSE", "BALANCE"], rows)
            );
            let dash = app.dashboard()?;
            println!(
                "Total balance {}  (income {}, expenses {})",
                ReportService::format_amount(dash.total_balance),
                ReportService::format_amount(dash.total_income),
                ReportService::format_amount(dash.total_expenses),
            );
        }
        Command::Export { format, out } => {
            let ExportedReport { filename, content } = match format {
                ExportFormat::Text => app.export_text()?,
                ExportFormat::Csv => app.export_csv()?,
            };
            let path = out.join(filename);
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        Command::Ads(sub) => run_ads(app, sub).await?,
    }
    Ok(())
}

async fn run_ads(app: &mut PocketLedger, command: AdsCommand) -> Result<()> {
    match command {
        AdsCommand::List => {
            let is_admin = app.current_user().is_some_and(UserProfile::is_admin);
            let ads = if is_admin {
                app.all_ads().await?
            } else {
                app.active_ads().await
            };
            if ads.is_empty() {
                println!("No ads");
                return Ok(());
            }
            let rows = ads
                .iter()
                .map(|ad| {
                    vec![
                        ad.id.clone(),
                        ad.title.clone(),
                        ad.link.clone(),
                        if ad.active { "yes" } else { "no" }.to_string(),
                        ad.created_at.format("%Y-%m-%d").to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "TITLE", "LINK", "ACTIVE", "CREATED"], rows)
            );
        }
        AdsCommand::Add {
            title,
            link,
            image_url,
        } => {
            let ad = Advertisement::new(title, link, image_url);
            app.save_ad(&ad).await?;
            println!("Created ad {}", ad.id);
        }
        AdsCommand::Remove { id } => {
            app.delete_ad(&id).await?;
            println!("Removed ad {id}");
        }
    }
    Ok(())
}

fn profile_draft(args: ProfileArgs) -> Result<ProfileDraft> {
    let avatar = match (&args.avatar_file, args.avatar) {
        (Some(path), _) => Some(
            avatar_from_file(path)
                .with_context(|| format!("Failed to read avatar {}", path.display()))?,
        ),
        (None, avatar) => avatar,
    };
    Ok(ProfileDraft {
        name: args.name,
        email: args.email,
        mobile: args.mobile,
        username: args.username,
        pass: args.password,
        avatar,
        bio: args.bio,
    })
}

fn report_migration(app: &PocketLedger) {
    let Some(report) = app.ledger().ok().and_then(|l| l.last_migration()) else {
        return;
    };
    if report.migrated > 0 {
        println!("Moved {} locally stored transaction(s) to the remote store", report.migrated);
    }
    if !report.is_complete() {
        println!(
            "{} transaction(s) are still waiting to be uploaded; they will be retried at next sign-in",
            report.remaining
        );
    }
}

fn print_profile(user: &UserProfile) {
    let avatar = if user.has_image_avatar() {
        "(image)".to_string()
    } else {
        user.avatar.clone()
    };
    let rows = vec![
        vec!["Name".to_string(), user.name.clone()],
        vec!["Email".to_string(), user.email.clone()],
        vec!["Mobile".to_string(), user.mobile.clone()],
        vec!["Username".to_string(), user.username.clone()],
        vec!["Role".to_string(), user.role.to_string()],
        vec!["Avatar".to_string(), avatar],
        vec!["Bio".to_string(), user.bio.clone().unwrap_or_default()],
    ];
    println!("{}", pretty_table(&["FIELD", "VALUE"], rows));
}

fn totals_row(t: &MethodTotals) -> Vec<String> {
    vec![
        t.method.to_string(),
        ReportService::format_amount(t.income),
        ReportService::format_amount(t.expense),
        ReportService::format_amount(t.balance),
    ]
}

fn sync_note(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Synced => "",
        SyncStatus::LocalOnly => " (saved locally; remote store unreachable)",
    }
}

fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}
