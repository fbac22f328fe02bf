use chrono::NaiveDate;
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use crate::config::Config;
use crate::core::model::{ApprovalStatus, ReleaseRole};
use crate::core::services::{ReleaseInput, StatusSubmission};
use crate::error::Result;
use crate::services::SimpleServices;

use super::resolve_actor;

#[derive(Args)]
pub struct ReleaseArgs {
    #[command(subcommand)]
    command: ReleaseCommands,
}

#[derive(Subcommand)]
enum ReleaseCommands {
    /// Create the initial draft release of a publication period
    Create {
        #[arg(long)]
        publication: Uuid,

        /// Time period coverage code, e.g. AY or CY
        #[arg(long)]
        time_period: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        label: Option<String>,
    },

    /// Show one release
    Show { release: Uuid },

    /// List a publication's releases by version
    List {
        #[arg(long)]
        publication: Uuid,
    },

    /// Clone a release into a new draft amendment
    Amend { release: Uuid },

    /// Move a release to higher level review
    Submit {
        release: Uuid,

        #[arg(long)]
        note: Option<String>,
    },

    /// Approve a release for publication
    Approve {
        release: Uuid,

        /// Scheduled publish date (YYYY-MM-DD)
        #[arg(long)]
        publish_on: NaiveDate,

        #[arg(long)]
        note: Option<String>,

        /// Notify publication subscribers on publish
        #[arg(long, conflicts_with = "no_notify")]
        notify: bool,

        /// Skip the subscriber notification
        #[arg(long)]
        no_notify: bool,
    },

    /// Show the approval history, newest first, across amendments
    Statuses { release: Uuid },

    /// Record pending pre-release access for an email address
    Invite {
        release: Uuid,

        #[arg(long)]
        email: String,
    },

    /// Grant a release role to a user
    AddRole {
        release: Uuid,

        #[arg(long)]
        email: String,

        #[arg(long, value_parser = parse_role)]
        role: ReleaseRole,
    },

    /// Append an update-history entry
    AddNote {
        release: Uuid,

        #[arg(long)]
        reason: String,
    },

    /// Set the public data guidance text
    SetGuidance {
        release: Uuid,

        #[arg(long)]
        text: String,
    },
}

fn parse_role(s: &str) -> std::result::Result<ReleaseRole, String> {
    ReleaseRole::parse(s).ok_or_else(|| format!("unknown role: {s}"))
}

pub async fn execute(args: ReleaseArgs, services: &SimpleServices, actor: Option<&str>) -> Result<()> {
    let config: std::sync::Arc<Config> = services.config();
    let set = services.create_services().await?;

    match args.command {
        ReleaseCommands::Create {
            publication,
            time_period,
            year,
            label,
        } => {
            let actor = resolve_actor(actor, &config)?;
            let release = set
                .releases
                .create_release(
                    publication,
                    ReleaseInput {
                        time_period,
                        year,
                        label,
                    },
                    &actor,
                )
                .await?;
            println!("Created release {} (version {})", release.id, release.version);
        }
        ReleaseCommands::List { publication } => {
            for release in set.releases.list_releases(publication).await? {
                println!(
                    "v{}  {}  {}  {}{}",
                    release.version,
                    release.id,
                    release.approval_status.as_str(),
                    release.year,
                    if release.is_amendment() { "  (amendment)" } else { "" },
                );
            }
        }
        ReleaseCommands::Show { release } => {
            let release = set.releases.get_release(release).await?;
            println!("{}", serde_json::to_string_pretty(&release).map_err(anyhow::Error::from)?);
        }
        ReleaseCommands::Amend { release } => {
            let actor = resolve_actor(actor, &config)?;
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .expect("valid spinner template"),
            );
            pb.set_message(format!("Cloning release {release}"));

            let amendment = set.amendment.amend(release, &actor).await?;

            pb.finish_with_message(format!(
                "✓ Created amendment {} (version {})",
                amendment.id, amendment.version
            ));
        }
        ReleaseCommands::Submit { release, note } => {
            let actor = resolve_actor(actor, &config)?;
            set.approval
                .create_status(
                    release,
                    StatusSubmission {
                        approval_status: ApprovalStatus::HigherLevelReview,
                        internal_note: note,
                        publish_scheduled: None,
                        notify_subscribers: None,
                    },
                    &actor,
                )
                .await?;
            println!("Release {release} submitted for higher level review");
        }
        ReleaseCommands::Approve {
            release,
            publish_on,
            note,
            notify,
            no_notify,
        } => {
            let actor = resolve_actor(actor, &config)?;
            let notify_subscribers = if notify {
                Some(true)
            } else if no_notify {
                Some(false)
            } else {
                None
            };
            set.approval
                .create_status(
                    release,
                    StatusSubmission {
                        approval_status: ApprovalStatus::Approved,
                        internal_note: note,
                        publish_scheduled: Some(publish_on),
                        notify_subscribers,
                    },
                    &actor,
                )
                .await?;
            println!("Release {release} approved for {publish_on}");
        }
        ReleaseCommands::Statuses { release } => {
            for status in set.approval.list_statuses(release).await? {
                println!(
                    "{}  {:<20} {}  {}",
                    status.created_at.format("%Y-%m-%d %H:%M"),
                    status.approval_status.as_str(),
                    status.created_by,
                    status.internal_note.as_deref().unwrap_or("-"),
                );
            }
        }
        ReleaseCommands::Invite { release, email } => {
            set.releases.add_prerelease_invite(release, &email).await?;
            println!("Recorded pre-release invite for {email}");
        }
        ReleaseCommands::AddRole {
            release,
            email,
            role,
        } => {
            set.releases.add_role(release, &email, role).await?;
            println!("Granted {} to {}", role.as_str(), email);
        }
        ReleaseCommands::AddNote { release, reason } => {
            let actor = resolve_actor(actor, &config)?;
            set.releases.add_release_note(release, &reason, &actor).await?;
            println!("Added release note");
        }
        ReleaseCommands::SetGuidance { release, text } => {
            set.releases.set_data_guidance(release, &text).await?;
            println!("Updated data guidance");
        }
    }

    Ok(())
}
