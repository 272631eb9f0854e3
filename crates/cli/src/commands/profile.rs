//! Profile management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a profile under a generated account id
//! eco-cli profile create -n "Mira"
//!
//! # Create a profile for an existing account id
//! eco-cli profile create -n "Mira" --account acct-1
//!
//! eco-cli profile show --account acct-1
//! eco-cli profile rename --account acct-1 -n "Ada"
//! ```

use clap::Subcommand;

use ecofinds_storefront::config::StorefrontConfig;

use super::{CliError, connect, parse_account, print_json};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create a profile with an empty cart and purchase history
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account id (generated when omitted)
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Print a profile
    Show {
        #[arg(short, long)]
        account: String,
    },
    /// Change a profile's display name
    Rename {
        #[arg(short, long)]
        account: String,

        /// New display name
        #[arg(short, long)]
        name: String,
    },
}

/// Run a profile command.
///
/// # Errors
///
/// Returns `CliError` if the database is unavailable or the operation fails.
pub async fn run(config: StorefrontConfig, action: ProfileAction) -> Result<(), CliError> {
    let state = connect(config, true).await?;
    let sessions = state.sessions();

    let session = match action {
        ProfileAction::Create { name, account } => match account {
            Some(raw) => sessions.sign_up_with_id(parse_account(&raw)?, &name).await?,
            None => sessions.sign_up(&name).await?,
        },
        ProfileAction::Show { account } => sessions.sign_in(parse_account(&account)?).await?,
        ProfileAction::Rename { account, name } => {
            let mut session = sessions.sign_in(parse_account(&account)?).await?;
            sessions.update_display_name(&mut session, &name).await?;
            session
        }
    };

    print_json(&session.profile())
}
