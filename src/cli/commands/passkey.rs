//! `roster passkey` command - Administrative passkey management

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Password};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{authorize, prompt_passkey, success, Workspace};
use crate::cli::GlobalOpts;
use crate::core::credential::CredentialError;
use crate::core::{RosterError, RosterSession};

#[derive(Subcommand, Debug)]
pub enum PasskeyCommands {
    /// Set or change the passkey (the current one is required to change it)
    Set(SetArgs),

    /// Check a passkey against the stored one
    Verify,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// New passkey (prompted for when omitted)
    #[arg(long)]
    pub new: Option<String>,
}

pub async fn run(cmd: PasskeyCommands, global: &GlobalOpts) -> Result<()> {
    let workspace = Workspace::discover(global)?;
    let session = workspace.session().await?;
    let result = match cmd {
        PasskeyCommands::Set(args) => run_set(args, &session, global).await,
        PasskeyCommands::Verify => run_verify(&session, global).await,
    };
    session.close();
    result
}

async fn run_set(args: SetArgs, session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let gate = session.passkey();
    let already_set = gate.is_set().await.into_diagnostic()?;
    authorize(session, global).await?;

    // with no passkey yet, --passkey doubles as the new value
    let new = match (args.new, &global.passkey) {
        (Some(new), _) => new,
        (None, Some(given)) if !already_set => given.clone(),
        (None, _) if console::user_attended() => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("New passkey")
            .with_confirmation("Confirm passkey", "Passkeys do not match")
            .interact()
            .into_diagnostic()?,
        (None, _) => miette::bail!("pass the new passkey with --new"),
    };

    gate.set(&new).await?;
    let verb = if already_set { "changed" } else { "set" };
    success(global, format!("Passkey {}", verb));
    Ok(())
}

async fn run_verify(session: &RosterSession, global: &GlobalOpts) -> Result<()> {
    let gate = session.passkey();
    if !gate.is_set().await.into_diagnostic()? {
        return Err(RosterError::from(CredentialError::NotSet).into());
    }
    let input = match &global.passkey {
        Some(given) => given.clone(),
        None if console::user_attended() => prompt_passkey("Passkey")?,
        None => return Err(RosterError::from(CredentialError::Required).into()),
    };
    if !gate.verify(&input).await.into_diagnostic()? {
        return Err(RosterError::from(CredentialError::Mismatch).into());
    }
    success(global, format!("Passkey {}", style("accepted").green()));
    Ok(())
}
