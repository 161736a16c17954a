//! CLI subcommands.

pub mod extract;
pub mod fetch;
pub mod verify;

use windlass::CancelToken;

use crate::error::CliError;

/// Install a Ctrl-C handler that fires the returned cancellation token.
///
/// The stages observe the token between chunks and entries, so interrupting
/// leaves partial state on disk consistent and resumable.
pub fn install_interrupt_handler() -> Result<CancelToken, CliError> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();

    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Interrupt received, finishing current chunk...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("failed to set signal handler: {}", e)))?;

    Ok(cancel)
}
