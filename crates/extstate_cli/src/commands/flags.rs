//! Login, consent and searching commands.

use extstate_core::SessionStore;
use tracing::info;

/// Writes a login record.
pub async fn login(
    session: &SessionStore,
    logged_in: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    session.set_logged_in(logged_in).await?;
    info!(logged_in, "login record written");
    println!("✓ loggedIn = {logged_in} (expires in 1h)");
    Ok(())
}

/// Reads or writes the consent flag.
pub async fn consent(
    session: &SessionStore,
    value: Option<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(consent) = value {
        session.set_consent(consent).await?;
    }
    println!("consent = {}", session.get_consent().await?);
    Ok(())
}

/// Reads or writes the searching flag.
pub async fn searching(
    session: &SessionStore,
    value: Option<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(is_searching) = value {
        session.set_is_searching(is_searching).await?;
    }
    println!("searching = {}", session.get_is_searching().await?);
    Ok(())
}
