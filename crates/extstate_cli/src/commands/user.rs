//! User identifier and metadata commands.

use extstate_core::{SessionStore, UserMetadata};
use std::path::Path;
use tracing::info;

/// Prints the user identifier, or overwrites it when `set` is given.
pub async fn user_id(
    session: &SessionStore,
    set: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(id) = set {
        session.set_user_id(id).await?;
        info!(user_id = id, "user id overwritten");
    }
    println!("{}", session.get_user_id().await?);
    Ok(())
}

/// Prints the cached metadata, or replaces it with the record in `set`.
pub async fn metadata(
    session: &SessionStore,
    set: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = set {
        info!("Reading metadata from {:?}", input);
        let bytes = std::fs::read(input)?;
        let metadata: UserMetadata = serde_json::from_slice(&bytes)?;
        session.set_user_metadata(&metadata).await?;
    }

    match session.get_user_metadata().await? {
        Some(metadata) => println!("{}", serde_json::to_string_pretty(&metadata)?),
        None => println!("(no metadata)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::open_session;

    #[tokio::test]
    async fn metadata_loaded_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("metadata.json");
        std::fs::write(
            &input,
            br#"{"id": "p1", "phone": "555", "cities": ["Oslo"], "lastDate": 12}"#,
        )
        .unwrap();

        let session = open_session(&dir.path().join("state.json"), Some("ext")).unwrap();
        metadata(&session, Some(&input)).await.unwrap();

        let stored = session.get_user_metadata().await.unwrap().unwrap();
        assert_eq!(stored.cities, vec!["Oslo".to_string()]);
        assert_eq!(stored.last_date, 12);
    }

    #[tokio::test]
    async fn user_id_set_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let session = open_session(&dir.path().join("state.json"), None).unwrap();

        user_id(&session, Some("fixed-id")).await.unwrap();
        assert_eq!(session.get_user_id().await.unwrap(), "fixed-id");
    }
}
