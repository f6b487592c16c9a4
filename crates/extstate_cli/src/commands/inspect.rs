//! Inspect command implementation.

use extstate_core::{LoginValidity, SessionStore};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Login lifecycle position (absent, valid, expired).
    pub login: &'static str,
    /// Login expiry in Unix milliseconds, if a record exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_expiry: Option<u64>,
    /// Raw value of every reserved key, by store key.
    pub fields: Vec<FieldValue>,
}

/// One reserved key and its raw value.
#[derive(Debug, Serialize)]
pub struct FieldValue {
    /// Store key.
    pub key: String,
    /// Raw value, `None` if absent.
    pub value: Option<Value>,
}

/// Runs the inspect command.
///
/// Reads raw values only; an expired login record is reported, not removed.
pub async fn run(
    session: &SessionStore,
    path: &Path,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(session, path).await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

async fn collect(
    session: &SessionStore,
    path: &Path,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let snapshot = session.snapshot().await?;
    let (login, login_expiry) = match session.login_state().await? {
        LoginValidity::Absent => ("absent", None),
        LoginValidity::Valid(state) => ("valid", Some(state.expiry)),
        LoginValidity::Expired(state) => ("expired", Some(state.expiry)),
    };

    let keys = session.keys();
    let fields = vec![
        (keys.user_metadata.clone(), snapshot.user_metadata),
        (keys.logged_in.clone(), snapshot.logged_in),
        (keys.consent.clone(), snapshot.consent),
        (keys.searching.clone(), snapshot.searching),
        (keys.user_id.clone(), snapshot.user_id),
    ]
    .into_iter()
    .map(|(key, value)| FieldValue { key, value })
    .collect();

    Ok(InspectResult {
        path: path.display().to_string(),
        login,
        login_expiry,
        fields,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Session Store: {}", result.path);
    println!();
    match result.login_expiry {
        Some(expiry) => println!("Login: {} (expiry {})", result.login, expiry),
        None => println!("Login: {}", result.login),
    }
    println!();
    println!("Fields:");
    for field in &result.fields {
        match &field.value {
            Some(value) => println!("  {:<16} {}", field.key, value),
            None => println!("  {:<16} (absent)", field.key),
        }
    }
}
