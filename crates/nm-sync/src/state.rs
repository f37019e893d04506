//! Persistence of the progress ledger in `state.json`
//!
//! The ledger lives under the `manuscriptProgress` key. Other keys in the
//! state file belong to other tools and are written back unchanged.

use nm_manuscript::{files, ManuscriptError, ProgressLedger};
use serde_json::{Map, Value};
use std::path::Path;

/// Key holding the ledger inside `state.json`
pub const LEDGER_KEY: &str = "manuscriptProgress";

/// Load the ledger; missing file or key yields an empty ledger
///
/// # Errors
/// Returns `ManuscriptError` if the state file is unreadable or the ledger
/// entry is malformed.
pub async fn load_ledger(state_file: &Path) -> Result<ProgressLedger, ManuscriptError> {
    let Some(mut state) = files::read_json::<Map<String, Value>>(state_file).await? else {
        return Ok(ProgressLedger::new());
    };
    match state.remove(LEDGER_KEY) {
        Some(entry) => {
            serde_json::from_value(entry).map_err(|e| ManuscriptError::json_error(state_file, e))
        }
        None => Ok(ProgressLedger::new()),
    }
}

/// Store the ledger, keeping every other key of the state file
///
/// # Errors
/// Returns `ManuscriptError` if the state file cannot be read or written.
pub async fn save_ledger(state_file: &Path, ledger: &ProgressLedger) -> Result<(), ManuscriptError> {
    let mut state = files::read_json::<Map<String, Value>>(state_file)
        .await?
        .unwrap_or_default();

    let entry = serde_json::to_value(ledger).map_err(|e| ManuscriptError::json_error(state_file, e))?;
    state.insert(LEDGER_KEY.to_string(), entry);

    files::write_json(state_file, &state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nm_manuscript::{ManuscriptSummary, ProgressRollup};
    use serde_json::json;

    #[tokio::test]
    async fn missing_state_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = load_ledger(&dir.path().join("state.json")).await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn save_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{ "currentTag": "outline", "migrationNoticeShown": true }"#).unwrap();

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let summary = ManuscriptSummary::assemble("outline", at, Vec::new(), None);
        let mut ledger = ProgressLedger::new();
        ledger.record("outline", ProgressRollup::from_summary(&summary));

        save_ledger(&path, &ledger).await.unwrap();

        let state: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(state["currentTag"], json!("outline"));
        assert_eq!(state["migrationNoticeShown"], json!(true));
        assert_eq!(state[LEDGER_KEY]["outline"]["totalChapters"], json!(0));
        assert_eq!(load_ledger(&path).await.unwrap(), ledger);
    }
}
