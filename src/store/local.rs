use std::path::{Path, PathBuf};

use serde_json::Value;

use super::StoreError;
use crate::models::opinion::Opinion;
use crate::models::opinion::normalize::normalize_list;

/// Key under which the whole list is stored.
pub const SLOT_KEY: &str = "ai-opinions";

/// A single durable slot holding the entire opinion list as JSON.
///
/// Read once at startup and overwritten in full after every mutation.
#[derive(Debug, Clone)]
pub struct LocalSlot {
    path: PathBuf,
}

impl LocalSlot {
    /// Slot file `<dir>/ai-opinions.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        LocalSlot {
            path: dir.as_ref().join(format!("{SLOT_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored list. A missing slot is an empty list; a slot that is
    /// not a JSON array is an error so it never gets silently overwritten.
    pub async fn read(&self) -> Result<Vec<Opinion>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No opinion slot at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let values: Vec<Value> = serde_json::from_slice(&raw)?;
        let opinions = normalize_list(&values);
        log::info!(
            "Loaded {} opinions from {}",
            opinions.len(),
            self.path.display()
        );
        Ok(opinions)
    }

    /// Replace the stored list. Written to a sibling temp file first, then
    /// renamed over the slot.
    pub async fn write(&self, opinions: &[Opinion]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec(opinions)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::debug!("Wrote {} opinions to {}", opinions.len(), self.path.display());
        Ok(())
    }
}
