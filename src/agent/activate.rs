use tracing::info;

use super::Agent;
use crate::error::AgentError;

impl Agent {
    /// Activate: reclaim every generation other than the current one.
    ///
    /// Runs only after a successful install, and returns only once all
    /// deletions have settled. This is the single place stale stores are
    /// removed.
    pub(crate) async fn run_activate(&self) -> Result<(), AgentError> {
        let deleted = self.stores.delete_stale().await?;
        if !deleted.is_empty() {
            info!(removed = deleted.len(), "stale cache stores reclaimed");
        }
        info!(version = %self.stores.current_tag(), "cache agent activated");
        Ok(())
    }
}
