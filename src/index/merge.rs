//! Folding delta changes back into the base.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::base::ItemIndex;
use super::delta::Change;
use super::ItemGraph;
use crate::error::GraphError;
use crate::types::{GraphItem, ItemId, Links, Relation};
use crate::visitor::overwrite_links;

/// One change log entry with the item's final state, if this is the last
/// entry for the item and the item is still live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEntry {
    /// Recorded change.
    pub change: Change,
    /// Final links of the item.
    pub state: Option<Links>,
}

/// Change log of a consumed delta version, ready to merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaChanges {
    base_version: String,
    version: String,
    base_revision: u64,
    entries: Vec<MergeEntry>,
}

impl DeltaChanges {
    pub(crate) fn new(base_version: String, version: String, base_revision: u64, entries: Vec<MergeEntry>) -> Self {
        Self {
            base_version,
            version,
            base_revision,
            entries,
        }
    }

    /// Version the delta was built over.
    pub fn base_version(&self) -> &str {
        &self.base_version
    }

    /// Base revision the delta was built at.
    pub fn base_revision(&self) -> u64 {
        self.base_revision
    }

    /// Version label of the delta.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Entries in recording order.
    pub fn entries(&self) -> &[MergeEntry] {
        &self.entries
    }

    /// Whether the delta recorded nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts of replayed changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Items created.
    pub added: usize,
    /// Items whose state was overwritten.
    pub updated: usize,
    /// Items removed.
    pub removed: usize,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{} ~{} -{}",
            self.added, self.updated, self.removed
        )
    }
}

impl ItemIndex {
    /// Replay a delta's changes onto this version.
    ///
    /// The base must still be at the revision the delta was built from.
    /// Additions must land on the IDs the delta assigned; final states are
    /// written with the overwrite visitor after any parent change has been
    /// applied through `unlink`/`link`. The version is in flux during the
    /// replay, and a failed replay leaves it as it was before the call.
    pub fn merge(&mut self, changes: DeltaChanges) -> Result<MergeReport, GraphError> {
        if changes.base_version != self.version() {
            return Err(GraphError::BaseVersionMismatch {
                expected: changes.base_version,
                found: self.version().to_string(),
            });
        }
        if changes.base_revision != self.revision() {
            return Err(GraphError::StaleDelta {
                expected: changes.base_revision,
                found: self.revision(),
            });
        }

        let start = Instant::now();
        self.begin_journal();
        self.set_in_flux(true);
        let result = self.replay(&changes.entries);
        self.set_in_flux(false);
        let report = match result {
            Ok(report) => {
                self.commit_journal();
                report
            }
            Err(err) => {
                self.rollback_journal();
                tracing::warn!(
                    version = %self.version(),
                    delta = %changes.version,
                    error = %err,
                    "Merge failed, base restored"
                );
                return Err(err);
            }
        };

        tracing::info!(
            version = %self.version(),
            delta = %changes.version,
            added = report.added,
            updated = report.updated,
            removed = report.removed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Merged delta into base"
        );
        Ok(report)
    }

    fn replay(&mut self, entries: &[MergeEntry]) -> Result<MergeReport, GraphError> {
        let mut report = MergeReport::default();
        for entry in entries {
            match &entry.change {
                Change::Added {
                    id,
                    parent,
                    name,
                    item_type,
                } => {
                    let got = self.insert_new(*parent, name, *item_type)?;
                    if got != *id {
                        return Err(GraphError::MergeIdMismatch { expected: *id, got });
                    }
                    if let Some(parent_links) = parent.and_then(|p| self.links_mut(p)) {
                        parent_links.insert_id(Relation::Children, got);
                    }
                    report.added += 1;
                }
                Change::Updated { .. } => {}
                Change::Removed { id } => {
                    self.remove_item(*id)?;
                    report.removed += 1;
                }
            }
            if let Some(state) = &entry.state {
                self.apply_state(entry.change.id(), state)?;
                report.updated += 1;
            }
        }
        Ok(report)
    }

    fn apply_state(&mut self, id: ItemId, state: &Links) -> Result<(), GraphError> {
        let current = self.get(id).ok_or(GraphError::ItemNotFound(id))?.parent();
        if current != state.parent() {
            if let Some(old) = current {
                self.unlink(id, Relation::Parent, old)?;
            }
            if let Some(new) = state.parent() {
                self.link(id, Relation::Parent, new)?;
            }
        }
        let target = self.links_mut(id).ok_or(GraphError::ItemNotFound(id))?;
        overwrite_links(id, state, target)
    }
}
