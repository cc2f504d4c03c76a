//! Merging a file's units with a remote snapshot.
//!
//! The remote side wins whenever it holds a translation. Local text is only
//! authoritative for identifiers the remote has never seen, and a remote
//! value that is empty never erases a local translation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{file::LocalizationFile, store::RemoteSnapshot, types::TranslationUnit};

/// What one reconciliation pass did, by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Units whose target text was replaced by the remote translation.
    pub changed: Vec<String>,
    /// Local units the remote table has no row for; these are pushed upstream.
    pub local_only: Vec<String>,
    /// Remote rows with no local unit (neither in the file nor untranslated).
    /// Reported only, never turned into units.
    pub missing_locally: Vec<String>,
    /// Matched units translated locally whose remote value is empty; left untouched.
    pub regressed: Vec<String>,
}

impl ReconcileReport {
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Flagged {
    Unit(usize),
    Untranslated(usize),
}

/// Applies `snapshot` to the units and untranslated units of `file`.
///
/// Steps:
/// 1. Split local units into matched and local-only.
/// 2. Flag local-only units and matched units whose remote text differs.
/// 3. Flag untranslated units the remote now has a value for.
/// 4. Commit only flagged units whose remote record is translated.
/// 5. Report remote identifiers absent locally.
pub fn reconcile(file: &mut LocalizationFile, snapshot: &RemoteSnapshot) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut flagged = Vec::new();

    for (i, unit) in file.units.iter().enumerate() {
        match snapshot.get(unit.identifier()) {
            None => {
                report.local_only.push(unit.identifier().to_string());
                flagged.push(Flagged::Unit(i));
            }
            Some(record) if record.target_text != unit.target_text => {
                flagged.push(Flagged::Unit(i));
            }
            Some(_) => {}
        }
    }

    for (i, unit) in file.untranslated.iter().enumerate() {
        if let Some(record) = snapshot.get(unit.identifier())
            && record.is_translated()
        {
            flagged.push(Flagged::Untranslated(i));
        }
    }

    for flag in flagged {
        let unit = match flag {
            Flagged::Unit(i) => &mut file.units[i],
            Flagged::Untranslated(i) => &mut file.untranslated[i],
        };
        let Some(record) = snapshot.get(unit.identifier()) else {
            continue;
        };
        if record.is_translated() {
            unit.target_text = record.target_text.clone();
            debug!(id = unit.identifier(), "translated: {}", unit);
            report.changed.push(unit.identifier().to_string());
        } else if unit.is_translated() {
            debug!(id = unit.identifier(), "remote value is empty, keeping local text");
            report.regressed.push(unit.identifier().to_string());
        }
    }

    let local: HashSet<&str> = file.all_units().map(TranslationUnit::identifier).collect();
    report.missing_locally = snapshot
        .records()
        .iter()
        .filter(|r| !local.contains(r.identifier.as_str()))
        .map(|r| r.identifier.clone())
        .collect();

    info!(
        file = %file.path.display(),
        changed = report.changed.len(),
        local_only = report.local_only.len(),
        missing_locally = report.missing_locally.len(),
        "reconciled"
    );
    report
}
