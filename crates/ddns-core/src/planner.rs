//! Record planner
//!
//! Decides, without any I/O, what has to happen to one record set given the
//! desired value and the provider's current state for the zone.

use crate::traits::RrSet;

/// What the engine should do for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// The record set already holds exactly the desired value
    Skip,
    /// No matching record set exists
    Create,
    /// A matching record set exists with other or additional values
    Replace {
        /// Values currently published
        current: Vec<String>,
    },
}

/// Compare two record names, ignoring trailing dots
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim_end_matches('.') == b.trim_end_matches('.')
}

/// Find the record set for `full_name`/`record_type`; first match wins
pub fn find_rrset<'a>(full_name: &str, record_type: &str, existing: &'a [RrSet]) -> Option<&'a RrSet> {
    existing
        .iter()
        .find(|rrset| rrset.record_type == record_type && names_match(&rrset.name, full_name))
}

/// Plan the change for one record
///
/// A match counts as up to date only when its values reduce to exactly one
/// value equal to `desired`; stray extra values force a replace.
pub fn plan(full_name: &str, record_type: &str, desired: &str, existing: &[RrSet]) -> Plan {
    let Some(rrset) = find_rrset(full_name, record_type, existing) else {
        return Plan::Create;
    };

    let current = rrset.values();
    if current.len() == 1 && current[0] == desired {
        Plan::Skip
    } else {
        Plan::Replace { current }
    }
}
