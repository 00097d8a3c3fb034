//! Bulk selection and the availability of bulk actions.
//!
//! Availability is never stored; it is recomputed from the selected items
//! whenever it is needed.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::remote::Submission;

/// Form attribute listing the teams its items may be assigned to
pub const ASSIGNABLE_TEAMS_ATTRIBUTE: &str = "Assignable Teams";

/// Form attribute that enables the bulk work action
pub const BULK_WORK_ATTRIBUTE: &str = "Bulk Work Enabled";

pub const ASSIGN_NO_COMMON_TEAM: &str = "No team can be assigned to every selected item";
pub const ASSIGN_PARTIAL_TEAMS: &str =
    "Selected items allow different teams; only teams valid for all items are offered";
pub const WORK_MULTIPLE_FORMS: &str = "Selected items belong to more than one form";
pub const WORK_NOT_ASSIGNED: &str = "Every selected item must be assigned to you";

/// Enter or leave selection mode
pub fn toggle_selection_mode(selected: Option<Vec<String>>) -> Option<Vec<String>> {
    match selected {
        Some(_) => None,
        None => Some(Vec::new()),
    }
}

/// Toggle one item, or with `extend_range` select everything between the
/// last selected item and `id` on the current page.
pub fn toggle_selected_item(
    selected: Option<Vec<String>>,
    page: &[Submission],
    id: &str,
    extend_range: bool,
) -> Option<Vec<String>> {
    let mut ids = selected.unwrap_or_default();

    let anchor = ids
        .last()
        .and_then(|last| page.iter().position(|s| &s.id == last));
    let target = page.iter().position(|s| s.id == id);

    match (extend_range, anchor, target) {
        (true, Some(from), Some(to)) => {
            let (low, high) = if from <= to { (from, to) } else { (to, from) };
            let range: Vec<&Submission> = if from <= to {
                page[low..=high].iter().collect()
            } else {
                page[low..=high].iter().rev().collect()
            };
            for item in range {
                if !ids.contains(&item.id) {
                    ids.push(item.id.clone());
                }
            }
        }
        _ => match ids.iter().position(|s| s == id) {
            Some(index) => {
                ids.remove(index);
            }
            None => ids.push(id.to_string()),
        },
    }

    Some(ids)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignAvailability {
    pub available: bool,
    /// Teams every selected item can be assigned to
    pub teams: Vec<String>,
    pub warning: Option<&'static str>,
}

/// Teams each selected item can be assigned to, intersected across the
/// distinct forms in the selection.
///
/// Eligibility comes from the form alone, so an item's current team does not
/// affect it.
pub fn assign_availability(selected: &[&Submission], all_teams: &[String]) -> AssignAvailability {
    let mut seen: HashSet<Option<&str>> = HashSet::new();
    let mut eligible: Vec<BTreeSet<String>> = Vec::new();

    for item in selected {
        if !seen.insert(item.form_slug()) {
            continue;
        }
        let teams = item
            .form
            .as_ref()
            .and_then(|f| f.attribute_values(ASSIGNABLE_TEAMS_ATTRIBUTE))
            .filter(|values| !values.is_empty())
            .unwrap_or(all_teams);
        eligible.push(teams.iter().cloned().collect());
    }

    let Some((first, rest)) = eligible.split_first() else {
        return AssignAvailability {
            available: false,
            teams: Vec::new(),
            warning: None,
        };
    };

    let common = rest.iter().fold(first.clone(), |acc, set| {
        acc.intersection(set).cloned().collect()
    });

    if common.is_empty() {
        return AssignAvailability {
            available: false,
            teams: Vec::new(),
            warning: Some(ASSIGN_NO_COMMON_TEAM),
        };
    }

    let differs = rest.iter().any(|set| set != first);
    AssignAvailability {
        available: true,
        teams: common.into_iter().collect(),
        warning: differs.then_some(ASSIGN_PARTIAL_TEAMS),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkAvailability {
    /// Some selected item's form supports bulk work
    pub visible: bool,
    pub available: bool,
    pub reason: Option<&'static str>,
}

fn bulk_work_enabled(item: &Submission) -> bool {
    item.form
        .as_ref()
        .and_then(|f| f.attribute(BULK_WORK_ATTRIBUTE))
        .is_some_and(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
}

pub fn work_availability(selected: &[&Submission], username: &str) -> WorkAvailability {
    let visible = selected.iter().any(|item| bulk_work_enabled(item));
    if !visible {
        return WorkAvailability {
            visible: false,
            available: false,
            reason: None,
        };
    }

    let forms: HashSet<Option<&str>> = selected.iter().map(|item| item.form_slug()).collect();
    let reason = if forms.len() > 1 {
        Some(WORK_MULTIPLE_FORMS)
    } else if selected
        .iter()
        .any(|item| item.assigned_individual() != Some(username))
    {
        Some(WORK_NOT_ASSIGNED)
    } else {
        None
    };

    WorkAvailability {
        visible: true,
        available: reason.is_none(),
        reason,
    }
}
