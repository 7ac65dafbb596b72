//! Local permission evaluator.
//!
//! Pure AND/OR satisfaction over a caller's permission set. These functions
//! are the reference semantics any authorization oracle must agree with.

use crate::rule::Logic;

fn holds<S: AsRef<str>>(user: &[S], permission: &str) -> bool {
    user.iter().any(|p| p.as_ref() == permission)
}

/// Flat permission check.
///
/// Empty `required` is vacuously satisfied. `And` needs every permission,
/// `Or` needs at least one.
#[must_use]
pub fn check_permissions<S: AsRef<str>>(user: &[S], required: &[String], logic: Logic) -> bool {
    if required.is_empty() {
        return true;
    }
    match logic {
        Logic::And => required.iter().all(|p| holds(user, p)),
        Logic::Or => required.iter().any(|p| holds(user, p)),
    }
}

/// Grouped permission check.
///
/// A group is satisfied only if every code in it is held, whatever `logic`
/// says. `logic` then combines the groups. Empty `groups` is vacuously
/// satisfied.
#[must_use]
pub fn check_permission_groups<S: AsRef<str>>(
    user: &[S],
    groups: &[Vec<String>],
    logic: Logic,
) -> bool {
    if groups.is_empty() {
        return true;
    }
    let satisfied = |group: &Vec<String>| group.iter().all(|p| holds(user, p));
    match logic {
        Logic::And => groups.iter().all(satisfied),
        Logic::Or => groups.iter().any(satisfied),
    }
}
