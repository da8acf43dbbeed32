//! Postcondition checks over the last recorded result.
//!
//! Comparisons are exact equality, or membership by name over a listing.

use crate::client::{ItemCollection, Resource, ResourceKind};
use crate::error::AssertionFailure;

use super::LastResult;

fn single(result: &LastResult) -> Result<&Resource, AssertionFailure> {
    result
        .as_item()
        .ok_or_else(|| AssertionFailure::new("expected a single item, got a list of items"))
}

fn listing(result: &LastResult) -> Result<&ItemCollection, AssertionFailure> {
    result
        .as_collection()
        .ok_or_else(|| AssertionFailure::new("expected a list of items, got a single item"))
}

/// The result is a single item of kind `expected`.
///
/// # Errors
///
/// Returns an `AssertionFailure` describing the mismatch.
pub fn expect_kind(result: &LastResult, expected: ResourceKind) -> Result<(), AssertionFailure> {
    let item = single(result)?;
    if item.kind == expected {
        return Ok(());
    }
    Err(AssertionFailure::new(format!(
        "expected type {}, got {}",
        expected.as_str(),
        item.kind.as_str()
    )))
}

/// The result is a single item called `name` whose parent is `parent_id`.
///
/// # Errors
///
/// Returns an `AssertionFailure` describing the mismatch.
pub fn expect_named_in(
    result: &LastResult,
    name: &str,
    parent_id: &str,
) -> Result<(), AssertionFailure> {
    let item = single(result)?;
    if item.name != name {
        return Err(AssertionFailure::new(format!(
            "expected name '{name}', got '{}'",
            item.name
        )));
    }
    match item.parent_id() {
        Some(actual) if actual == parent_id => Ok(()),
        Some(actual) => Err(AssertionFailure::new(format!(
            "expected parent '{parent_id}', got '{actual}'"
        ))),
        None => Err(AssertionFailure::new(format!(
            "expected parent '{parent_id}', but no parent was reported"
        ))),
    }
}

/// The result is a single item that does, or does not, carry a shared link.
///
/// # Errors
///
/// Returns an `AssertionFailure` describing the mismatch.
pub fn expect_shared_link(result: &LastResult, present: bool) -> Result<(), AssertionFailure> {
    let item = single(result)?;
    match (present, item.shared_link.is_some()) {
        (true, true) | (false, false) => Ok(()),
        (true, false) => Err(AssertionFailure::new(format!(
            "expected '{}' to have a shared link",
            item.name
        ))),
        (false, true) => Err(AssertionFailure::new(format!(
            "expected '{}' to have no shared link",
            item.name
        ))),
    }
}

/// The result is a listing that does, or does not, contain an entry `name`.
///
/// # Errors
///
/// Returns an `AssertionFailure` listing the names that were present.
pub fn expect_listing_contains(
    result: &LastResult,
    name: &str,
    contains: bool,
) -> Result<(), AssertionFailure> {
    let items = listing(result)?;
    if items.contains_name(name) == contains {
        return Ok(());
    }
    let relation = if contains { "to contain" } else { "not to contain" };
    Err(AssertionFailure::new(format!(
        "expected listing {relation} '{name}', got {:?}",
        items.names()
    )))
}

/// The result is a listing whose `total_count` is `expected`.
///
/// # Errors
///
/// Returns an `AssertionFailure` describing the mismatch.
pub fn expect_total_count(result: &LastResult, expected: u64) -> Result<(), AssertionFailure> {
    let items = listing(result)?;
    if items.total_count == expected {
        return Ok(());
    }
    Err(AssertionFailure::new(format!(
        "expected total_count {expected}, got {}",
        items.total_count
    )))
}

/// The subject of the result is, or is not, locked.
///
/// # Errors
///
/// Returns an `AssertionFailure` describing the mismatch.
pub fn expect_locked(result: &LastResult, locked: bool) -> Result<(), AssertionFailure> {
    let item = result
        .subject()
        .ok_or_else(|| AssertionFailure::new("expected a file, got an empty listing"))?;
    if item.lock.is_some() == locked {
        return Ok(());
    }
    let state = if locked { "locked" } else { "unlocked" };
    Err(AssertionFailure::new(format!(
        "expected '{}' to be {state}",
        item.name
    )))
}
