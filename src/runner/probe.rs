use anyhow::Result;

use crate::driver::{Locator, PageDriver};

/// Result of looking for an element that may legitimately be missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Present(T),
    /// Missing, and the caller said that is fine
    AbsentExpected,
    /// Missing where the page should have had it
    AbsentUnexpected,
}

impl<T> Probe<T> {
    pub fn present(self) -> Option<T> {
        match self {
            Probe::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unexpected(&self) -> bool {
        matches!(self, Probe::AbsentUnexpected)
    }
}

/// Whether the probed element must exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

fn absent<T>(presence: Presence) -> Probe<T> {
    match presence {
        Presence::Required => Probe::AbsentUnexpected,
        Presence::Optional => Probe::AbsentExpected,
    }
}

/// Read a form control's value
pub async fn probe_value(
    page: &dyn PageDriver,
    locator: &Locator,
    presence: Presence,
) -> Result<Probe<String>> {
    Ok(match page.field_value(locator).await? {
        Some(value) => Probe::Present(value),
        None => absent(presence),
    })
}
