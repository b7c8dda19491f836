pub mod common;
pub mod traits;
pub mod web;

#[cfg(test)]
pub mod mock;

pub use traits::{BrowserDriver, BrowserLauncher, LaunchOptions, Locator, PageDriver};
