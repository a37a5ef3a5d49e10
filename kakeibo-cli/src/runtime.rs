//! Bridge between the synchronous engine seams and the CLI's tokio runtime.

use std::future::Future;

use anyhow::{Context, Result};

/// Run a future to completion from synchronous trait code.
///
/// The CLI uses #[tokio::main], so we're often already inside a runtime.
/// Creating a nested runtime and calling block_on will panic.
///
/// Strategy:
/// - If a runtime is already running: use block_in_place + Handle::block_on
/// - Otherwise: create a runtime and block_on
pub fn wait<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(fut))
    } else {
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        rt.block_on(fut)
    }
}
