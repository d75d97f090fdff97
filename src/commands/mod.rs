use miette::IntoDiagnostic as _;
use tokio::runtime::Handle;

pub mod chat;
pub mod check;
pub mod init;
pub mod models;
pub mod scan;

/// Run async work from a sync command body, reusing the ambient runtime when
/// one exists.
pub(crate) fn block_on_runtime_aware<F, T>(future: F) -> miette::Result<T>
where
    F: std::future::Future<Output = miette::Result<T>>,
{
    match Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
        Err(_) => {
            let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
            runtime.block_on(future)
        }
    }
}
