use super::StoreClient;
use crate::{
    error::{Error, Result, require_not_blank},
    store::{Connector, Handle},
    util::Status,
};

/// Owns a handle and releases it when dropped, unless it was released
/// explicitly first.
pub(crate) struct Scoped<H: Handle> {
    handle: Option<H>,
    kind: &'static str,
}

impl<H: Handle> Scoped<H> {
    pub fn new(handle: H, kind: &'static str) -> Self {
        tracing::debug!(kind, "handle acquired");
        Scoped {
            handle: Some(handle),
            kind,
        }
    }

    /// The held handle. Only `None` after [`Scoped::release`], which
    /// consumes the guard.
    fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Close the handle, reporting a failed close.
    pub fn release(mut self) -> std::result::Result<(), Status> {
        match self.handle.take() {
            Some(mut handle) => {
                tracing::debug!(kind = self.kind, "handle released");
                handle.close()
            }
            None => Ok(()),
        }
    }

    /// Run `op` against the handle, then release it.
    ///
    /// A failure of `op` takes precedence over a failure to release; the
    /// latter is then only logged.
    pub fn run<T, E>(self, op: impl FnOnce(&H) -> std::result::Result<T, E>) -> Result<T>
    where
        E: Into<Error>,
    {
        let handle = self
            .handle()
            .ok_or_else(|| Status::closed(format!("{} handle already released", self.kind)))?;
        let value = op(handle).map_err(Into::into)?;
        self.release()?;
        Ok(value)
    }
}

impl<H: Handle> Drop for Scoped<H> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            match handle.close() {
                Ok(()) => tracing::debug!(kind = self.kind, "handle released by guard"),
                Err(status) => {
                    tracing::warn!(kind = self.kind, error = %status, "failed to release handle")
                }
            }
        }
    }
}

impl<C: Connector> StoreClient<C> {
    /// Run `op` with a fresh admin handle, releasing it afterwards.
    ///
    /// Failure to connect, failure of `op` and failure to release all
    /// surface as [`Error::Service`].
    pub fn with_admin<T, E, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&C::Admin) -> std::result::Result<T, E>,
        E: Into<Error>,
    {
        let admin = self
            .connector
            .connect_admin(&self.configuration.snapshot())?;
        Scoped::new(admin, "admin").run(op)
    }

    /// Run `op` with a fresh handle bound to `table`, releasing it
    /// afterwards.
    ///
    /// Fails with [`Error::InvalidArgument`] before connecting when `table`
    /// is blank.
    pub fn with_table<T, E, F>(&self, table: &str, op: F) -> Result<T>
    where
        F: FnOnce(&C::Table) -> std::result::Result<T, E>,
        E: Into<Error>,
    {
        let handle = self.open_table(table)?;
        Scoped::new(handle, "table").run(op)
    }

    /// Acquire a table handle whose release is up to the caller.
    pub(crate) fn open_table(&self, table: &str) -> Result<C::Table> {
        require_not_blank("table name", table)?;
        Ok(self
            .connector
            .connect_table(&self.configuration.snapshot(), table)?)
    }
}
