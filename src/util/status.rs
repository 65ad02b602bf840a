use std::fmt;

/// Failure classes reported by the store and its connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    NotFound,
    TableNotFound,
    TableExists,
    TableNotEnabled,
    TableNotDisabled,
    NoSuchColumnFamily,
    InvalidFamilyOperation,
    MasterNotRunning,
    ConnectionRefused,
    InvalidArgument,
    NotSupported,
    IOError,
    Corruption,
    Closed,
}

/// Native error of the underlying store.
///
/// The client layer never hands a `Status` back to callers directly; it is
/// always carried as the source of [`crate::Error::Service`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    pub fn new(code: Code, msg: impl Into<String>) -> Self {
        Status {
            code,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Status::new(Code::NotFound, msg)
    }

    pub fn table_not_found(table: &str) -> Self {
        Status::new(Code::TableNotFound, table)
    }

    pub fn table_exists(table: &str) -> Self {
        Status::new(Code::TableExists, table)
    }

    pub fn table_not_enabled(table: &str) -> Self {
        Status::new(Code::TableNotEnabled, table)
    }

    pub fn table_not_disabled(table: &str) -> Self {
        Status::new(Code::TableNotDisabled, table)
    }

    pub fn no_such_family(msg: impl Into<String>) -> Self {
        Status::new(Code::NoSuchColumnFamily, msg)
    }

    pub fn invalid_family_operation(msg: impl Into<String>) -> Self {
        Status::new(Code::InvalidFamilyOperation, msg)
    }

    pub fn master_not_running(msg: impl Into<String>) -> Self {
        Status::new(Code::MasterNotRunning, msg)
    }

    pub fn connection_refused(msg: impl Into<String>) -> Self {
        Status::new(Code::ConnectionRefused, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status::new(Code::InvalidArgument, msg)
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Status::new(Code::NotSupported, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Status::new(Code::IOError, msg)
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Status::new(Code::Corruption, msg)
    }

    pub fn closed(msg: impl Into<String>) -> Self {
        Status::new(Code::Closed, msg)
    }

    pub fn is_table_not_found(&self) -> bool {
        self.code == Code::TableNotFound
    }

    pub fn is_table_exists(&self) -> bool {
        self.code == Code::TableExists
    }

    pub fn is_no_such_family(&self) -> bool {
        self.code == Code::NoSuchColumnFamily
    }

    pub fn is_io_error(&self) -> bool {
        self.code == Code::IOError
    }

    /// True for failures that mean "the cluster cannot be reached right now"
    /// rather than "the request was wrong".
    pub fn is_connectivity(&self) -> bool {
        matches!(self.code, Code::MasterNotRunning | Code::ConnectionRefused)
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.code)
        } else {
            write!(f, "{:?}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Status {}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Status::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::corruption(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table_exists() {
        let status = Status::table_exists("orders");
        assert!(status.is_table_exists());
        assert_eq!(status.code(), Code::TableExists);
        assert_eq!(status.message(), "orders");
    }

    #[test]
    fn test_status_connectivity() {
        assert!(Status::master_not_running("down").is_connectivity());
        assert!(Status::connection_refused("localhost:2182").is_connectivity());
        assert!(!Status::io_error("disk full").is_connectivity());
    }

    #[test]
    fn test_status_display() {
        let status = Status::io_error("disk full");
        assert_eq!(status.to_string(), "IOError: disk full");
        assert_eq!(Status::new(Code::Closed, "").to_string(), "Closed");
    }

    #[test]
    fn test_status_from_io_error() {
        let err = std::io::Error::other("broken pipe");
        let status = Status::from(err);
        assert!(status.is_io_error());
    }
}
