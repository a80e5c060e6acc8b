//! Error types for metarmap.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport failures, timeouts, and
//! configuration problems are all captured here.

/// The error type for all metarmap operations.
///
/// Variants cover the failure modes of fetching a streaming weather
/// document over an unreliable network and pushing state to a display:
/// connection failures, idle timeouts, and bad static configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (connection refused, DNS failure, HTTP
    /// status outside the success range).
    #[error("transport error: {0}")]
    Transport(String),

    /// No bytes arrived within the idle timeout.
    ///
    /// Mid-document this is an expected operating condition, not a defect:
    /// the upstream server is free to stall or stop sending at any point.
    #[error("timed out waiting for data")]
    Timeout,

    /// The stream is not open (never opened, or already closed).
    #[error("not connected")]
    NotConnected,

    /// The stream ended: the peer closed the connection or the document
    /// body ran out.
    #[error("connection lost")]
    ConnectionLost,

    /// Invalid static configuration (duplicate or malformed station codes).
    #[error("configuration error: {0}")]
    Config(String),

    /// The display sink rejected a frame.
    #[error("display error: {0}")]
    Display(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("connection refused".into());
        assert_eq!(e.to_string(), "transport error: connection refused");
    }

    #[test]
    fn error_display_timeout() {
        let e = Error::Timeout;
        assert_eq!(e.to_string(), "timed out waiting for data");
    }

    #[test]
    fn error_display_not_connected() {
        let e = Error::NotConnected;
        assert_eq!(e.to_string(), "not connected");
    }

    #[test]
    fn error_display_connection_lost() {
        let e = Error::ConnectionLost;
        assert_eq!(e.to_string(), "connection lost");
    }

    #[test]
    fn error_display_config() {
        let e = Error::Config("duplicate station KJFK".into());
        assert_eq!(e.to_string(), "configuration error: duplicate station KJFK");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }
}
