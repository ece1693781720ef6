//! # Error plumbing shared across the crate.
//!
//! Tasks produce arbitrary errors, so the engine works in terms of
//! [`BoxError`] and inspects error chains rather than concrete types. This
//! module carries the "temporary" classification used by the HTTP layer:
//! an error is temporary when retrying it later could plausibly succeed
//! (timeouts, refused connections), as opposed to, say, a malformed URL.

use std::error::Error;
use std::fmt;
use std::io;

/// The error type tasks return and the runner propagates.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Wrapper that marks an error as temporary (or permanent), overriding any
/// heuristic classification. The wrapped error stays visible through
/// [`Error::source`].
#[derive(Debug)]
pub struct Temporary {
    temporary: bool,
    source: BoxError,
}

impl Temporary {
    /// Whether the wrapped failure is expected to clear up on its own.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }
}

impl fmt::Display for Temporary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl Error for Temporary {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

/// Marks `err` as temporary (or not), preserving the original error in the
/// chain.
pub fn set_temporary(err: impl Into<BoxError>, temporary: bool) -> BoxError {
    Box::new(Temporary {
        temporary,
        source: err.into(),
    })
}

/// Classifies an error chain as temporary.
///
/// Walks the chain looking for, per link: an explicit [`Temporary`] marker,
/// a [`reqwest::Error`] (timeouts and connection failures are temporary), or
/// a transient [`io::Error`] kind. Returns `None` when nothing in the chain
/// says either way.
#[must_use]
pub fn temporary_hint(err: &(dyn Error + 'static)) -> Option<bool> {
    let mut current = Some(err);
    while let Some(link) = current {
        if let Some(marker) = link.downcast_ref::<Temporary>() {
            return Some(marker.is_temporary());
        }
        if let Some(transport) = link.downcast_ref::<reqwest::Error>() {
            return Some(transport.is_timeout() || transport.is_connect());
        }
        if let Some(io_err) = link.downcast_ref::<io::Error>() {
            return Some(matches!(
                io_err.kind(),
                io::ErrorKind::TimedOut
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::Interrupted
            ));
        }
        current = link.source();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_overrides_io_classification() {
        // A "permanent" timeout: the explicit marker sits closer to the
        // surface than the io error, so it wins.
        let inner = io::Error::new(io::ErrorKind::TimedOut, "slow origin");
        let err = set_temporary(inner, false);
        assert_eq!(temporary_hint(err.as_ref()), Some(false));
    }

    #[test]
    fn transient_io_kinds_are_temporary() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert_eq!(temporary_hint(&err), Some(true));
    }

    #[test]
    fn permanent_io_kinds_are_not() {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such host");
        assert_eq!(temporary_hint(&err), Some(false));
    }

    #[test]
    fn unclassified_errors_give_no_hint() {
        let bare: BoxError = "opaque".into();
        assert_eq!(temporary_hint(bare.as_ref()), None);
    }

    #[test]
    fn marker_classifies_an_unclassified_error() {
        let err = set_temporary("opaque", true);
        assert_eq!(temporary_hint(err.as_ref()), Some(true));
    }

    #[test]
    fn display_delegates_to_the_source() {
        let err = set_temporary("origin unreachable", true);
        assert_eq!(err.to_string(), "origin unreachable");
    }
}
