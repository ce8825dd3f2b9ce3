//! errno normalization for Unix platforms.

use super::OsErrorClass;

/// Map a raw `errno` value into the platform-neutral classification.
pub(crate) fn classify(code: i32) -> OsErrorClass {
    match code {
        0 => OsErrorClass::None,
        libc::EINPROGRESS | libc::EALREADY => OsErrorClass::InProgress,
        libc::EINTR => OsErrorClass::Interrupted,
        // EWOULDBLOCK aliases EAGAIN on every supported target.
        libc::EAGAIN => OsErrorClass::WouldBlock,
        libc::ECONNREFUSED => OsErrorClass::Refused,
        libc::ENETUNREACH | libc::ENETDOWN => OsErrorClass::NetworkUnreachable,
        libc::EHOSTUNREACH | libc::EHOSTDOWN => OsErrorClass::HostUnreachable,
        libc::ETIMEDOUT => OsErrorClass::TimedOut,
        libc::ECONNRESET => OsErrorClass::Reset,
        libc::ECONNABORTED => OsErrorClass::Aborted,
        libc::EADDRNOTAVAIL | libc::EADDRINUSE => OsErrorClass::AddressUnavailable,
        libc::ENOENT | libc::ENOTDIR => OsErrorClass::NotFound,
        libc::EACCES | libc::EPERM => OsErrorClass::PermissionDenied,
        libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM => {
            OsErrorClass::ResourceExhausted
        }
        _ => OsErrorClass::Unrecognized,
    }
}

/// True when a non-blocking Internet-family connect is still in flight.
///
/// An interrupted connect keeps going asynchronously, so `EINTR` counts.
pub(crate) fn connect_pending(class: OsErrorClass) -> bool {
    matches!(class, OsErrorClass::InProgress | OsErrorClass::Interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_codes() {
        assert!(connect_pending(classify(libc::EINPROGRESS)));
        assert!(connect_pending(classify(libc::EINTR)));
        assert!(!connect_pending(classify(libc::EAGAIN)));
        assert!(!connect_pending(classify(libc::ECONNREFUSED)));
    }

    #[test]
    fn network_codes_are_recognized() {
        for code in [
            libc::ECONNREFUSED,
            libc::ENETUNREACH,
            libc::EHOSTUNREACH,
            libc::ETIMEDOUT,
            libc::ECONNRESET,
            libc::ECONNABORTED,
            libc::EADDRNOTAVAIL,
            libc::ENOENT,
        ] {
            assert!(classify(code).is_connect_failure(), "errno {code}");
        }
    }

    #[test]
    fn resource_and_unknown_codes() {
        assert_eq!(classify(libc::EMFILE), OsErrorClass::ResourceExhausted);
        assert_eq!(classify(libc::EBADF), OsErrorClass::Unrecognized);
        assert_eq!(classify(libc::EINVAL), OsErrorClass::Unrecognized);
        assert_eq!(classify(0), OsErrorClass::None);
    }
}
