//! Winsock error normalization.

use super::OsErrorClass;

const WSAEINTR: i32 = 10004;
const WSAEACCES: i32 = 10013;
const WSAEMFILE: i32 = 10024;
const WSAEWOULDBLOCK: i32 = 10035;
const WSAEINPROGRESS: i32 = 10036;
const WSAEALREADY: i32 = 10037;
const WSAEADDRINUSE: i32 = 10048;
const WSAEADDRNOTAVAIL: i32 = 10049;
const WSAENETDOWN: i32 = 10050;
const WSAENETUNREACH: i32 = 10051;
const WSAECONNABORTED: i32 = 10053;
const WSAECONNRESET: i32 = 10054;
const WSAENOBUFS: i32 = 10055;
const WSAETIMEDOUT: i32 = 10060;
const WSAECONNREFUSED: i32 = 10061;
const WSAEHOSTDOWN: i32 = 10064;
const WSAEHOSTUNREACH: i32 = 10065;

/// Map a raw `WSAGetLastError` value into the platform-neutral classification.
pub(crate) fn classify(code: i32) -> OsErrorClass {
    match code {
        0 => OsErrorClass::None,
        WSAEINPROGRESS | WSAEALREADY => OsErrorClass::InProgress,
        WSAEWOULDBLOCK => OsErrorClass::WouldBlock,
        WSAEINTR => OsErrorClass::Interrupted,
        WSAECONNREFUSED => OsErrorClass::Refused,
        WSAENETUNREACH | WSAENETDOWN => OsErrorClass::NetworkUnreachable,
        WSAEHOSTUNREACH | WSAEHOSTDOWN => OsErrorClass::HostUnreachable,
        WSAETIMEDOUT => OsErrorClass::TimedOut,
        WSAECONNRESET => OsErrorClass::Reset,
        WSAECONNABORTED => OsErrorClass::Aborted,
        WSAEADDRNOTAVAIL | WSAEADDRINUSE => OsErrorClass::AddressUnavailable,
        WSAEACCES => OsErrorClass::PermissionDenied,
        WSAEMFILE | WSAENOBUFS => OsErrorClass::ResourceExhausted,
        _ => OsErrorClass::Unrecognized,
    }
}

/// True when a non-blocking connect is still in flight.
///
/// Winsock reports a launched asynchronous connect as `WSAEWOULDBLOCK`.
pub(crate) fn connect_pending(class: OsErrorClass) -> bool {
    matches!(class, OsErrorClass::InProgress | OsErrorClass::WouldBlock)
}
