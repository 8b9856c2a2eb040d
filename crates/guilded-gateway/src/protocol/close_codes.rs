//! WebSocket close codes
//!
//! The gateway uses only the standard RFC 6455 codes. Anything else the
//! server sends is passed through as-is to logs and `disconnect` events.

/// Clean shutdown requested by the client
pub const NORMAL: u16 = 1000;
pub const GOING_AWAY: u16 = 1001;
pub const PROTOCOL_ERROR: u16 = 1002;
pub const UNSUPPORTED_DATA: u16 = 1003;
pub const NO_STATUS: u16 = 1005;
pub const ABNORMAL: u16 = 1006;
pub const INVALID_PAYLOAD: u16 = 1007;
pub const POLICY_VIOLATION: u16 = 1008;
pub const MESSAGE_TOO_BIG: u16 = 1009;
pub const INTERNAL_ERROR: u16 = 1011;

/// Human label for a standard close code
#[must_use]
pub const fn label(code: u16) -> Option<&'static str> {
    match code {
        NORMAL => Some("Normal Closure"),
        GOING_AWAY => Some("Going Away"),
        PROTOCOL_ERROR => Some("Protocol Error"),
        UNSUPPORTED_DATA => Some("Unsupported Data"),
        NO_STATUS => Some("No Status Received"),
        ABNORMAL => Some("Abnormal Closure"),
        INVALID_PAYLOAD => Some("Invalid Payload Data"),
        POLICY_VIOLATION => Some("Policy Violation"),
        MESSAGE_TOO_BIG => Some("Message Too Big"),
        INTERNAL_ERROR => Some("Internal Error"),
        _ => None,
    }
}

/// Describe a close code for logs, e.g. `1006 Abnormal Closure`; unknown codes are bare numbers
#[must_use]
pub fn describe(code: u16) -> String {
    match label(code) {
        Some(label) => format!("{code} {label}"),
        None => code.to_string(),
    }
}

/// Whether the close was a clean, client-requested shutdown
#[must_use]
pub const fn is_normal(code: u16) -> bool {
    code == NORMAL
}
