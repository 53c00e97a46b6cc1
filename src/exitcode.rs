//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error (unknown target, bad restriction syntax)
pub const USAGE: i32 = 64;

/// Data format error (malformed service document or decision path)
pub const DATAERR: i32 = 65;

/// Modeling service unreachable or answered with an HTTP error
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error, including classes missing from the palette
pub const CONFIG: i32 = 78;
