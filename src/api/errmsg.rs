//! Client-facing error messages.
//!
//! Infrastructure details (peer addresses, partition numbers) stay in the
//! logs; clients only see these.

/// A peer or partition could not be reached.
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable";

/// The command was accepted but its outcome did not arrive in time.
pub const RESPONSE_TIMEOUT: &str = "Command outcome not available yet";

/// Anything else.
pub const INTERNAL_ERROR: &str = "Internal service error";
