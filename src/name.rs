//! Lock name escaping.
//!
//! User-supplied names are percent-escaped so they are legal as a single
//! path component on every platform, and namespaced under [`NAMESPACE`] so
//! they never collide with unrelated lock objects. Any two instances using
//! the same name end up on the same escaped name, and therefore contend for
//! the same lock.
//!
//! Escaping follows RFC 3986: unreserved characters (`A-Z a-z 0-9 - . _ ~`)
//! pass through, every other UTF-8 byte becomes `%XX` with uppercase hex.
//!
//! Escaped names longer than [`MAX_ESCAPED_LEN`] would not fit in a file name
//! on common filesystems. They are cut down and suffixed with `~` and a digest
//! of the full name, so distinct names stay distinct.

use crate::error::{GlobalMutexError, Result};
use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix shared by every lock created by this crate.
pub const NAMESPACE: &str = "global-mutex";

/// Extension of the file that carries the lock itself.
pub const LOCK_EXTENSION: &str = "lock";

/// Extension of the owner record written while the lock is held.
pub const OWNER_EXTENSION: &str = "owner";

/// Longest escaped name used as is. Leaves room for a leading `.`, the
/// extension, and a `.tmp` suffix within a 255-byte file name.
pub const MAX_ESCAPED_LEN: usize = 200;

/// Hex digits of the name digest kept in a shortened name.
const DIGEST_LEN: usize = 16;

/// A validated, escaped lock name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockName {
    raw: String,
    escaped: String,
}

impl LockName {
    /// Validate and escape a user-supplied name.
    ///
    /// Names of any length are accepted; overlong escaped forms are shortened
    /// (see the module docs). Returns a usage error for the empty name.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(GlobalMutexError::Usage(
                "lock name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            raw: name.to_string(),
            escaped: shorten(name, escape(name)),
        })
    }

    /// Rebuild a name from its escaped form, e.g. a lock file stem.
    ///
    /// Only the canonical form is accepted. A shortened name comes back as its
    /// shortened text, which [`LockName::new`] maps to the same file.
    pub fn from_escaped(escaped: &str) -> Option<Self> {
        let raw = unescape(escaped)?;
        let name = Self::new(&raw).ok()?;
        (name.escaped == escaped).then_some(name)
    }

    /// The name as supplied by the user.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The escaped name, legal as a path component.
    pub fn escaped(&self) -> &str {
        &self.escaped
    }

    /// The escaped name under the crate namespace, e.g. `global-mutex/my%20lock`.
    pub fn namespaced(&self) -> String {
        format!("{}/{}", NAMESPACE, self.escaped)
    }

    /// File name of the lock file for this name.
    pub fn lock_file_name(&self) -> String {
        format!("{}.{}", self.escaped, LOCK_EXTENSION)
    }

    /// File name of the owner record for this name.
    pub fn owner_file_name(&self) -> String {
        format!("{}.{}", self.escaped, OWNER_EXTENSION)
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

/// Percent-escape every byte outside the RFC 3986 unreserved set.
pub fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &byte in name.as_bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Cut an overlong escaped name and append `~` plus a digest of `name`.
fn shorten(name: &str, escaped: String) -> String {
    if escaped.len() <= MAX_ESCAPED_LEN {
        return escaped;
    }

    // Never split a `%XX` escape.
    let bytes = escaped.as_bytes();
    let mut cut = MAX_ESCAPED_LEN - DIGEST_LEN - 1;
    while bytes[cut - 1] == b'%' || bytes[cut - 2] == b'%' {
        cut -= 1;
    }

    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{}~{}", &escaped[..cut], &digest[..DIGEST_LEN])
}

/// Reverse [`escape`]. Returns `None` for malformed escapes or non-UTF-8 output.
pub fn unescape(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}
