//! ASCII case-insensitive comparison for protocol token matching.
//!
//! Only the letters `a-z`/`A-Z` are folded; every other byte is compared
//! as-is, so results never depend on the process locale. A string ends at
//! the end of the slice or at its first NUL byte, whichever comes first.

/// Byte at `idx`, with the end of the slice reading as a NUL terminator.
#[inline]
fn byte_at(s: &[u8], idx: usize) -> u8 {
    s.get(idx).copied().unwrap_or(0)
}

/// Walk both strings until a mismatch, a terminator or `limit` compared pairs.
///
/// Returns the upper-cased byte pair at the stopping point and whether the
/// limit was what stopped the walk.
fn walk(a: &[u8], b: &[u8], limit: Option<usize>) -> (u8, u8, bool) {
    let mut idx = 0;
    loop {
        if limit == Some(idx) {
            return (0, 0, true);
        }

        let ca = byte_at(a, idx).to_ascii_uppercase();
        let cb = byte_at(b, idx).to_ascii_uppercase();
        if ca != cb || ca == 0 {
            return (ca, cb, false);
        }
        idx += 1;
    }
}

/// Compare two strings ignoring ASCII letter case.
///
/// Returns the signed difference of the (upper-cased) bytes where the walk
/// stopped: zero when both strings end together with every byte matching,
/// negative when `a` sorts first, positive otherwise. Only the sign is
/// meaningful: at a terminator the magnitude is taken from the upper-cased
/// byte, so `compare_ci("ab", "a")` is `66`, not `98`.
///
/// ```
/// use pmap_serial::strcmp::compare_ci;
///
/// assert_eq!(compare_ci("Version", "VERSION"), 0);
/// assert!(compare_ci("ABC", "abd") < 0);
/// ```
pub fn compare_ci(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>) -> i32 {
    let (ca, cb, _) = walk(a.as_ref(), b.as_ref(), None);
    i32::from(ca) - i32::from(cb)
}

/// Like [`compare_ci`], but stops after `max_len` byte pairs.
///
/// When the bound is reached before any mismatch or terminator the result is
/// zero regardless of what follows, so a bound of zero always yields zero.
pub fn compare_ci_bounded(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>, max_len: usize) -> i32 {
    match walk(a.as_ref(), b.as_ref(), Some(max_len)) {
        (_, _, true) => 0,
        (ca, cb, false) => i32::from(ca) - i32::from(cb),
    }
}

/// Convenience wrapper: `true` when [`compare_ci`] reports equality.
pub fn eq_ci(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>) -> bool {
    compare_ci(a, b) == 0
}

/// `true` when `s` starts with `prefix`, ignoring ASCII letter case.
pub fn starts_with_ci(s: impl AsRef<[u8]>, prefix: impl AsRef<[u8]>) -> bool {
    let prefix = prefix.as_ref();
    let len = prefix.iter().position(|&c| c == 0).unwrap_or(prefix.len());
    compare_ci_bounded(s, prefix, len) == 0
}
