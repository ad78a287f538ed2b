// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token fingerprints.
//!
//! Revocation entries and log lines carry these instead of raw tokens.

use sha2::{Digest, Sha256};

/// Length of the fingerprint prefix written to logs.
const SHORT_LEN: usize = 12;

/// SHA-256 hex digest of a raw token.
pub fn fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Short fingerprint prefix for log lines.
pub fn short_fingerprint(token: &str) -> String {
    let mut fp = fingerprint(token);
    fp.truncate(SHORT_LEN);
    fp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_hex() {
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(short_fingerprint("abc"), "ba7816bf8f01");
    }

    #[test]
    fn distinct_tokens_have_distinct_fingerprints() {
        assert_ne!(fingerprint("a.b.c"), fingerprint("a.b.d"));
        assert_eq!(fingerprint("").len(), 64);
    }
}
