//! Subresource integrity checks on response bodies.
//!
//! Metadata is a whitespace separated list of `<alg>-<base64 digest>` tokens,
//! optionally followed by `?options` which are ignored. Only the strongest
//! algorithm present is checked and any of its digests may match. Metadata
//! without a recognized algorithm always passes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::FFError;
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
enum Algorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(Algorithm::Sha256),
            "sha384" => Some(Algorithm::Sha384),
            "sha512" => Some(Algorithm::Sha512),
            _ => None,
        }
    }

    fn digest(&self, data: &[u8]) -> String {
        match self {
            Algorithm::Sha256 => STANDARD.encode(Sha256::digest(data)),
            Algorithm::Sha384 => STANDARD.encode(Sha384::digest(data)),
            Algorithm::Sha512 => STANDARD.encode(Sha512::digest(data)),
        }
    }
}

fn parse_metadata(integrity: &str) -> Vec<(Algorithm, &str)> {
    integrity
        .split_whitespace()
        .filter_map(|token| {
            let token = token.split('?').next()?;
            let (name, digest) = token.split_once('-')?;
            Some((Algorithm::parse(name)?, digest))
        })
        .collect()
}

pub fn verify(integrity: &str, body: &[u8]) -> Result<()> {
    let metadata = parse_metadata(integrity);
    let Some(strongest) = metadata
        .iter()
        .map(|(algorithm, _)| *algorithm)
        .reduce(|a, b| if b > a { b } else { a })
    else {
        return Ok(());
    };
    let actual = strongest.digest(body);
    if metadata
        .iter()
        .any(|(algorithm, digest)| *algorithm == strongest && *digest == actual)
    {
        return Ok(());
    }
    Err(FFError::IntegrityError(format!(
        "Response body does not match {integrity}, got {:?} digest {actual}",
        strongest
    ))
    .into())
}

#[cfg(test)]
mod test {
    use super::*;

    // printf 'hello' | openssl dgst -sha256 -binary | base64
    const HELLO_SHA256: &str = "sha256-LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=";

    #[test]
    fn test_matching_digest_is_ok() {
        assert!(verify(HELLO_SHA256, b"hello").is_ok());
    }

    #[test]
    fn test_mismatching_digest_is_integrity_error() {
        let err = verify(HELLO_SHA256, b"hello!").unwrap_err();
        match err.downcast_ref::<FFError>() {
            Some(FFError::IntegrityError(_)) => (),
            _ => panic!("Expected IntegrityError"),
        }
    }

    #[test]
    fn test_any_digest_of_strongest_algorithm_may_match() {
        let sha512 = format!("sha512-{}", Algorithm::Sha512.digest(b"hello"));
        let integrity = format!("sha256-bogus sha512-bogus {sha512}");
        assert!(verify(&integrity, b"hello").is_ok());
    }

    #[test]
    fn test_weaker_algorithm_is_ignored_when_stronger_present() {
        let integrity = format!("{HELLO_SHA256} sha384-bogus");
        assert!(verify(&integrity, b"hello").is_err());
    }

    #[test]
    fn test_unknown_algorithms_pass() {
        assert!(verify("md5-abc", b"hello").is_ok());
        assert!(verify("", b"hello").is_ok());
    }

    #[test]
    fn test_options_suffix_is_ignored() {
        let integrity = format!("{HELLO_SHA256}?ct=text/plain");
        assert!(verify(&integrity, b"hello").is_ok());
    }
}
