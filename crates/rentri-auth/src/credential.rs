// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PKCS#12 bundle decoding and passphrase encoding fallback.

use pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use rentri_core::RentriError;
use strum::Display;
use zeroize::Zeroizing;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// JWS algorithm matching the key type found in the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SigningAlgorithm {
    #[strum(serialize = "RS256")]
    Rs256,
    #[strum(serialize = "ES256")]
    Es256,
    #[strum(serialize = "ES384")]
    Es384,
}

impl From<SigningAlgorithm> for jsonwebtoken::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::Rs256 => jsonwebtoken::Algorithm::RS256,
            SigningAlgorithm::Es256 => jsonwebtoken::Algorithm::ES256,
            SigningAlgorithm::Es384 => jsonwebtoken::Algorithm::ES384,
        }
    }
}

/// Picks the signing algorithm from a PKCS#8 private key's algorithm identifier.
pub fn detect_algorithm(private_key_der: &[u8]) -> Result<SigningAlgorithm, RentriError> {
    let info = PrivateKeyInfo::try_from(private_key_der)
        .map_err(|e| invalid(format!("private key is not PKCS#8: {e}")))?;

    let oid = info.algorithm.oid;
    if oid == RSA_ENCRYPTION {
        Ok(SigningAlgorithm::Rs256)
    } else if oid == EC_PUBLIC_KEY {
        match info.algorithm.parameters_oid() {
            Ok(curve) if curve == SECP384R1 => Ok(SigningAlgorithm::Es384),
            _ => Ok(SigningAlgorithm::Es256),
        }
    } else {
        Err(invalid(format!("unsupported key type {oid}")))
    }
}

/// Private key and leaf certificate extracted from a bundle.
pub struct BundleContents {
    /// PKCS#8 DER.
    pub private_key: Zeroizing<Vec<u8>>,
    /// X.509 DER of the first certificate in the bundle.
    pub certificate: Vec<u8>,
}

/// Decodes a certificate bundle with one passphrase candidate.
///
/// `None` means "no passphrase". Implementations return
/// [`RentriError::InvalidCredential`] when the candidate is rejected.
pub trait BundleDecoder: Send + Sync {
    fn decode(&self, bundle: &[u8], passphrase: Option<&[u8]>)
    -> Result<BundleContents, RentriError>;
}

/// Production decoder for PKCS#12 (.p12 / .pfx) files.
///
/// Passphrase bytes are widened one byte per BMP character before key
/// derivation, so the UTF-8 and Latin-1 candidates derive different keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pkcs12Decoder;

impl BundleDecoder for Pkcs12Decoder {
    fn decode(
        &self,
        bundle: &[u8],
        passphrase: Option<&[u8]>,
    ) -> Result<BundleContents, RentriError> {
        let pfx = p12::PFX::parse(bundle)
            .map_err(|e| invalid(format!("not a PKCS#12 bundle: {e:?}")))?;
        let password = widen(passphrase.unwrap_or_default());

        if !pfx.verify_mac(&password) {
            return Err(invalid("bundle MAC does not verify with this passphrase"));
        }

        let private_key = pfx
            .key_bags(&password)
            .map_err(|e| invalid(format!("cannot decrypt key bag: {e:?}")))?
            .into_iter()
            .next()
            .map(Zeroizing::new)
            .ok_or_else(|| invalid("bundle contains no private key"))?;
        let certificate = pfx
            .cert_x509_bags(&password)
            .map_err(|e| invalid(format!("cannot decrypt certificate bag: {e:?}")))?
            .into_iter()
            .next()
            .ok_or_else(|| invalid("bundle contains no certificate"))?;

        Ok(BundleContents {
            private_key,
            certificate,
        })
    }
}

fn widen(bytes: &[u8]) -> Zeroizing<String> {
    Zeroizing::new(bytes.iter().map(|&b| char::from(b)).collect())
}

/// One passphrase encoding to try against a bundle.
pub struct PassphraseCandidate {
    pub label: &'static str,
    pub bytes: Option<Zeroizing<Vec<u8>>>,
}

/// Ordered passphrase encodings: UTF-8, then Latin-1 when it exists and
/// differs, then no passphrase at all.
pub fn passphrase_candidates(passphrase: Option<&str>) -> Vec<PassphraseCandidate> {
    let mut candidates = Vec::with_capacity(3);

    if let Some(text) = passphrase {
        let utf8 = text.as_bytes();
        candidates.push(PassphraseCandidate {
            label: "utf-8",
            bytes: Some(Zeroizing::new(utf8.to_vec())),
        });

        let latin1: Option<Vec<u8>> = text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect();
        if let Some(latin1) = latin1
            && latin1 != utf8
        {
            candidates.push(PassphraseCandidate {
                label: "latin-1",
                bytes: Some(Zeroizing::new(latin1)),
            });
        }
    }

    candidates.push(PassphraseCandidate {
        label: "none",
        bytes: None,
    });
    candidates
}

/// Tries each passphrase candidate in order and returns the first success.
pub fn decode_with_fallback(
    decoder: &dyn BundleDecoder,
    bundle: &[u8],
    passphrase: Option<&str>,
) -> Result<BundleContents, RentriError> {
    let mut last_error = None;
    for candidate in passphrase_candidates(passphrase) {
        match decoder.decode(bundle, candidate.bytes.as_deref().map(Vec::as_slice)) {
            Ok(contents) => {
                tracing::debug!(encoding = candidate.label, "credential bundle decoded");
                return Ok(contents);
            }
            Err(e) => {
                tracing::debug!(encoding = candidate.label, error = %e, "passphrase candidate rejected");
                last_error = Some(e);
            }
        }
    }

    Err(invalid(match last_error {
        Some(RentriError::InvalidCredential { message }) => {
            format!("bundle could not be opened with any passphrase encoding ({message})")
        }
        _ => "bundle could not be opened with any passphrase encoding".to_string(),
    }))
}

pub(crate) fn invalid(message: impl Into<String>) -> RentriError {
    RentriError::InvalidCredential {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn labels(passphrase: Option<&str>) -> Vec<&'static str> {
        passphrase_candidates(passphrase)
            .iter()
            .map(|c| c.label)
            .collect()
    }

    #[test]
    fn ascii_passphrase_skips_latin1() {
        assert_eq!(labels(Some("secret")), vec!["utf-8", "none"]);
    }

    #[test]
    fn accented_passphrase_adds_latin1() {
        let candidates = passphrase_candidates(Some("pässword"));
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].bytes.as_deref().unwrap().as_slice(), "pässword".as_bytes());
        assert_eq!(
            candidates[1].bytes.as_deref().unwrap().as_slice(),
            b"p\xe4ssword"
        );
        assert!(candidates[2].bytes.is_none());
    }

    #[test]
    fn non_latin1_passphrase_skips_latin1() {
        assert_eq!(labels(Some("p€ss")), vec!["utf-8", "none"]);
    }

    #[test]
    fn missing_passphrase_tries_none_only() {
        assert_eq!(labels(None), vec!["none"]);
    }

    /// Accepts exactly one passphrase and records every attempt.
    struct PickyDecoder {
        accepts: Option<Vec<u8>>,
        attempts: Mutex<Vec<Option<Vec<u8>>>>,
    }

    impl BundleDecoder for PickyDecoder {
        fn decode(
            &self,
            _bundle: &[u8],
            passphrase: Option<&[u8]>,
        ) -> Result<BundleContents, RentriError> {
            self.attempts.lock().unwrap().push(passphrase.map(<[u8]>::to_vec));
            if passphrase.map(<[u8]>::to_vec) == self.accepts {
                Ok(BundleContents {
                    private_key: Zeroizing::new(vec![1]),
                    certificate: vec![2],
                })
            } else {
                Err(invalid("mac mismatch"))
            }
        }
    }

    #[test]
    fn latin1_candidate_wins_after_utf8_fails() {
        let decoder = PickyDecoder {
            accepts: Some(b"p\xe4ssword".to_vec()),
            attempts: Mutex::new(Vec::new()),
        };
        let contents = decode_with_fallback(&decoder, b"bundle", Some("pässword")).unwrap();
        assert_eq!(contents.certificate, vec![2]);

        let attempts = decoder.attempts.lock().unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].as_deref(), Some("pässword".as_bytes()));
    }

    #[test]
    fn no_passphrase_is_last_resort() {
        let decoder = PickyDecoder {
            accepts: None,
            attempts: Mutex::new(Vec::new()),
        };
        assert!(decode_with_fallback(&decoder, b"bundle", Some("wrong")).is_ok());
        assert_eq!(decoder.attempts.lock().unwrap().len(), 2);
    }

    #[test]
    #[tracing_test::traced_test]
    fn rejected_candidates_are_logged_without_the_passphrase() {
        let decoder = PickyDecoder {
            accepts: None,
            attempts: Mutex::new(Vec::new()),
        };
        decode_with_fallback(&decoder, b"bundle", Some("hunter2-s3cret")).unwrap();
        assert!(logs_contain("passphrase candidate rejected"));
        assert!(logs_contain("credential bundle decoded"));
        assert!(!logs_contain("hunter2-s3cret"));
    }

    #[test]
    fn exhausted_candidates_are_invalid_credential() {
        let decoder = PickyDecoder {
            accepts: Some(b"right".to_vec()),
            attempts: Mutex::new(Vec::new()),
        };
        let err = decode_with_fallback(&decoder, b"bundle", Some("wrong"))
            .err()
            .unwrap();
        assert!(matches!(err, RentriError::InvalidCredential { .. }));
    }

    #[test]
    fn garbage_is_not_a_bundle() {
        let err = Pkcs12Decoder.decode(b"not asn.1", Some(b"x")).err().unwrap();
        assert!(matches!(err, RentriError::InvalidCredential { .. }));
    }

    #[test]
    fn detects_ec_p256() {
        let key = rcgen::KeyPair::generate().unwrap();
        assert_eq!(
            detect_algorithm(&key.serialize_der()).unwrap(),
            SigningAlgorithm::Es256
        );
    }

    #[test]
    fn detects_ec_p384() {
        let key = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P384_SHA384).unwrap();
        assert_eq!(
            detect_algorithm(&key.serialize_der()).unwrap(),
            SigningAlgorithm::Es384
        );
    }

    #[test]
    fn detects_rsa() {
        use rsa::pkcs8::EncodePrivateKey;

        let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let der = key.to_pkcs8_der().unwrap();
        assert_eq!(
            detect_algorithm(der.as_bytes()).unwrap(),
            SigningAlgorithm::Rs256
        );
    }

    #[test]
    fn ed25519_is_rejected() {
        let key = rcgen::KeyPair::generate_for(&rcgen::PKCS_ED25519).unwrap();
        let err = detect_algorithm(&key.serialize_der()).unwrap_err();
        assert!(matches!(err, RentriError::InvalidCredential { .. }));
    }
}
