// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Holder details read from the leaf certificate's subject.
//!
//! Qualified certificates carry the holder's fiscal code in several shapes:
//! `CF:IT-<code>` or `TINIT-<code>` inside a name attribute, a bare personal
//! or company code, or only in the `serialNumber` attribute. The patterns
//! below are tried in that order against the rendered subject.

use std::sync::LazyLock;

use regex::Regex;
use rentri_core::RentriError;
use x509_parser::oid_registry::OID_X509_SERIALNUMBER;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::credential::invalid;

static SUBJECT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"CF:IT-([A-Z0-9]{11,16})").unwrap(),
        Regex::new(r"IT-([A-Z0-9]{11,16})").unwrap(),
        // Personal code: RSSMRA80A01H501U
        Regex::new(r"\b([A-Z]{6}[0-9]{2}[A-Z][0-9]{2}[A-Z][0-9]{3}[A-Z])\b").unwrap(),
        // Company code: 11 digits
        Regex::new(r"\b([0-9]{11})\b").unwrap(),
    ]
});

static SERIAL_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z0-9]{11,16})\b").unwrap());

/// What the certificate says about its holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateSubject {
    pub fiscal_code: Option<String>,
    /// Organization name, else common name.
    pub holder_name: Option<String>,
}

impl CertificateSubject {
    /// Parses a DER certificate and extracts the holder details.
    pub fn from_der(der: &[u8]) -> Result<Self, RentriError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| invalid(format!("unreadable certificate: {e}")))?;
        let subject = cert.subject();

        let serial_number = subject
            .iter_by_oid(&OID_X509_SERIALNUMBER)
            .find_map(|attr| attr.as_str().ok());
        let holder_name = subject
            .iter_organization()
            .chain(subject.iter_common_name())
            .find_map(|attr| attr.as_str().ok())
            .map(str::to_owned);

        Ok(Self {
            fiscal_code: fiscal_code_in(&subject.to_string(), serial_number),
            holder_name,
        })
    }
}

/// First fiscal code found in a rendered subject, falling back to the
/// `serialNumber` attribute.
pub fn fiscal_code_in(subject: &str, serial_number: Option<&str>) -> Option<String> {
    SUBJECT_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(subject))
        .or_else(|| serial_number.and_then(|serial| SERIAL_NUMBER_PATTERN.captures(serial)))
        .and_then(|captures| captures.get(1))
        .map(|code| code.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate(attributes: &[(rcgen::DnType, &str)]) -> Vec<u8> {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(vec!["rentri.test".to_string()]).unwrap();
        params.distinguished_name = rcgen::DistinguishedName::new();
        for (kind, value) in attributes {
            params.distinguished_name.push(kind.clone(), *value);
        }
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn prefixed_code_wins_over_bare_code() {
        let text = "CN=ROSSI MARIO BNCLGU70B02F205Z, OU=CF:IT-RSSMRA80A01H501U";
        assert_eq!(
            fiscal_code_in(text, None).as_deref(),
            Some("RSSMRA80A01H501U")
        );
    }

    #[test]
    fn country_prefixed_serial_style_code() {
        let text = "CN=Mario Rossi, serialNumber=TINIT-RSSMRA80A01H501U";
        assert_eq!(
            fiscal_code_in(text, None).as_deref(),
            Some("RSSMRA80A01H501U")
        );
    }

    #[test]
    fn bare_personal_code_then_company_code() {
        assert_eq!(
            fiscal_code_in("CN=RSSMRA80A01H501U, O=Acme", None).as_deref(),
            Some("RSSMRA80A01H501U")
        );
        assert_eq!(
            fiscal_code_in("CN=Acme Srl 01234567890", None).as_deref(),
            Some("01234567890")
        );
    }

    #[test]
    fn serial_number_is_the_last_resort() {
        assert_eq!(
            fiscal_code_in("CN=Acme", Some("ID 0A1B2C3D4E5F")).as_deref(),
            Some("0A1B2C3D4E5F")
        );
        assert_eq!(fiscal_code_in("CN=Acme", Some("short")), None);
        assert_eq!(fiscal_code_in("CN=Acme", None), None);
    }

    #[test]
    fn reads_code_and_organization_from_certificate() {
        let der = certificate(&[
            (rcgen::DnType::CountryName, "IT"),
            (rcgen::DnType::OrganizationName, "Rossi Trasporti Srl"),
            (rcgen::DnType::CommonName, "ROSSI MARIO CF:IT-RSSMRA80A01H501U"),
        ]);
        let subject = CertificateSubject::from_der(&der).unwrap();
        assert_eq!(subject.fiscal_code.as_deref(), Some("RSSMRA80A01H501U"));
        assert_eq!(subject.holder_name.as_deref(), Some("Rossi Trasporti Srl"));
    }

    #[test]
    fn serial_number_attribute_is_consulted() {
        let der = certificate(&[
            (rcgen::DnType::CommonName, "Acme"),
            (rcgen::DnType::CustomDnType(vec![2, 5, 4, 5]), "ID 0A1B2C3D4E5F"),
        ]);
        let subject = CertificateSubject::from_der(&der).unwrap();
        assert_eq!(subject.fiscal_code.as_deref(), Some("0A1B2C3D4E5F"));
        assert_eq!(subject.holder_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn garbage_is_invalid_credential() {
        let err = CertificateSubject::from_der(b"not a certificate").unwrap_err();
        assert!(matches!(err, RentriError::InvalidCredential { .. }));
    }
}
