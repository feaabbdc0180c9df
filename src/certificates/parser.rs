// Certificate Parser - Extract peer certificate fields from DER

use crate::{MonitorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use x509_parser::prelude::*;

/// Textual form of certificate validity timestamps, e.g. `Jul 13 15:59:44 2022 GMT`
pub const CERT_TIME_FORMAT: &str = "%b %e %H:%M:%S %Y GMT";

/// CA Issuers access method (id-ad-caIssuers)
const OID_AD_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";
/// OCSP access method (id-ad-ocsp)
const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

/// Snapshot of the peer certificate presented during one handshake
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub version: u32,
    pub serial_number: String,
    pub not_before: String,
    pub not_after: String,
    pub subject_alt_names: Vec<String>,
    pub ocsp: Vec<String>,
    pub ca_issuers: Vec<String>,
    pub crl_distribution_points: Vec<String>,
}

/// Render a unix timestamp in the certificate validity format
pub fn format_cert_time(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.format(CERT_TIME_FORMAT).to_string())
}

/// Parse a single certificate from DER bytes
///
/// `host` is only used to label the error.
pub fn parse_certificate(host: &str, der_bytes: &[u8]) -> Result<CertificateInfo> {
    let (_, cert) =
        X509Certificate::from_der(der_bytes).map_err(|e| MonitorError::MalformedCertificate {
            host: host.to_string(),
            details: format!("Failed to parse certificate: {:?}", e),
        })?;

    let validity = cert.validity();
    let not_before = format_cert_time(validity.not_before.timestamp()).ok_or_else(|| {
        MonitorError::MalformedCertificate {
            host: host.to_string(),
            details: "notBefore is out of range".to_string(),
        }
    })?;
    let not_after = format_cert_time(validity.not_after.timestamp()).ok_or_else(|| {
        MonitorError::MalformedCertificate {
            host: host.to_string(),
            details: "notAfter is out of range".to_string(),
        }
    })?;

    let mut info = CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        version: cert.version().0 + 1,
        serial_number: format!("{:x}", cert.serial),
        not_before,
        not_after,
        ..Default::default()
    };

    // Subject Alternative Names
    if let Ok(Some(ext)) = cert.get_extension_unique(&oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME)
        && let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension()
    {
        for name in &san.general_names {
            match name {
                GeneralName::DNSName(dns) => info.subject_alt_names.push(format!("DNS:{}", dns)),
                GeneralName::IPAddress(ip) => {
                    if let Some(addr) = ip_from_bytes(ip) {
                        info.subject_alt_names.push(format!("IP Address:{}", addr));
                    }
                }
                GeneralName::URI(uri) => info.subject_alt_names.push(format!("URI:{}", uri)),
                GeneralName::RFC822Name(email) => {
                    info.subject_alt_names.push(format!("email:{}", email))
                }
                _ => {}
            }
        }
    }

    // Authority Information Access: OCSP responders and CA issuers
    if let Ok(Some(ext)) =
        cert.get_extension_unique(&oid_registry::OID_PKIX_AUTHORITY_INFO_ACCESS)
        && let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension()
    {
        for access_desc in &aia.accessdescs {
            if let GeneralName::URI(uri) = &access_desc.access_location {
                match access_desc.access_method.to_id_string().as_str() {
                    OID_AD_OCSP => info.ocsp.push(uri.to_string()),
                    OID_AD_CA_ISSUERS => info.ca_issuers.push(uri.to_string()),
                    _ => {}
                }
            }
        }
    }

    // CRL Distribution Points
    if let Ok(Some(ext)) =
        cert.get_extension_unique(&oid_registry::OID_X509_EXT_CRL_DISTRIBUTION_POINTS)
        && let ParsedExtension::CRLDistributionPoints(crl_dp) = ext.parsed_extension()
    {
        for point in &crl_dp.points {
            if let Some(DistributionPointName::FullName(names)) = &point.distribution_point {
                for name in names {
                    if let GeneralName::URI(uri) = name {
                        info.crl_distribution_points.push(uri.to_string());
                    }
                }
            }
        }
    }

    Ok(info)
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}
