// Certificates module - peer certificate retrieval and expiry evaluation

pub mod expiry;
pub mod fetcher;
pub mod parser;

pub use expiry::{ExpirySeverity, ExpiryStatus, TimeZoneLabel, evaluate};
pub use fetcher::{CertificateSource, TlsCertificateFetcher};
pub use parser::CertificateInfo;
