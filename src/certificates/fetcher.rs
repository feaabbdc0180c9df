// TLS Certificate Fetcher - pull the peer certificate from a live handshake

use crate::certificates::parser::{CertificateInfo, parse_certificate};
use crate::utils::network::{Target, connect_with_timeout, resolve_hostname};
use crate::{MonitorError, Result};
use async_trait::async_trait;
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

/// Default bound for TCP connect and for the TLS handshake
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce the peer certificate of a target
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Fetch the leaf certificate presented by `target`
    async fn fetch(&self, target: &Target) -> Result<CertificateInfo>;
}

/// Full WebPKI verification, except that an expired leaf is still accepted
///
/// The chain and hostname of an expired certificate are checked as of one
/// second before its notAfter, so the monitor can report it as expired
/// instead of failing the handshake.
#[derive(Debug)]
struct ExpiryTolerantVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ExpiryTolerantVerifier {
    fn last_valid_instant(end_entity: &CertificateDer<'_>) -> Option<UnixTime> {
        let (_, cert) = X509Certificate::from_der(end_entity.as_ref()).ok()?;
        let not_after = cert.validity().not_after.timestamp().checked_sub(1)?;
        let secs = u64::try_from(not_after).ok()?;
        Some(UnixTime::since_unix_epoch(Duration::from_secs(secs)))
    }
}

impl ServerCertVerifier for ExpiryTolerantVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(
                CertificateError::Expired | CertificateError::ExpiredContext { .. },
            )) => {
                let at = Self::last_valid_instant(end_entity).ok_or(
                    rustls::Error::InvalidCertificate(CertificateError::BadEncoding),
                )?;
                tracing::debug!("Peer certificate has expired, verifying it as of its notAfter");
                self.inner
                    .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, at)
            }
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Fetches certificates over a real TLS handshake
///
/// The handshake validates the chain against the Mozilla root set and the
/// hostname against the certificate. Expiry alone does not fail it.
pub struct TlsCertificateFetcher {
    connector: TlsConnector,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl TlsCertificateFetcher {
    /// Create new fetcher trusting the bundled Mozilla roots
    pub fn new() -> Result<Self> {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_roots(root_store)
    }

    /// Create a fetcher trusting only `root_store`
    pub fn with_roots(root_store: RootCertStore) -> Result<Self> {
        let provider: Arc<CryptoProvider> = Arc::new(rustls::crypto::ring::default_provider());

        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(root_store), provider.clone())
            .build()
            .map_err(|e| MonitorError::config(format!("Failed to build certificate verifier: {}", e)))?;

        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| MonitorError::config(format!("Failed to set protocol versions: {}", e)))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(ExpiryTolerantVerifier { inner }))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            connect_timeout: DEFAULT_TIMEOUT,
            handshake_timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }
}

#[async_trait]
impl CertificateSource for TlsCertificateFetcher {
    async fn fetch(&self, target: &Target) -> Result<CertificateInfo> {
        let host = target.identifier();
        tracing::debug!("Getting the SSL certificate information from {}", host);

        let addrs = resolve_hostname(&target.hostname).await?;
        let stream = connect_with_timeout(target, &addrs, self.connect_timeout).await?;

        let server_name = ServerName::try_from(target.hostname.as_str())
            .map_err(|e| MonitorError::Protocol {
                host: host.clone(),
                details: format!("Invalid server name: {}", e),
            })?
            .to_owned();

        let tls_stream = match timeout(
            self.handshake_timeout,
            self.connector.connect(server_name, stream),
        )
        .await
        {
            Ok(Ok(tls_stream)) => tls_stream,
            Ok(Err(e)) => {
                return Err(MonitorError::Protocol {
                    host,
                    details: e.to_string(),
                });
            }
            Err(_) => {
                return Err(MonitorError::Protocol {
                    host,
                    details: format!("Handshake timed out after {:?}", self.handshake_timeout),
                });
            }
        };

        let (_io, connection) = tls_stream.into_inner();
        let leaf = connection
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| MonitorError::Protocol {
                host: host.clone(),
                details: "No certificates received from server".to_string(),
            })?;

        let info = parse_certificate(&host, leaf.as_ref())?;
        tracing::debug!("SSL certificate info for {} = {:?}", host, info);

        Ok(info)
    }
}
