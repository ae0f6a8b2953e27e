// ABOUTME: TLS client setup for SMPP over TLS using rustls
// ABOUTME: Validating mode trusts webpki and native roots, insecure mode accepts any server certificate

use crate::client::error::{SmppError, SmppResult};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

/// Transport security for a transmitter session.
///
/// Absence of `TlsOptions` means plain TCP.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Expected server identity, normally the host part of the SMSC address.
    /// Sent as SNI and checked against the certificate in validating mode.
    pub server_name: String,

    /// Skip certificate validation entirely. The link is still encrypted but
    /// the SMSC is not authenticated.
    pub insecure_skip_verify: bool,

    /// Trust anchors added on top of the webpki and native roots, for SMSCs
    /// signed by a private CA.
    pub extra_roots: Vec<CertificateDer<'static>>,
}

impl TlsOptions {
    /// Validating TLS towards `server_name`.
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Default::default()
        }
    }

    pub fn insecure(mut self, insecure_skip_verify: bool) -> Self {
        self.insecure_skip_verify = insecure_skip_verify;
        self
    }

    pub fn with_root(mut self, cert: CertificateDer<'static>) -> Self {
        self.extra_roots.push(cert);
        self
    }
}

// Placeholder identity for insecure sessions without a usable server name.
// SNI is switched off in that case so it never reaches the wire.
const ANONYMOUS_SERVER: &str = "smsc.invalid";

/// Builds the rustls client configuration and the name to present for
/// `options`.
pub fn client_config(options: &TlsOptions) -> SmppResult<(ClientConfig, ServerName<'static>)> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| SmppError::InvalidState(format!("TLS setup failed: {e}")))?;

    if options.insecure_skip_verify {
        warn!("TLS certificate verification is disabled");

        let mut config = builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
            .with_no_client_auth();

        let name = match ServerName::try_from(options.server_name.clone()) {
            Ok(name) => name,
            Err(_) => {
                debug!("no usable TLS server name, sending no SNI");
                config.enable_sni = false;
                ServerName::try_from(ANONYMOUS_SERVER)
                    .map_err(|_| SmppError::InvalidServerName(ANONYMOUS_SERVER.to_string()))?
            }
        };
        return Ok((config, name));
    }

    let name = ServerName::try_from(options.server_name.clone())
        .map_err(|_| SmppError::InvalidServerName(options.server_name.clone()))?;

    let config = builder
        .with_root_certificates(root_store(options)?)
        .with_no_client_auth();
    Ok((config, name))
}

/// Trust anchors for validating mode: the bundled webpki roots, the
/// platform's native store, then `options.extra_roots`.
///
/// An unreadable native store only costs its anchors; a bad extra root is
/// an error.
pub fn root_store(options: &TlsOptions) -> SmppResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let native = rustls_native_certs::load_native_certs();
    for e in &native.errors {
        warn!("skipping part of the native certificate store: {}", e);
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!("native trust anchors: {} added, {} ignored", added, ignored);

    for cert in &options.extra_roots {
        roots
            .add(cert.clone())
            .map_err(|e| SmppError::InvalidState(format!("bad trust anchor: {e}")))?;
    }
    Ok(roots)
}

/// Runs the client side of the TLS handshake over an established stream.
pub async fn handshake<S>(stream: S, options: &TlsOptions) -> SmppResult<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (config, name) = client_config(options)?;
    debug!("TLS handshake with {:?}", name);

    TlsConnector::from(Arc::new(config))
        .connect(name, stream)
        .await
        .map_err(SmppError::Tls)
}

/// Certificate verifier for `insecure_skip_verify`.
///
/// Any chain is accepted, but handshake signatures are still checked so the
/// peer must hold the key of the certificate it presents.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validating_mode_requires_a_name() {
        let err = client_config(&TlsOptions::new("")).unwrap_err();
        assert!(matches!(err, SmppError::InvalidServerName(name) if name.is_empty()));

        let err = client_config(&TlsOptions::new("not a host")).unwrap_err();
        assert!(matches!(err, SmppError::InvalidServerName(_)));
    }

    #[test]
    fn validating_mode_presents_the_host() {
        let (config, name) = client_config(&TlsOptions::new("smsc.example.com")).unwrap();
        assert!(config.enable_sni);
        assert_eq!(name.to_str(), "smsc.example.com");
    }

    #[test]
    fn ip_literals_are_valid_names() {
        let (_, name) = client_config(&TlsOptions::new("::1")).unwrap();
        assert!(matches!(name, ServerName::IpAddress(_)));
    }

    #[test]
    fn extra_roots_extend_the_default_anchors() {
        let base = root_store(&TlsOptions::new("localhost")).unwrap();
        assert!(base.len() >= webpki_roots::TLS_SERVER_ROOTS.len());

        let cert = rcgen::generate_simple_self_signed(vec!["smsc.internal".to_string()])
            .unwrap()
            .cert;
        let options = TlsOptions::new("smsc.internal").with_root(cert.der().clone());
        assert_eq!(root_store(&options).unwrap().len(), base.len() + 1);
    }

    #[test]
    fn garbage_extra_root_is_rejected() {
        let options = TlsOptions::new("localhost").with_root(CertificateDer::from(vec![0u8; 8]));
        assert!(matches!(
            root_store(&options),
            Err(SmppError::InvalidState(reason)) if reason.contains("trust anchor")
        ));
    }

    #[test]
    fn insecure_mode_tolerates_missing_name() {
        let (config, _) = client_config(&TlsOptions::new("").insecure(true)).unwrap();
        assert!(!config.enable_sni);

        let (config, name) = client_config(&TlsOptions::new("localhost").insecure(true)).unwrap();
        assert!(config.enable_sni);
        assert_eq!(name.to_str(), "localhost");
    }
}
