//! Latency and connectivity probe.
//!
//! TLS-dialing records time a TCP connect plus a rustls handshake (the
//! handshake is the expensive part the user will feel); plain records time
//! the bare TCP connect; UDP can only prove a send succeeded, so it reports
//! `Reachable` with no RTT claim. Three attempts per server, median of
//! successes. A probe never fails with an error value; every failure mode is
//! a status.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tk_types::{Protocol, ServerRecord};
use tokio::net::{TcpStream, UdpSocket};
use tokio_rustls::TlsConnector;
use tracing::debug;

const ATTEMPTS: usize = 3;
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);
const BATCH_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyStatus {
    Excellent,
    Good,
    Fair,
    Slow,
    VerySlow,
    /// At least one attempt ran out of time and none succeeded.
    Timeout,
    /// Every attempt was refused or failed to route.
    Unreachable,
    /// UDP only: the send worked, no RTT is known.
    Reachable,
    /// The record cannot be dialed at all (empty address, port 0).
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyResult {
    /// Median RTT in milliseconds, or -1 when unknown.
    pub latency_ms: i64,
    pub status: LatencyStatus,
}

impl LatencyResult {
    fn graded(latency_ms: i64) -> Self {
        let status = match latency_ms {
            ms if ms < 100 => LatencyStatus::Excellent,
            ms if ms < 250 => LatencyStatus::Good,
            ms if ms < 500 => LatencyStatus::Fair,
            ms if ms < 1000 => LatencyStatus::Slow,
            _ => LatencyStatus::VerySlow,
        };
        Self { latency_ms, status }
    }
}

/// Probe one server. Total over its input: all failures become statuses.
pub async fn measure(record: &ServerRecord) -> LatencyResult {
    if record.address.trim().is_empty() || record.port == 0 {
        return LatencyResult {
            latency_ms: -1,
            status: LatencyStatus::Error,
        };
    }
    if record.protocol == Protocol::Udp {
        return measure_udp(record).await;
    }

    let mut successes: Vec<i64> = Vec::with_capacity(ATTEMPTS);
    let mut timed_out = false;
    for attempt in 0..ATTEMPTS {
        match tokio::time::timeout(ATTEMPT_TIMEOUT, dial_once(record)).await {
            Ok(Ok(elapsed)) => successes.push(elapsed.as_millis() as i64),
            Ok(Err(e)) => {
                debug!(attempt, server = %record.display_name(), error = %e, "probe attempt failed");
            }
            Err(_) => timed_out = true,
        }
    }

    if successes.is_empty() {
        let status = if timed_out {
            LatencyStatus::Timeout
        } else {
            LatencyStatus::Unreachable
        };
        return LatencyResult {
            latency_ms: -1,
            status,
        };
    }
    successes.sort_unstable();
    LatencyResult::graded(successes[successes.len() / 2])
}

/// Probe a whole list with bounded concurrency, reporting progress as
/// `(done, total)` after each result. Output order follows completion, with
/// each result keyed by record id.
pub async fn measure_batch<F>(records: &[ServerRecord], progress: F) -> Vec<(String, LatencyResult)>
where
    F: Fn(usize, usize),
{
    let total = records.len();
    let mut results = Vec::with_capacity(total);
    let mut stream = stream::iter(records.iter().cloned())
        .map(|record| async move { (record.id.clone(), measure(&record).await) })
        .buffer_unordered(BATCH_CONCURRENCY);
    while let Some(item) = stream.next().await {
        results.push(item);
        progress(results.len(), total);
    }
    results
}

async fn dial_once(record: &ServerRecord) -> std::io::Result<Duration> {
    let started = Instant::now();
    let tcp = TcpStream::connect((record.address.as_str(), record.port)).await?;

    if record.tls && record.protocol.uses_engine() {
        let server_name = match ServerName::try_from(record.effective_sni().to_string()) {
            Ok(name) => name,
            // Unparseable SNI (rare, e.g. raw IPv6 in sni): TCP time stands.
            Err(_) => return Ok(started.elapsed()),
        };
        let connector = TlsConnector::from(probe_tls_config());
        let _stream = connector.connect(server_name, tcp).await?;
    }

    Ok(started.elapsed())
}

async fn measure_udp(record: &ServerRecord) -> LatencyResult {
    let attempt = async {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .send_to(&[0u8], (record.address.as_str(), record.port))
            .await?;
        Ok::<(), std::io::Error>(())
    };
    match tokio::time::timeout(ATTEMPT_TIMEOUT, attempt).await {
        Ok(Ok(())) => LatencyResult {
            latency_ms: -1,
            status: LatencyStatus::Reachable,
        },
        _ => LatencyResult {
            latency_ms: -1,
            status: LatencyStatus::Unreachable,
        },
    }
}

fn probe_tls_config() -> Arc<ClientConfig> {
    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoVerify))
        .with_no_client_auth();
    Arc::new(config)
}

/// Accepts any certificate. The probe measures handshake time against
/// possibly self-signed or camouflage certs; it never carries user traffic.
#[derive(Debug)]
struct NoVerify;

impl ServerCertVerifier for NoVerify {
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
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}
