//! HTTP transport: signing, TLS trust, body streaming, response
//! classification and chain-state tracking.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::{stream, Stream};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Certificate, Method, StatusCode, Url};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use bitwallet_types::{ChainState, ChainStateCell, Network};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::signer::{AuthHeaders, RequestSigner, HEADER_IDENTITY, HEADER_NONCE, HEADER_SIGNATURE};

pub const HEADER_NETWORK: &str = "x-bitcoin-network";
pub const HEADER_HEIGHT: &str = "x-bitcoin-height";
pub const HEADER_HASH: &str = "x-bitcoin-hash";

/// Read size for uploads, both when hashing and when sending.
pub const UPLOAD_BUFFER_SIZE: usize = 64 * 1024;

const JSON_CONTENT_TYPE: &str = "application/json";
const UPLOAD_CONTENT_TYPE: &str = "multipart/form-data";

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Streamed from disk; never loaded into memory.
    Upload { path: PathBuf },
}

/// One request against the service, relative to the configured base URL.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, RequestBody::Empty)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path, RequestBody::Empty)
    }

    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path, RequestBody::Json(body))
    }

    pub fn upload(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self::new(Method::POST, path, RequestBody::Upload { path: file.into() })
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// A classified, successful response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Value::Null` when the service sent no body.
    pub body: Value,
}

/// The certificate presented by the service on a TLS connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerCertificate {
    pub der: Vec<u8>,
    /// SHA-256 of the DER bytes, uppercase hex pairs joined by `:`.
    pub fingerprint: String,
}

impl PeerCertificate {
    pub fn from_der(der: Vec<u8>) -> Self {
        let fingerprint = Sha256::digest(&der)
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":");
        Self { der, fingerprint }
    }
}

/// Trust-on-first-use hook.
///
/// Called once per response with the observed peer certificate, after the
/// body has been received and before the result is handed back. Returning
/// an error aborts the request.
pub trait KnownHostHandler: Send + Sync {
    fn save_known_host(&self, cert: &PeerCertificate) -> Result<(), String>;
}

/// Sends [`ApiRequest`]s to the wallet service.
pub struct TransportClient {
    http: reqwest::Client,
    base_url: Url,
    network: Network,
    signer: RequestSigner,
    known_host_handler: Option<Arc<dyn KnownHostHandler>>,
}

impl TransportClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url()?;
        let signer = RequestSigner::from_config(config)?;

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .tls_info(true)
            .user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        builder = match &config.known_hosts {
            Some(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    ClientError::Config(format!("known_hosts {}: {e}", path.display()))
                })?;
                let certs = Certificate::from_pem_bundle(&pem)
                    .map_err(|e| ClientError::Config(format!("known_hosts: {e}")))?;
                if certs.is_empty() {
                    return Err(ClientError::Config(format!(
                        "known_hosts {} holds no certificates",
                        path.display()
                    )));
                }
                certs.into_iter().fold(
                    builder.tls_built_in_root_certs(false),
                    reqwest::ClientBuilder::add_root_certificate,
                )
            }
            None => builder.danger_accept_invalid_certs(true),
        };

        Ok(Self {
            http: builder.build()?,
            base_url,
            network: config.network,
            signer,
            known_host_handler: None,
        })
    }

    pub fn with_known_host_handler(mut self, handler: Arc<dyn KnownHostHandler>) -> Self {
        self.known_host_handler = Some(handler);
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Absolute URL for a request, query string included. This is the exact
    /// string that gets signed.
    pub fn full_url(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        url.set_path(&path);
        url.set_query(None);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        url
    }

    /// Send one request and classify the response.
    ///
    /// Once the body has parsed, the shared chain state is overwritten from
    /// the response headers.
    pub async fn send(
        &self,
        request: &ApiRequest,
        chain: &ChainStateCell,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.full_url(request);
        let method = request.method.as_str();
        let mut builder = self.http.request(request.method.clone(), url.clone());

        let auth = match &request.body {
            RequestBody::Empty => {
                builder = builder
                    .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                    .body(Vec::new());
                self.signer.sign(method, url.as_str(), b"")
            }
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value)?;
                let auth = self.signer.sign(method, url.as_str(), &bytes);
                builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(bytes);
                auth
            }
            RequestBody::Upload { path } => {
                let auth = self.signer.sign_file(method, url.as_str(), path).await?;
                let file = tokio::fs::File::open(path).await?;
                let len = file.metadata().await?.len();
                builder = builder
                    .header(CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
                    .header(CONTENT_LENGTH, len)
                    .body(Body::wrap_stream(file_chunks(file)));
                auth
            }
        };
        if let Some(AuthHeaders {
            identity,
            signature,
            nonce,
        }) = auth
        {
            builder = builder
                .header(HEADER_IDENTITY, identity)
                .header(HEADER_SIGNATURE, signature)
                .header(HEADER_NONCE, nonce);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let peer_cert = response
            .extensions()
            .get::<reqwest::tls::TlsInfo>()
            .and_then(|info| info.peer_certificate())
            .map(|der| PeerCertificate::from_der(der.to_vec()));
        let raw = response.bytes().await?;
        debug!(method, url = %url, status = status.as_u16(), bytes = raw.len(), "response");

        offer_certificate(self.known_host_handler.as_deref(), peer_cert.as_ref())?;
        classify(status, &headers, &raw, self.network)?;

        let body = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw)?
        };
        chain.replace(chain_state_from_headers(&headers));
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Hand the observed peer certificate to the known-host handler. A refusal
/// becomes [`ClientError::TrustRejected`]. Nothing happens without both a
/// handler and a certificate.
pub fn offer_certificate(
    handler: Option<&dyn KnownHostHandler>,
    cert: Option<&PeerCertificate>,
) -> Result<(), ClientError> {
    let (Some(handler), Some(cert)) = (handler, cert) else {
        return Ok(());
    };
    debug!(fingerprint = %cert.fingerprint, "offering peer certificate to known-host handler");
    handler.save_known_host(cert).map_err(|reason| {
        warn!(fingerprint = %cert.fingerprint, %reason, "peer certificate rejected");
        ClientError::TrustRejected(reason)
    })
}

/// Map a response to its error class, if any.
///
/// Status classes are checked before the network header, so a 404 from a
/// service on the wrong network is still a not-found error. Statuses outside
/// the listed classes are treated as success.
pub fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    local: Network,
) -> Result<(), ClientError> {
    let message = || String::from_utf8_lossy(body).into_owned();
    match status.as_u16() {
        404 => return Err(ClientError::NotFound),
        400 => return Err(ClientError::BadRequest { message: message() }),
        401 => return Err(ClientError::Unauthorized { message: message() }),
        code if code >= 500 => {
            return Err(ClientError::Server {
                status: code,
                message: message(),
            })
        }
        _ => {}
    }
    if let Some(value) = headers.get(HEADER_NETWORK) {
        let server = String::from_utf8_lossy(value.as_bytes()).into_owned();
        if server.parse::<Network>().ok() != Some(local) {
            warn!(%server, %local, "network mismatch");
            return Err(ClientError::NetworkMismatch { server, local });
        }
    }
    Ok(())
}

/// Chain tip as reported by this response. Missing or unparseable fields
/// are unset.
pub fn chain_state_from_headers(headers: &HeaderMap) -> ChainState {
    let text = |name| headers.get(name).and_then(|v| v.to_str().ok());
    ChainState {
        height: text(HEADER_HEIGHT).and_then(|h| h.trim().parse().ok()),
        hash: text(HEADER_HASH).map(str::to_owned),
    }
}

fn file_chunks(file: tokio::fs::File) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> {
    stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; UPLOAD_BUFFER_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some((buf, file)))
    })
}
