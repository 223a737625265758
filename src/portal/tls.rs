//! Workaround for the portal's incomplete TLS certificate chain.
//!
//! The portal host does not serve its intermediate certificate, so chain
//! building fails against the standard trust roots. We fetch the issuing
//! intermediates from their CA-issuers URLs once per process and add them to
//! the client's trust store. Endpoint identity verification stays fully
//! enabled; this only supplies the certificates the server should have sent.

use crate::portal::markup;
use crate::Result;
use anyhow::Context;
use reqwest::Certificate;
use tokio::sync::OnceCell;
use tracing::debug;

static INTERMEDIATES: OnceCell<Vec<Vec<u8>>> = OnceCell::const_new();

/// Returns the intermediate certificates needed to complete the portal's
/// chain, fetching and caching them on first use.
pub(crate) async fn intermediate_certificates() -> Result<Vec<Certificate>> {
    let blobs = INTERMEDIATES.get_or_try_init(fetch_intermediates).await?;
    blobs
        .iter()
        .map(|der| Certificate::from_der(der).context("invalid intermediate certificate"))
        .collect()
}

async fn fetch_intermediates() -> Result<Vec<Vec<u8>>> {
    let client = reqwest::Client::new();
    let mut blobs = Vec::new();
    for url in markup::INTERMEDIATE_CERT_URLS {
        debug!("fetching intermediate certificate from {url}");
        let response = client
            .get(*url)
            .send()
            .await
            .with_context(|| format!("failed to fetch intermediate certificate from {url}"))?
            .error_for_status()
            .with_context(|| format!("intermediate certificate fetch from {url} was rejected"))?;
        let der = response
            .bytes()
            .await
            .with_context(|| format!("failed to read intermediate certificate from {url}"))?;
        blobs.push(der.to_vec());
    }
    Ok(blobs)
}
