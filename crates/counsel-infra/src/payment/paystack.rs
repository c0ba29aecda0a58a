//! PaystackProvider -- concrete [`PaymentProvider`] implementation.
//!
//! Initializes transactions through `POST /transaction/initialize` and
//! authenticates callbacks with HMAC-SHA512 over the raw body, keyed by
//! the secret key. The comparison is done on the hex digest the provider
//! sends in its signature header.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use tracing::debug;

use counsel_core::billing::provider::{CheckoutMetadata, PaymentProvider};
use counsel_types::billing::CheckoutSession;
use counsel_types::error::PaymentError;

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    amount: i64,
    metadata: &'a CheckoutMetadata,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

/// HTTP client for the payment provider.
pub struct PaystackProvider {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

impl PaystackProvider {
    pub fn new(base_url: String, secret_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url,
            secret_key,
        }
    }
}

impl PaymentProvider for PaystackProvider {
    async fn initialize(
        &self,
        email: &str,
        amount_kobo: i64,
        metadata: &CheckoutMetadata,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&InitializeRequest {
                email,
                amount: amount_kobo,
                metadata,
            })
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!("status {status}: {message}")));
        }

        let body: InitializeResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let data = match (body.status, body.data) {
            (true, Some(data)) => data,
            _ => return Err(PaymentError::Provider(body.message)),
        };

        debug!(reference = %data.reference, "transaction initialized");
        Ok(CheckoutSession {
            reference: data.reference,
            authorization_url: data.authorization_url,
        })
    }

    fn verify_signature(&self, body: &[u8], signature: &str) -> bool {
        let mut mac = HmacSha512::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(body);
        let digest = mac.finalize().into_bytes();
        let expected = hex_encode(&digest);
        expected.eq_ignore_ascii_case(signature)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
