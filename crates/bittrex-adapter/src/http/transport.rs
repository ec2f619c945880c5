/*
[INPUT]:  ApiRequest values (path, canonical params, auth flag)
[OUTPUT]: Raw JSON payloads, exactly one Result per call
[POS]:    HTTP layer - signed request dispatch with per-call deadline
[UPDATE]: When request shaping, signing, or deadline handling changes
*/

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::http::client::Credentials;
use crate::http::error::{BittrexError, Result};
use crate::http::signature::RequestSigner;
use crate::types::ApiRequest;

struct AuthContext {
    api_key: String,
    signer: RequestSigner,
}

/// Signs and sends HTTP requests. No retry policy lives here; a request
/// goes out at most once and resolves to exactly one Result.
pub(crate) struct Transport {
    http: Client,
    base_url: Url,
    auth: Option<AuthContext>,
    timeout: Duration,
}

impl Transport {
    pub(crate) fn new(
        http: Client,
        base_url: Url,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Self {
        let auth = credentials.map(|creds| AuthContext {
            api_key: creds.api_key,
            signer: RequestSigner::new(creds.api_secret),
        });
        Self {
            http,
            base_url,
            auth,
            timeout,
        }
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// Final URL plus the `apisign` header value for authenticated calls.
    ///
    /// Query parameters end up sorted, with `apikey` and `nonce` folded
    /// into the canonical order, so the signed URI is reproducible.
    fn prepare(&self, request: &ApiRequest) -> Result<(Url, Option<String>)> {
        let mut url = self.base_url.join(request.path)?;
        let mut params = request.params.clone();

        let auth = if request.auth {
            let context = self.auth.as_ref().ok_or_else(|| {
                BittrexError::config("authenticated endpoint called without credentials")
            })?;
            params.push(("apikey".to_string(), context.api_key.clone()));
            params.push(("nonce".to_string(), context.signer.nonce()));
            params.sort_by(|a, b| a.0.cmp(&b.0));
            Some(context)
        } else {
            None
        };

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }

        let apisign = match auth {
            Some(context) => Some(context.signer.sign(url.as_str())?),
            None => None,
        };
        Ok((url, apisign))
    }

    /// Send one request and return the raw JSON payload.
    ///
    /// The deadline covers connect, send, and body read; when it fires
    /// the in-flight future is dropped, so a late response is ignored
    /// rather than surfaced as a second result.
    pub(crate) async fn send(&self, request: &ApiRequest) -> Result<Value> {
        let (url, apisign) = self.prepare(request)?;

        let mut builder = self.http.get(url);
        if let Some(signature) = apisign {
            builder = builder.header("apisign", signature);
        }

        tracing::debug!(path = request.path, category = %request.category, "sending request");

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, async move {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<(StatusCode, String), reqwest::Error>((status, body))
        })
        .await;

        let (status, body) = match outcome {
            Err(_deadline) => {
                tracing::warn!(path = request.path, "request deadline fired");
                return Err(BittrexError::Timeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    effect_uncertain: request.uncertain_on_timeout,
                });
            }
            Ok(Err(err)) if err.is_timeout() => {
                return Err(BittrexError::Timeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    effect_uncertain: request.uncertain_on_timeout,
                });
            }
            Ok(Err(err)) => return Err(BittrexError::Transport(err)),
            Ok(Ok(parts)) => parts,
        };

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|value| {
                    value
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("HTTP failure")
                        .to_string()
                });
            return Err(BittrexError::Exchange {
                code: Some(status.as_u16()),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|err| BittrexError::malformed(format!("body is not JSON: {err}")))
    }
}
