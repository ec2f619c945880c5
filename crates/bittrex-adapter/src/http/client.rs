/*
[INPUT]:  HTTP configuration (base URL, timeouts, credentials, rate limits)
[OUTPUT]: Configured client composing admission, transport and normalization
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::http::envelope;
use crate::http::error::{BittrexError, Result};
use crate::http::transport::Transport;
use crate::rate::{AdmissionOutcome, EndpointCategory, RateGovernor, RateLimits};
use crate::types::{ApiRequest, PlacedOrder};

/// Production REST base URL
const API_BASE_URL: &str = "https://api.bittrex.com/api/v1.1/";

const API_KEY_VAR: &str = "BTX_API_KEY";
const API_SECRET_VAR: &str = "BTX_SECRET_KEY";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-call deadline covering connect, send and body read
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest accumulated governor delay honored per call before the
    /// call fails with `RateLimited`
    pub rate_delay_budget: Duration,
    pub limits: RateLimits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            rate_delay_budget: Duration::from_secs(10),
            limits: RateLimits::default(),
        }
    }
}

/// API credentials for authenticated requests.
///
/// Loaded once and owned by the transport; there is no process-global
/// credential state.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read `BTX_API_KEY` / `BTX_SECRET_KEY` from the process environment.
    ///
    /// Absence is a fatal configuration error, surfaced here before any
    /// network call is possible.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var(API_KEY_VAR).ok(),
            std::env::var(API_SECRET_VAR).ok(),
        )
    }

    fn from_vars(api_key: Option<String>, api_secret: Option<String>) -> Result<Self> {
        match (api_key, api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Ok(Self::new(key, secret))
            }
            _ => Err(BittrexError::config(format!(
                "missing {API_KEY_VAR} / {API_SECRET_VAR} in the environment"
            ))),
        }
    }
}

/// Outcome slot for one idempotency marker.
///
/// Concurrent placements sharing a marker serialize on the slot: the first
/// caller performs the wire call, the rest observe its outcome.
enum PlacementSlot {
    Pending,
    Placed(PlacedOrder),
    /// A deadline fired mid-placement; the order may or may not exist on
    /// the exchange, so the marker is poisoned until reconciled out of band
    Uncertain { elapsed_ms: u64 },
}

/// Main client for the exchange REST API.
///
/// One instance may be shared across many concurrent callers; every
/// operation admits through the rate governor, sends through the signing
/// transport and normalizes the envelope before returning.
pub struct BittrexClient {
    transport: Transport,
    governor: RateGovernor,
    rate_delay_budget: Duration,
    placements: Mutex<HashMap<Uuid, Arc<Mutex<PlacementSlot>>>>,
}

impl BittrexClient {
    /// Authenticated client with default configuration
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Authenticated client with credentials taken from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env()?)
    }

    /// Client restricted to public endpoints; authenticated calls fail
    /// with a configuration error before any network work
    pub fn read_only() -> Result<Self> {
        Self::build(None, ClientConfig::default(), API_BASE_URL)
    }

    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        Self::build(Some(credentials), config, API_BASE_URL)
    }

    /// Point the client at a different base URL (stub backends in tests)
    pub fn with_config_and_base_url(
        credentials: Option<Credentials>,
        config: ClientConfig,
        base_url: &str,
    ) -> Result<Self> {
        Self::build(credentials, config, base_url)
    }

    fn build(
        credentials: Option<Credentials>,
        config: ClientConfig,
        base_url: &str,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(BittrexError::Transport)?;
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            transport: Transport::new(http, base_url, credentials, config.timeout),
            governor: RateGovernor::new(config.limits),
            rate_delay_budget: config.rate_delay_budget,
            placements: Mutex::new(HashMap::new()),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.transport.is_authenticated()
    }

    /// Admission, transport and normalization for one operation
    pub(crate) async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.admit(request.category).await?;
        let payload = self.transport.send(&request).await?;
        envelope::normalize(payload)
    }

    /// Honor governor decisions for `category`.
    ///
    /// A `Delay` suspends and then admits again: the token state may have
    /// been consumed by interleaved callers while this one slept, so the
    /// pre-suspension decision is never trusted across the await.
    async fn admit(&self, category: EndpointCategory) -> Result<()> {
        let mut waited = Duration::ZERO;
        loop {
            match self.governor.admit(category) {
                AdmissionOutcome::Proceed => return Ok(()),
                AdmissionOutcome::Delay(wait) => {
                    if waited + wait > self.rate_delay_budget {
                        return Err(BittrexError::RateLimited {
                            category,
                            message: format!(
                                "required delay of {}ms exceeds the {}ms budget",
                                (waited + wait).as_millis(),
                                self.rate_delay_budget.as_millis()
                            ),
                        });
                    }
                    waited += wait;
                    tokio::time::sleep(wait).await;
                }
                AdmissionOutcome::Rejected(reason) => {
                    return Err(BittrexError::RateLimited {
                        category,
                        message: reason,
                    });
                }
            }
        }
    }

    /// Execute an order placement under its idempotency marker.
    ///
    /// At most one wire call is in flight per marker; a recorded success
    /// is returned to every later caller without another network call.
    pub(crate) async fn place_with_marker(&self, request: ApiRequest) -> Result<PlacedOrder> {
        let marker = request.idempotency.ok_or_else(|| {
            BittrexError::invalid_argument("placement requires an idempotency marker")
        })?;
        let slot = {
            let mut placements = self.placements.lock().await;
            Arc::clone(
                placements
                    .entry(marker)
                    .or_insert_with(|| Arc::new(Mutex::new(PlacementSlot::Pending))),
            )
        };

        let mut guard = slot.lock().await;
        match &*guard {
            PlacementSlot::Placed(order) => return Ok(order.clone()),
            PlacementSlot::Uncertain { elapsed_ms } => {
                return Err(BittrexError::Timeout {
                    elapsed_ms: *elapsed_ms,
                    effect_uncertain: true,
                });
            }
            PlacementSlot::Pending => {}
        }

        match self.execute::<PlacedOrder>(request).await {
            Ok(order) => {
                *guard = PlacementSlot::Placed(order.clone());
                Ok(order)
            }
            Err(err) => {
                if let BittrexError::Timeout {
                    elapsed_ms,
                    effect_uncertain: true,
                } = &err
                {
                    *guard = PlacementSlot::Uncertain {
                        elapsed_ms: *elapsed_ms,
                    };
                }
                // definite failures leave the slot Pending; an explicit
                // retry with the same marker may place again
                Err(err)
            }
        }
    }
}

pub(crate) fn require_identifier(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BittrexError::invalid_argument(format!(
            "{what} must not be empty"
        )));
    }
    Ok(())
}

pub(crate) fn require_positive(value: Decimal, what: &str) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(BittrexError::invalid_argument(format!(
            "{what} must be positive, got {value}"
        )));
    }
    Ok(())
}
