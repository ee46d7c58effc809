//! OKX REST client implementing the venue gateways

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use common::decimal::parse_or_zero;
use common::error::{Error, Result};
use common::model::{Balance, OrderFill, OrderRequest, OrderStatus, Pair, PlacedOrder, Ticker};

use super::api_types::{
    BalanceData, Envelope, OrderData, PlaceOrderBody, PlaceOrderData, TickerData,
};
use super::config::OkxConfig;
use super::signer::{HmacSigner, RequestSigner};
use crate::gateway::{MarketDataGateway, OrderGateway};

const TICKERS_PATH: &str = "/api/v5/market/tickers?instType=SPOT";
const ORDER_PATH: &str = "/api/v5/trade/order";
const BALANCE_PATH: &str = "/api/v5/account/balance";

/// Venue code for an order id the venue does not know
const ORDER_DOES_NOT_EXIST: &str = "51603";

/// HTTP client for the OKX v5 REST API
#[derive(Clone)]
pub struct OkxClient {
    client: Client,
    base_url: String,
    api_key: String,
    passphrase: String,
    signer: Arc<dyn RequestSigner>,
}

impl OkxClient {
    /// Create a new client from config, signing with HMAC-SHA256
    pub fn new(config: &OkxConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::ConfigurationError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            passphrase: config.passphrase.clone(),
            signer: Arc::new(HmacSigner::new(&config.secret_key)),
        })
    }

    /// Replace the request signer
    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = signer;
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        self.send(Method::GET, path, String::new()).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: String) -> Result<Envelope<T>> {
        self.send(Method::POST, path, body).await
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, body: String) -> Result<Envelope<T>> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        let signature = self.signer.sign(&timestamp, method.as_str(), path, &body)?;

        let mut request = self
            .client
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .header("OK-ACCESS-KEY", &self.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.passphrase);
        if method == Method::POST {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        debug!(method = %method, path, "Sending venue request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::GatewayUnavailable(format!("{} {}: {}", method, path, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::GatewayUnavailable(format!(
                "{} {}: authentication failed ({})",
                method, path, status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::GatewayUnavailable(format!("{} {}: {}", method, path, e)))?;

        serde_json::from_str::<Envelope<T>>(&text).map_err(|_| {
            warn!(status = %status, path, "Unreadable venue response");
            Error::GatewayUnavailable(format!("{} {}: unexpected response ({})", method, path, status))
        })
    }
}

fn unavailable<T>(envelope: &Envelope<T>, what: &str) -> Error {
    Error::GatewayUnavailable(format!("{}: code {}: {}", what, envelope.code, envelope.msg))
}

#[async_trait]
impl MarketDataGateway for OkxClient {
    #[instrument(skip(self), fields(pair = %pair))]
    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker> {
        let envelope: Envelope<TickerData> = self.get(TICKERS_PATH).await?;
        if !envelope.is_ok() {
            return Err(unavailable(&envelope, "ticker lookup"));
        }

        let symbol = pair.symbol();
        let ticker = envelope
            .data
            .iter()
            .find(|t| t.inst_id == symbol)
            .ok_or_else(|| Error::PairNotListed(symbol.clone()))?;

        let last_price = ticker
            .last
            .trim()
            .parse::<Decimal>()
            .map_err(|_| {
                Error::GatewayUnavailable(format!(
                    "venue reported no usable last price for {}: {:?}",
                    symbol, ticker.last
                ))
            })?;

        Ok(Ticker {
            pair: pair.clone(),
            last_price,
        })
    }
}

#[async_trait]
impl OrderGateway for OkxClient {
    #[instrument(skip(self, request), fields(pair = %request.pair, side = %request.side))]
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder> {
        let body = PlaceOrderBody {
            inst_id: request.pair.symbol(),
            td_mode: "cash",
            side: request.side.as_str(),
            ord_type: request.order_type.as_str(),
            sz: request.size.normalize().to_string(),
            px: request.price.map(|p| p.normalize().to_string()),
        };
        let body = serde_json::to_string(&body)?;

        let envelope: Envelope<PlaceOrderData> = self.post(ORDER_PATH, body).await?;
        let first = envelope.data.first();
        let refused = first.map(|d| !d.s_code.is_empty() && d.s_code != "0").unwrap_or(false);

        if !envelope.is_ok() || refused {
            return Err(Error::VenueRejected {
                code: envelope.code.clone(),
                message: envelope.msg.clone(),
                s_code: first.map(|d| d.s_code.clone()).unwrap_or_default(),
                s_msg: first.map(|d| d.s_msg.clone()).unwrap_or_default(),
                order_id: first.map(|d| d.ord_id.clone()).unwrap_or_default(),
            });
        }

        match first {
            Some(data) if !data.ord_id.is_empty() => Ok(PlacedOrder {
                order_id: data.ord_id.clone(),
            }),
            _ => Err(Error::Internal("venue accepted order without an order id".to_string())),
        }
    }

    #[instrument(skip(self), fields(pair = %pair))]
    async fn get_order(&self, order_id: &str, pair: &Pair) -> Result<OrderFill> {
        let path = format!("{}?ordId={}&instId={}", ORDER_PATH, order_id, pair.symbol());
        let envelope: Envelope<OrderData> = self.get(&path).await?;

        if envelope.code == ORDER_DOES_NOT_EXIST {
            return Err(Error::OrderNotFound(order_id.to_string()));
        }
        if !envelope.is_ok() {
            return Err(unavailable(&envelope, "order lookup"));
        }

        let data = envelope
            .data
            .first()
            .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))?;

        Ok(OrderFill {
            filled_price: parse_or_zero(&data.fill_px)?,
            filled_volume: parse_or_zero(&data.fill_sz)?,
            status: data.state.parse::<OrderStatus>()?,
            avg_price: parse_or_zero(&data.avg_px)?,
            accumulated_fill_size: parse_or_zero(&data.acc_fill_sz)?,
        })
    }

    #[instrument(skip(self))]
    async fn get_balance(&self, asset: &str) -> Result<Balance> {
        let path = format!("{}?ccy={}", BALANCE_PATH, asset);
        let envelope: Envelope<BalanceData> = self.get(&path).await?;
        if !envelope.is_ok() {
            return Err(unavailable(&envelope, "balance lookup"));
        }

        let available = envelope
            .data
            .first()
            .and_then(|d| d.details.iter().find(|detail| detail.ccy == asset))
            .map(|detail| parse_or_zero(&detail.avail_bal))
            .transpose()?
            .unwrap_or_default();

        Ok(Balance::new(asset, available))
    }
}
