//! OKX v5 wire types

use serde::{Deserialize, Serialize};

/// Response envelope shared by every v5 endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        self.code == "0"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerData {
    pub inst_id: String,
    pub last: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    pub inst_id: String,
    pub td_mode: &'static str,
    pub side: &'static str,
    pub ord_type: &'static str,
    pub sz: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub px: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderData {
    #[serde(default)]
    pub ord_id: String,
    #[serde(default)]
    pub s_code: String,
    #[serde(default)]
    pub s_msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    #[serde(default)]
    pub fill_px: String,
    #[serde(default)]
    pub fill_sz: String,
    #[serde(default)]
    pub avg_px: String,
    #[serde(default)]
    pub acc_fill_sz: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct BalanceData {
    #[serde(default)]
    pub details: Vec<BalanceDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDetail {
    pub ccy: String,
    #[serde(default)]
    pub avail_bal: String,
}
