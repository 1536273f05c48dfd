/// Core type definitions for the Kite client
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Active session credentials. An empty enctoken means unauthenticated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub enctoken: String,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.enctoken.is_empty()
    }
}

/// A single coerced field value from the instrument master.
///
/// Strike-like columns are numeric, everything else stays text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Empty text acts as a wildcard in catalog queries.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// One row of the instrument master.
///
/// Known columns map to named fields; anything else lands in `extra` so a
/// schema change in the dump does not break queries. Rows shorter than the
/// header leave trailing fields `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instrument {
    pub instrument_token: Option<String>,
    pub exchange_token: Option<String>,
    pub tradingsymbol: Option<String>,
    pub name: Option<String>,
    pub last_price: Option<String>,
    pub expiry: Option<String>,
    pub strike: Option<f64>,
    pub tick_size: Option<String>,
    pub lot_size: Option<String>,
    pub instrument_type: Option<String>,
    pub segment: Option<String>,
    pub exchange: Option<String>,
    pub extra: HashMap<String, String>,
}

impl Instrument {
    /// Store one raw column value under its header name.
    ///
    /// Only strike-like columns are coerced to numbers; lot_size stays text.
    pub(crate) fn set_field(&mut self, column: &str, raw: &str) {
        let value = raw.trim();
        if column.contains("strike") {
            if let Ok(n) = value.parse::<f64>() {
                if n.is_finite() && n >= 0.0 {
                    if column == "strike" {
                        self.strike = Some(n);
                    } else {
                        self.extra.insert(column.to_string(), value.to_string());
                    }
                    return;
                }
            }
        }
        match column {
            "instrument_token" => self.instrument_token = Some(value.to_string()),
            "exchange_token" => self.exchange_token = Some(value.to_string()),
            "tradingsymbol" => self.tradingsymbol = Some(value.to_string()),
            "name" => self.name = Some(value.to_string()),
            "last_price" => self.last_price = Some(value.to_string()),
            "expiry" => self.expiry = Some(value.to_string()),
            "tick_size" => self.tick_size = Some(value.to_string()),
            "lot_size" => self.lot_size = Some(value.to_string()),
            "instrument_type" => self.instrument_type = Some(value.to_string()),
            "segment" => self.segment = Some(value.to_string()),
            "exchange" => self.exchange = Some(value.to_string()),
            _ => {
                self.extra.insert(column.to_string(), value.to_string());
            }
        }
    }

    /// Coerced view of a field by column name, `None` when absent.
    pub fn field(&self, column: &str) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.as_ref().map(|s| FieldValue::Text(s.clone()));
        match column {
            "instrument_token" => text(&self.instrument_token),
            "exchange_token" => text(&self.exchange_token),
            "tradingsymbol" => text(&self.tradingsymbol),
            "name" => text(&self.name),
            "last_price" => text(&self.last_price),
            "expiry" => text(&self.expiry),
            "strike" => self.strike.map(FieldValue::Number),
            "tick_size" => text(&self.tick_size),
            "lot_size" => text(&self.lot_size),
            "instrument_type" => text(&self.instrument_type),
            "segment" => text(&self.segment),
            "exchange" => text(&self.exchange),
            _ => self.extra.get(column).map(|s| {
                if column.contains("strike") {
                    if let Ok(n) = s.parse::<f64>() {
                        return FieldValue::Number(n);
                    }
                }
                FieldValue::Text(s.clone())
            }),
        }
    }
}

/// Result shape of a catalog lookup: a single row keeps its identity, a
/// multi-row match comes back in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentMatch {
    One(Instrument),
    Many(Vec<Instrument>),
}

/// Query for the strike ladder around a reference price.
#[derive(Debug, Clone)]
pub struct OptionChainQuery {
    pub price: f64,
    pub name: String,
    pub expiry: String,
    pub instrument_type: String,
    pub max_strikes: usize,
}

impl OptionChainQuery {
    pub fn new(
        price: f64,
        name: impl Into<String>,
        expiry: impl Into<String>,
        instrument_type: impl Into<String>,
    ) -> Self {
        OptionChainQuery {
            price,
            name: name.into(),
            expiry: expiry.into(),
            instrument_type: instrument_type.into(),
            max_strikes: 5,
        }
    }

    pub fn with_max_strikes(mut self, max_strikes: usize) -> Self {
        self.max_strikes = max_strikes;
        self
    }
}

/// ATM strike plus the nearest strikes above and below the reference price,
/// each list ordered nearest-to-price first.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionChainResult {
    pub atm_strike: Option<f64>,
    pub up_strikes: Vec<f64>,
    pub down_strikes: Vec<f64>,
}

/// Order variety (URL path segment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variety {
    Regular,
    Amo,
    Co,
    Iceberg,
    Auction,
}

impl Variety {
    pub fn as_str(&self) -> &str {
        match self {
            Variety::Regular => "regular",
            Variety::Amo => "amo",
            Variety::Co => "co",
            Variety::Iceberg => "iceberg",
            Variety::Auction => "auction",
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Sl,
    SlM,
}

impl OrderType {
    pub fn as_str(&self) -> &str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Sl => "SL",
            OrderType::SlM => "SL-M",
        }
    }
}

/// Product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Product {
    Cnc,
    Nrml,
    Mis,
}

impl Product {
    pub fn as_str(&self) -> &str {
        match self {
            Product::Cnc => "CNC",
            Product::Nrml => "NRML",
            Product::Mis => "MIS",
        }
    }
}

/// Order validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validity {
    Day,
    Ioc,
    Ttl,
}

impl Validity {
    pub fn as_str(&self) -> &str {
        match self {
            Validity::Day => "DAY",
            Validity::Ioc => "IOC",
            Validity::Ttl => "TTL",
        }
    }
}

/// Transaction side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
        }
    }
}

/// Parameters for placing an order
#[derive(Debug, Clone)]
pub struct OrderParams {
    pub variety: Variety,
    pub tradingsymbol: String,
    pub exchange: String,
    pub transaction_type: TransactionType,
    pub order_type: OrderType,
    pub product: Product,
    pub quantity: i32,
    pub price: Option<f64>,
    pub trigger_price: Option<f64>,
    pub validity: Option<Validity>,
    pub disclosed_quantity: Option<i32>,
    pub tag: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub user_id: String,
    pub password: String,
    pub totp_secret: String,

    #[serde(default = "default_token_file")]
    pub token_file: String,

    #[serde(default = "default_instruments_file")]
    pub instruments_file: String,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_token_file() -> String {
    "access_token.json".to_string()
}

fn default_instruments_file() -> String {
    "instruments.csv".to_string()
}

fn default_http_timeout_secs() -> u64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}
