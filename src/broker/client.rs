/// Kite REST client: session wiring plus one method per endpoint
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::broker::endpoints;
use crate::broker::session::SessionManager;
use crate::broker::token_store::TokenStore;
use crate::broker::transport::{HttpTransport, Payload, Transport};
use crate::error::{KiteError, Result};
use crate::types::{Config, OrderParams, Session, Variety};

/// Client over the trading API. Each method is a direct pass-through to one
/// endpoint; callers establish a session first via `session()`.
pub struct KiteClient<T: Transport> {
    transport: Arc<T>,
    session: Arc<SessionManager<T>>,
}

impl KiteClient<HttpTransport> {
    /// Wire up the real HTTP stack from configuration.
    pub fn from_config(config: &Config) -> Self {
        let session_state = Arc::new(RwLock::new(Session::default()));
        let transport = Arc::new(HttpTransport::new(
            Arc::clone(&session_state),
            config.http_timeout_secs,
        ));
        let session = Arc::new(SessionManager::new(
            Arc::clone(&transport),
            session_state,
            TokenStore::new(&config.token_file),
            config.user_id.clone(),
            config.password.clone(),
            config.totp_secret.clone(),
        ));
        KiteClient { transport, session }
    }
}

impl<T: Transport> KiteClient<T> {
    pub fn new(transport: Arc<T>, session: Arc<SessionManager<T>>) -> Self {
        KiteClient { transport, session }
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    /// User balance and margins per segment
    pub async fn margins(&self) -> Result<Value> {
        self.get(endpoints::USER_MARGINS, &[]).await
    }

    /// User profile
    pub async fn profile(&self) -> Result<Value> {
        self.get(endpoints::USER_PROFILE, &[]).await
    }

    /// All orders (open and executed) for the day
    pub async fn orders(&self) -> Result<Value> {
        self.get(endpoints::ORDERS, &[]).await
    }

    /// All executed trades for the day
    pub async fn trades(&self) -> Result<Value> {
        self.get(endpoints::TRADES, &[]).await
    }

    /// History of a single order
    pub async fn order_info(&self, order_id: &str) -> Result<Value> {
        if order_id.is_empty() {
            return Err(KiteError::MissingInput("order_id missing".to_string()));
        }
        self.get(endpoints::ORDER_INFO, &[("order_id", order_id)])
            .await
    }

    /// Trades generated by a single order
    pub async fn order_trades(&self, order_id: &str) -> Result<Value> {
        if order_id.is_empty() {
            return Err(KiteError::MissingInput("order_id missing".to_string()));
        }
        self.get(endpoints::ORDER_TRADES, &[("order_id", order_id)])
            .await
    }

    /// Place an order
    pub async fn place_order(&self, params: &OrderParams) -> Result<Value> {
        validate_order_params(params)?;

        let url = endpoints::resolve(
            endpoints::PLACE_ORDER,
            &[("variety", params.variety.as_str())],
        );
        debug!(tradingsymbol = %params.tradingsymbol, "placing order");
        self.transport
            .request(Method::POST, &url, Payload::Form(order_form(params)))
            .await
    }

    /// Modify a pending order
    pub async fn modify_order(&self, order_id: &str, params: &OrderParams) -> Result<Value> {
        if order_id.is_empty() {
            return Err(KiteError::MissingInput("order_id missing".to_string()));
        }
        validate_order_params(params)?;

        let url = endpoints::resolve(
            endpoints::MODIFY_ORDER,
            &[("variety", params.variety.as_str()), ("order_id", order_id)],
        );
        self.transport
            .request(Method::PUT, &url, Payload::Form(order_form(params)))
            .await
    }

    /// Cancel a pending order
    pub async fn cancel_order(&self, variety: Variety, order_id: &str) -> Result<Value> {
        if order_id.is_empty() {
            return Err(KiteError::MissingInput("order_id missing".to_string()));
        }
        let url = endpoints::resolve(
            endpoints::CANCEL_ORDER,
            &[("variety", variety.as_str()), ("order_id", order_id)],
        );
        self.transport
            .request(Method::DELETE, &url, Payload::None)
            .await
    }

    async fn get(&self, template: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = endpoints::resolve(template, params);
        self.transport.request(Method::GET, &url, Payload::None).await
    }
}

fn validate_order_params(params: &OrderParams) -> Result<()> {
    if params.tradingsymbol.is_empty() {
        return Err(KiteError::MissingInput("tradingsymbol missing".to_string()));
    }
    if params.exchange.is_empty() {
        return Err(KiteError::MissingInput("exchange missing".to_string()));
    }
    if params.quantity <= 0 {
        return Err(KiteError::MissingInput(format!(
            "invalid quantity: {}",
            params.quantity
        )));
    }
    Ok(())
}

fn order_form(params: &OrderParams) -> Vec<(String, String)> {
    let mut form = vec![
        ("tradingsymbol".to_string(), params.tradingsymbol.clone()),
        ("exchange".to_string(), params.exchange.clone()),
        (
            "transaction_type".to_string(),
            params.transaction_type.as_str().to_string(),
        ),
        (
            "order_type".to_string(),
            params.order_type.as_str().to_string(),
        ),
        ("product".to_string(), params.product.as_str().to_string()),
        ("quantity".to_string(), params.quantity.to_string()),
    ];
    if let Some(price) = params.price {
        form.push(("price".to_string(), price.to_string()));
    }
    if let Some(trigger) = params.trigger_price {
        form.push(("trigger_price".to_string(), trigger.to_string()));
    }
    if let Some(validity) = params.validity {
        form.push(("validity".to_string(), validity.as_str().to_string()));
    }
    if let Some(disclosed) = params.disclosed_quantity {
        form.push(("disclosed_quantity".to_string(), disclosed.to_string()));
    }
    if let Some(tag) = &params.tag {
        form.push(("tag".to_string(), tag.clone()));
    }
    form
}
