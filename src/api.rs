//! HTTP surface.

use std::sync::Arc;

use axum::{extract::{rejection::JsonRejection, State}, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{CustomerDetails, Order, OrderError, PaymentMethod};
use crate::domain::events::{DomainEvent, PricingEvent};
use crate::domain::value_objects::Money;
use crate::messaging::EventPublisher;
use crate::pricing::{LineItem, OrderTotalCalculator, PricingEngine, PricingError, ProcessEngine, Quote};
use crate::StorefrontError;

pub struct AppState<E = ProcessEngine> {
    pub calculator: Arc<OrderTotalCalculator<E>>,
    pub events: EventPublisher,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self { Self { calculator: Arc::clone(&self.calculator), events: self.events.clone() } }
}

impl<E> AppState<E> {
    pub fn new(calculator: OrderTotalCalculator<E>, events: EventPublisher) -> Self {
        Self { calculator: Arc::new(calculator), events }
    }
}

pub fn router<E: PricingEngine + 'static>(state: AppState<E>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-pricing"})) }))
        .route("/api/calculate-discount", post(calculate_discount::<E>))
        .route("/api/v1/pricing/quote", post(quote::<E>))
        .route("/api/v1/checkout", post(checkout::<E>))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() { return Err(ValidationError::new("negative_price")); }
    if *price > LineItem::MAX_UNIT_PRICE { return Err(ValidationError::new("price_too_large")); }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct PriceItemRequest {
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(range(min = 1, max = 1000000))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PricingRequest {
    #[validate]
    pub items: Vec<PriceItemRequest>,
}

impl PricingRequest {
    fn line_items(&self) -> crate::Result<Vec<LineItem>> {
        self.validate()?;
        Ok(self.items.iter().map(|i| LineItem::new(i.price, i.quantity)).collect::<Result<Vec<_>, PricingError>>()?)
    }
}

#[derive(Debug, Serialize)] pub struct TotalResponse { pub total: Money }

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemRequest {
    pub product_id: u64,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(range(min = 1, max = 1000000))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 2))]
    pub customer_name: String,
    #[validate(length(min = 10))]
    pub contact: String,
    #[validate(length(min = 10))]
    pub address: String,
    pub payment_method: PaymentMethod,
    #[validate]
    pub items: Vec<CheckoutItemRequest>,
}

fn reject(err: StorefrontError) -> (StatusCode, String) { (StatusCode::BAD_REQUEST, err.to_string()) }

/// Malformed JSON and bodies that do not fit the request types are client errors.
fn bad_body(rejection: JsonRejection) -> (StatusCode, String) {
    let status = match &rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
        other => other.status(),
    };
    (status, rejection.body_text())
}

/// Quotes through the calculator and reports degraded pricing.
async fn price<E: PricingEngine>(s: &AppState<E>, items: &[LineItem]) -> Quote {
    let quote = s.calculator.quote(items).await;
    if let Some(reason) = &quote.degraded {
        let event = PricingEvent::Degraded { reason: reason.clone(), fallback_total: quote.total(), at: Utc::now() };
        s.events.publish(&DomainEvent::Pricing(event)).await;
    }
    quote
}

async fn calculate_discount<E: PricingEngine>(State(s): State<AppState<E>>, body: Result<Json<PricingRequest>, JsonRejection>) -> Result<Json<TotalResponse>, (StatusCode, String)> {
    let Json(r) = body.map_err(bad_body)?;
    let items = r.line_items().map_err(reject)?;
    let quote = price(&s, &items).await;
    Ok(Json(TotalResponse { total: quote.total() }))
}

async fn quote<E: PricingEngine>(State(s): State<AppState<E>>, body: Result<Json<PricingRequest>, JsonRejection>) -> Result<Json<Quote>, (StatusCode, String)> {
    let Json(r) = body.map_err(bad_body)?;
    let items = r.line_items().map_err(reject)?;
    Ok(Json(price(&s, &items).await))
}

async fn checkout<E: PricingEngine>(State(s): State<AppState<E>>, body: Result<Json<CheckoutRequest>, JsonRejection>) -> Result<(StatusCode, Json<Order>), (StatusCode, String)> {
    let Json(r) = body.map_err(bad_body)?;
    r.validate().map_err(|e| reject(e.into()))?;
    if r.items.is_empty() { return Err(reject(OrderError::NoItems.into())); }
    let lines = r.items.iter()
        .map(|i| LineItem::new(i.price, i.quantity).map(|line| (i.product_id, line)))
        .collect::<Result<Vec<_>, PricingError>>().map_err(|e| reject(e.into()))?;
    let items: Vec<LineItem> = lines.iter().map(|(_, line)| *line).collect();
    let quote = price(&s, &items).await;

    let customer = CustomerDetails { name: r.customer_name, contact: r.contact, address: r.address };
    let mut order = Order::place(customer, r.payment_method, &lines, &quote).map_err(|e| reject(e.into()))?;
    info!(order_id = %order.id(), total = %order.total_amount(), source = ?order.pricing_source(), "order placed");
    s.events.publish_all(order.take_events()).await;
    Ok((StatusCode::CREATED, Json(order)))
}
