// storefront/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers receive these wrapped in
//! `shopflow::FlowContext`.

use crate::models::{
  AddressSnapshot, Cart, CartOwner, NotificationLog, NotificationTemplate, Order, PaymentIntent, PaymentStatus,
  Product, User,
};
use crate::services::notification_service::SendEmailRequest;
use crate::services::order_service::DraftRequest;
use crate::services::payment_service::IntentResponse;
use crate::services::token_service::TokenPair;
use crate::state::AppState;
use actix_web::web::Bytes;
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone)]
pub struct RegisterCtx {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub password_hash: Option<String>,
  pub user: Option<User>,
}

#[derive(Clone)]
pub struct LoginCtx {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub user: Option<User>,
  pub tokens: Option<TokenPair>,
}

#[derive(Clone)]
pub struct AddToCartCtx {
  pub app_state: AppState,
  pub owner: CartOwner,
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub quantity: i32,
  pub product: Option<Product>,
  pub cart_id: Option<Uuid>,
  pub cart: Option<Cart>,
}

#[derive(Clone)]
pub struct CheckoutCtx {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub request: DraftRequest,
  pub cart: Option<Cart>,
  pub shipping: Option<AddressSnapshot>,
  pub billing: Option<AddressSnapshot>,
  pub order: Option<Order>,
  pub payment: Option<IntentResponse>,
  pub confirmation_sent: bool,
}

impl CheckoutCtx {
  pub fn new(app_state: AppState, user_id: Uuid, request: DraftRequest) -> Self {
    Self {
      app_state,
      user_id,
      request,
      cart: None,
      shipping: None,
      billing: None,
      order: None,
      payment: None,
      confirmation_sent: false,
    }
  }
}

#[derive(Clone)]
pub struct PaymentWebhookCtx {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub timestamp: Option<String>,
  pub signature: Option<String>,
  pub payload: Value,
  pub intent_id: String,
  pub status: PaymentStatus,
  pub intent: Option<PaymentIntent>,
  pub status_changed: bool,
  pub order_marked_paid: Option<Order>,
}

#[derive(Clone)]
pub struct SendEmailCtx {
  pub app_state: AppState,
  pub request: SendEmailRequest,
  pub template: Option<NotificationTemplate>,
  pub subject: String,
  pub body: String,
  pub log: Option<NotificationLog>,
}

impl SendEmailCtx {
  pub fn new(app_state: AppState, request: SendEmailRequest) -> Self {
    Self {
      app_state,
      request,
      template: None,
      subject: String::new(),
      body: String::new(),
      log: None,
    }
  }
}
