// storefront/src/store/mod.rs

//! Persistence seams. Each service talks to one repository trait; the
//! Postgres and in-memory stores implement all of them.

pub mod memory;
pub mod postgres;
pub mod seed;

use crate::errors::{AppError, Result};
use crate::models::{
  Address, AddressInput, Brand, Cart, CartItem, CartOwner, Category, CategoryInput, NewNotificationLog, NewOrder,
  NewPaymentIntent, NewTemplate, NewUser, NotificationLog, NotificationStatus, NotificationTemplate, Order,
  OrderStatus, PaymentIntent, PaymentLog, PaymentStatus, Product, ProductFilter, ProductInput, ProductPatch, User,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const USER_EXISTS: &str = "User already exists";
pub const SLUG_IN_USE: &str = "Slug already in use";

pub fn quantity_limit_exceeded() -> AppError {
  AppError::validation(format!("Quantity must be at most {}", CartItem::MAX_QUANTITY))
}

#[async_trait]
pub trait UserRepository: Send + Sync {
  async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
  /// Fails with a validation error when the email is taken.
  async fn create(&self, user: NewUser) -> Result<User>;
  async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>>;
  async fn find_address(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<Address>>;
  /// A default address clears the flag on the user's other addresses.
  async fn create_address(&self, user_id: Uuid, input: AddressInput) -> Result<Address>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
  /// Active products, newest first.
  async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;
  async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>>;
  async fn create_product(&self, input: ProductInput, currency: &str) -> Result<Product>;
  async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>>;
  /// Soft delete. Returns false when the product does not exist.
  async fn deactivate_product(&self, id: Uuid) -> Result<bool>;
  async fn list_categories(&self) -> Result<Vec<Category>>;
  async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;
  async fn create_category(&self, input: CategoryInput) -> Result<Category>;
  async fn update_category(&self, id: Uuid, input: CategoryInput) -> Result<Option<Category>>;
  /// Soft delete, same contract as `deactivate_product`.
  async fn deactivate_category(&self, id: Uuid) -> Result<bool>;
  async fn list_brands(&self) -> Result<Vec<Brand>>;
  async fn create_brand(&self, name: &str, slug: &str) -> Result<Brand>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Cart>>;
  /// Most recently updated cart of the owner.
  async fn find_by_owner(&self, owner: &CartOwner) -> Result<Option<Cart>>;
  async fn create(&self, owner: &CartOwner, currency: &str) -> Result<Cart>;
  /// Adds `quantity` to the matching line (or inserts it) and recomputes the
  /// cart total as one atomic operation.
  async fn upsert_item(
    &self,
    cart_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
    unit_price: Decimal,
  ) -> Result<Cart>;
  /// `None` when the item is not part of the cart.
  async fn set_item_quantity(&self, cart_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<Cart>>;
  async fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<Option<Cart>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Inserts the order, its items and the first history entry together.
  async fn create(&self, order: NewOrder) -> Result<Order>;
  /// Order with items and history.
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>>;
  /// Newest first. `None` lists every order.
  async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<Order>>;
  /// Moves the order from `expected` to `next` and appends a history entry.
  /// Returns false if the stored status was no longer `expected`.
  async fn compare_and_set_status(&self, id: Uuid, expected: OrderStatus, next: OrderStatus, note: &str) -> Result<bool>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
  async fn create_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentIntent>>;
  async fn find_by_provider_intent_id(&self, provider_intent_id: &str) -> Result<Option<PaymentIntent>>;
  async fn compare_and_set_status(&self, id: Uuid, expected: PaymentStatus, next: PaymentStatus) -> Result<bool>;
  async fn append_log(&self, intent_id: Uuid, event: &str, payload: serde_json::Value) -> Result<PaymentLog>;
  async fn list_logs(&self, intent_id: Uuid) -> Result<Vec<PaymentLog>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
  async fn find_template_by_name(&self, name: &str) -> Result<Option<NotificationTemplate>>;
  /// Inserts the template unless one with the same name exists.
  async fn ensure_template(&self, template: NewTemplate) -> Result<NotificationTemplate>;
  async fn create_log(&self, log: NewNotificationLog) -> Result<NotificationLog>;
  async fn update_log_status(
    &self,
    id: Uuid,
    status: NotificationStatus,
    error: Option<String>,
    provider_message_id: Option<String>,
  ) -> Result<()>;
  async fn list_logs_for(&self, recipient: &str) -> Result<Vec<NotificationLog>>;
}

/// One handle per service, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
  pub users: Arc<dyn UserRepository>,
  pub catalog: Arc<dyn CatalogRepository>,
  pub carts: Arc<dyn CartRepository>,
  pub orders: Arc<dyn OrderRepository>,
  pub payments: Arc<dyn PaymentRepository>,
  pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
  fn from_store<S>(store: Arc<S>) -> Self
  where
    S: UserRepository
      + CatalogRepository
      + CartRepository
      + OrderRepository
      + PaymentRepository
      + NotificationRepository
      + 'static,
  {
    Self {
      users: store.clone(),
      catalog: store.clone(),
      carts: store.clone(),
      orders: store.clone(),
      payments: store.clone(),
      notifications: store,
    }
  }

  pub fn memory() -> Self {
    Self::from_store(Arc::new(MemoryStore::new()))
  }

  pub fn postgres(pool: sqlx::PgPool) -> Self {
    Self::from_store(Arc::new(PgStore::new(pool)))
  }
}
