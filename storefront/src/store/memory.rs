// storefront/src/store/memory.rs

//! In-process store. Every table lives behind one `parking_lot::RwLock`, so
//! each repository call is atomic with respect to the others.

use super::{
  CartRepository, CatalogRepository, NotificationRepository, OrderRepository, PaymentRepository, UserRepository,
  quantity_limit_exceeded, SLUG_IN_USE, USER_EXISTS,
};
use crate::errors::{AppError, Result};
use crate::models::{
  Address, AddressInput, Brand, Cart, CartItem, CartOwner, Category, CategoryInput, NewNotificationLog, NewOrder,
  NewPaymentIntent, NewTemplate, NewUser, NotificationLog, NotificationStatus, NotificationTemplate, Order,
  OrderItem, OrderStatus, OrderStatusHistory, PaymentIntent, PaymentLog, PaymentStatus, Product, ProductFilter,
  ProductInput, ProductPatch, User,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  users: Vec<User>,
  addresses: Vec<Address>,
  brands: Vec<Brand>,
  categories: Vec<Category>,
  products: Vec<Product>,
  carts: Vec<Cart>,
  cart_items: Vec<CartItem>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  order_history: Vec<OrderStatusHistory>,
  payment_intents: Vec<PaymentIntent>,
  payment_logs: Vec<PaymentLog>,
  templates: Vec<NotificationTemplate>,
  notification_logs: Vec<NotificationLog>,
}

impl Tables {
  fn cart_with_items(&self, cart_id: Uuid) -> Option<Cart> {
    let mut cart = self.carts.iter().find(|c| c.id == cart_id)?.clone();
    cart.items = self.cart_items.iter().filter(|i| i.cart_id == cart_id).cloned().collect();
    cart.items.sort_by_key(|i| i.created_at);
    Some(cart)
  }

  fn recompute_cart_total(&mut self, cart_id: Uuid) {
    let total: Decimal = self
      .cart_items
      .iter()
      .filter(|i| i.cart_id == cart_id)
      .map(|i| i.total_price)
      .sum();
    if let Some(cart) = self.carts.iter_mut().find(|c| c.id == cart_id) {
      cart.total_amount = total;
      cart.updated_at = Utc::now();
    }
  }

  fn order_with_details(&self, order: &Order) -> Order {
    let mut order = order.clone();
    order.items = self.order_items.iter().filter(|i| i.order_id == order.id).cloned().collect();
    order.status_history = self.order_history.iter().filter(|h| h.order_id == order.id).cloned().collect();
    order
  }

  fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
    self.products.iter().any(|p| p.slug == slug && Some(p.id) != except)
  }

  fn category_slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
    self.categories.iter().any(|c| c.slug == slug && Some(c.id) != except)
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl UserRepository for MemoryStore {
  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_lowercase();
    Ok(self.tables.read().users.iter().find(|u| u.email == email).cloned())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.read().users.iter().find(|u| u.id == id).cloned())
  }

  async fn create(&self, user: NewUser) -> Result<User> {
    let mut tables = self.tables.write();
    let email = user.email.to_lowercase();
    if tables.users.iter().any(|u| u.email == email) {
      return Err(AppError::validation(USER_EXISTS));
    }
    let now = Utc::now();
    let created = User {
      id: Uuid::new_v4(),
      email,
      password_hash: user.password_hash,
      first_name: user.first_name,
      last_name: user.last_name,
      role: user.role,
      created_at: now,
      updated_at: now,
    };
    tables.users.push(created.clone());
    Ok(created)
  }

  async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>> {
    let tables = self.tables.read();
    let mut addresses: Vec<Address> = tables.addresses.iter().filter(|a| a.user_id == user_id).cloned().collect();
    addresses.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(b.created_at.cmp(&a.created_at)));
    Ok(addresses)
  }

  async fn find_address(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<Address>> {
    Ok(
      self
        .tables
        .read()
        .addresses
        .iter()
        .find(|a| a.id == address_id && a.user_id == user_id)
        .cloned(),
    )
  }

  async fn create_address(&self, user_id: Uuid, input: AddressInput) -> Result<Address> {
    let mut tables = self.tables.write();
    if input.is_default {
      for addr in tables.addresses.iter_mut().filter(|a| a.user_id == user_id) {
        addr.is_default = false;
      }
    }
    let now = Utc::now();
    let address = Address {
      id: Uuid::new_v4(),
      user_id,
      first_name: input.first_name,
      last_name: input.last_name,
      address_line1: input.address_line1,
      address_line2: input.address_line2,
      city: input.city,
      state: input.state,
      postal_code: input.postal_code,
      country: input.country,
      phone: input.phone,
      is_default: input.is_default,
      created_at: now,
      updated_at: now,
    };
    tables.addresses.push(address.clone());
    Ok(address)
  }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
  async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
    let tables = self.tables.read();
    let mut products: Vec<Product> = tables
      .products
      .iter()
      .filter(|p| p.is_active)
      .filter(|p| filter.category_id.map_or(true, |c| p.category_id == Some(c)))
      .cloned()
      .collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(
      products
        .into_iter()
        .skip(filter.offset as usize)
        .take(filter.limit as usize)
        .collect(),
    )
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.read().products.iter().find(|p| p.id == id).cloned())
  }

  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
    Ok(
      self
        .tables
        .read()
        .products
        .iter()
        .find(|p| p.slug == slug && p.is_active)
        .cloned(),
    )
  }

  async fn create_product(&self, input: ProductInput, currency: &str) -> Result<Product> {
    let mut tables = self.tables.write();
    if tables.slug_taken(&input.slug, None) {
      return Err(AppError::validation(SLUG_IN_USE));
    }
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: input.name,
      slug: input.slug,
      description: input.description,
      price: input.price,
      currency: input.currency.unwrap_or_else(|| currency.to_string()),
      sku: input.sku,
      image: input.image,
      images: input.images,
      category_id: input.category_id,
      brand_id: input.brand_id,
      is_active: true,
      created_at: now,
      updated_at: now,
    };
    tables.products.push(product.clone());
    Ok(product)
  }

  async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
    let mut tables = self.tables.write();
    if let Some(slug) = &patch.slug {
      if tables.slug_taken(slug, Some(id)) {
        return Err(AppError::validation(SLUG_IN_USE));
      }
    }
    let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
      return Ok(None);
    };
    if let Some(v) = patch.name {
      product.name = v;
    }
    if let Some(v) = patch.slug {
      product.slug = v;
    }
    if patch.description.is_some() {
      product.description = patch.description;
    }
    if let Some(v) = patch.price {
      product.price = v;
    }
    if let Some(v) = patch.currency {
      product.currency = v;
    }
    if patch.sku.is_some() {
      product.sku = patch.sku;
    }
    if patch.image.is_some() {
      product.image = patch.image;
    }
    if let Some(v) = patch.images {
      product.images = v;
    }
    if patch.category_id.is_some() {
      product.category_id = patch.category_id;
    }
    if patch.brand_id.is_some() {
      product.brand_id = patch.brand_id;
    }
    if let Some(v) = patch.is_active {
      product.is_active = v;
    }
    product.updated_at = Utc::now();
    Ok(Some(product.clone()))
  }

  async fn deactivate_product(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    match tables.products.iter_mut().find(|p| p.id == id) {
      Some(product) => {
        product.is_active = false;
        product.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let mut categories = self.tables.read().categories.clone();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(categories)
  }

  async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
    Ok(self.tables.read().categories.iter().find(|c| c.id == id).cloned())
  }

  async fn create_category(&self, input: CategoryInput) -> Result<Category> {
    let (Some(name), Some(slug)) = (input.name, input.slug) else {
      return Err(AppError::validation("Name and slug are required"));
    };
    let mut tables = self.tables.write();
    if tables.category_slug_taken(&slug, None) {
      return Err(AppError::validation(SLUG_IN_USE));
    }
    let now = Utc::now();
    let category = Category {
      id: Uuid::new_v4(),
      name,
      slug,
      description: input.description,
      parent_id: input.parent_id,
      is_active: input.is_active.unwrap_or(true),
      created_at: now,
      updated_at: now,
    };
    tables.categories.push(category.clone());
    Ok(category)
  }

  async fn update_category(&self, id: Uuid, input: CategoryInput) -> Result<Option<Category>> {
    let mut tables = self.tables.write();
    if let Some(slug) = &input.slug {
      if tables.category_slug_taken(slug, Some(id)) {
        return Err(AppError::validation(SLUG_IN_USE));
      }
    }
    let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
      return Ok(None);
    };
    if let Some(v) = input.name {
      category.name = v;
    }
    if let Some(v) = input.slug {
      category.slug = v;
    }
    if input.description.is_some() {
      category.description = input.description;
    }
    if input.parent_id.is_some() {
      category.parent_id = input.parent_id;
    }
    if let Some(v) = input.is_active {
      category.is_active = v;
    }
    category.updated_at = Utc::now();
    Ok(Some(category.clone()))
  }

  async fn deactivate_category(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    match tables.categories.iter_mut().find(|c| c.id == id) {
      Some(category) => {
        category.is_active = false;
        category.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn list_brands(&self) -> Result<Vec<Brand>> {
    let mut brands = self.tables.read().brands.clone();
    brands.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(brands)
  }

  async fn create_brand(&self, name: &str, slug: &str) -> Result<Brand> {
    let mut tables = self.tables.write();
    if let Some(existing) = tables.brands.iter().find(|b| b.slug == slug) {
      return Ok(existing.clone());
    }
    let now = Utc::now();
    let brand = Brand {
      id: Uuid::new_v4(),
      name: name.to_string(),
      slug: slug.to_string(),
      created_at: now,
      updated_at: now,
    };
    tables.brands.push(brand.clone());
    Ok(brand)
  }
}

#[async_trait]
impl CartRepository for MemoryStore {
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Cart>> {
    Ok(self.tables.read().cart_with_items(id))
  }

  async fn find_by_owner(&self, owner: &CartOwner) -> Result<Option<Cart>> {
    let tables = self.tables.read();
    let latest = tables
      .carts
      .iter()
      .filter(|c| c.owned_by(owner))
      .max_by_key(|c| c.updated_at)
      .map(|c| c.id);
    Ok(latest.and_then(|id| tables.cart_with_items(id)))
  }

  async fn create(&self, owner: &CartOwner, currency: &str) -> Result<Cart> {
    let now = Utc::now();
    let cart = Cart {
      id: Uuid::new_v4(),
      user_id: owner.user_id(),
      session_id: owner.session_id().map(str::to_string),
      currency: currency.to_string(),
      total_amount: Decimal::ZERO,
      items: Vec::new(),
      created_at: now,
      updated_at: now,
    };
    self.tables.write().carts.push(cart.clone());
    Ok(cart)
  }

  async fn upsert_item(
    &self,
    cart_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
    unit_price: Decimal,
  ) -> Result<Cart> {
    let mut tables = self.tables.write();
    if !tables.carts.iter().any(|c| c.id == cart_id) {
      return Err(AppError::not_found("Cart not found"));
    }
    let now = Utc::now();
    let existing = tables
      .cart_items
      .iter_mut()
      .find(|i| i.cart_id == cart_id && i.product_id == product_id && i.variant_id == variant_id);
    match existing {
      Some(item) => {
        item.quantity = CartItem::merged_quantity(item.quantity, quantity).ok_or_else(quantity_limit_exceeded)?;
        item.unit_price = unit_price;
        item.total_price = unit_price * Decimal::from(item.quantity);
        item.updated_at = now;
      }
      None => tables.cart_items.push(CartItem {
        id: Uuid::new_v4(),
        cart_id,
        product_id,
        variant_id,
        quantity,
        unit_price,
        total_price: unit_price * Decimal::from(quantity),
        created_at: now,
        updated_at: now,
      }),
    }
    tables.recompute_cart_total(cart_id);
    tables
      .cart_with_items(cart_id)
      .ok_or_else(|| AppError::not_found("Cart not found"))
  }

  async fn set_item_quantity(&self, cart_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<Cart>> {
    let mut tables = self.tables.write();
    let Some(item) = tables
      .cart_items
      .iter_mut()
      .find(|i| i.id == item_id && i.cart_id == cart_id)
    else {
      return Ok(None);
    };
    item.quantity = quantity;
    item.total_price = item.unit_price * Decimal::from(quantity);
    item.updated_at = Utc::now();
    tables.recompute_cart_total(cart_id);
    Ok(tables.cart_with_items(cart_id))
  }

  async fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<Option<Cart>> {
    let mut tables = self.tables.write();
    let before = tables.cart_items.len();
    tables.cart_items.retain(|i| !(i.id == item_id && i.cart_id == cart_id));
    if tables.cart_items.len() == before {
      return Ok(None);
    }
    tables.recompute_cart_total(cart_id);
    Ok(tables.cart_with_items(cart_id))
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn create(&self, order: NewOrder) -> Result<Order> {
    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let subtotal = order.subtotal();
    let total_amount = order.total_amount();
    let record = Order {
      id: order_id,
      order_number: order.order_number,
      user_id: order.user_id,
      status: order.status,
      subtotal,
      shipping_cost: order.shipping_cost,
      tax_amount: order.tax_amount,
      discount_amount: order.discount_amount,
      total_amount,
      currency: order.currency,
      shipping_address: Json(order.shipping_address),
      billing_address: Json(order.billing_address),
      items: Vec::new(),
      status_history: Vec::new(),
      created_at: now,
      updated_at: now,
    };

    let mut tables = self.tables.write();
    for item in &order.items {
      tables.order_items.push(OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: item.product_id,
        variant_id: item.variant_id,
        sku: item.sku.clone(),
        name: item.name.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        total_price: item.total_price(),
      });
    }
    tables.order_history.push(OrderStatusHistory {
      id: Uuid::new_v4(),
      order_id,
      status: record.status,
      note: order.note,
      created_at: now,
    });
    tables.orders.push(record.clone());
    Ok(tables.order_with_details(&record))
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>> {
    let tables = self.tables.read();
    Ok(tables.orders.iter().find(|o| o.id == id).map(|o| tables.order_with_details(o)))
  }

  async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    let mut orders: Vec<Order> = tables
      .orders
      .iter()
      .filter(|o| user_id.map_or(true, |uid| o.user_id == uid))
      .map(|o| tables.order_with_details(o))
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn compare_and_set_status(&self, id: Uuid, expected: OrderStatus, next: OrderStatus, note: &str) -> Result<bool> {
    let mut tables = self.tables.write();
    let now = Utc::now();
    let Some(order) = tables.orders.iter_mut().find(|o| o.id == id && o.status == expected) else {
      return Ok(false);
    };
    order.status = next;
    order.updated_at = now;
    tables.order_history.push(OrderStatusHistory {
      id: Uuid::new_v4(),
      order_id: id,
      status: next,
      note: note.to_string(),
      created_at: now,
    });
    Ok(true)
  }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
  async fn create_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent> {
    let mut tables = self.tables.write();
    if tables
      .payment_intents
      .iter()
      .any(|p| p.provider_intent_id == intent.provider_intent_id)
    {
      return Err(AppError::Conflict("Payment intent already exists".into()));
    }
    let now = Utc::now();
    let record = PaymentIntent {
      id: Uuid::new_v4(),
      order_id: intent.order_id,
      provider: intent.provider,
      provider_intent_id: intent.provider_intent_id,
      amount: intent.amount,
      currency: intent.currency,
      status: PaymentStatus::Pending,
      client_secret: intent.client_secret,
      created_at: now,
      updated_at: now,
    };
    tables.payment_intents.push(record.clone());
    Ok(record)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentIntent>> {
    Ok(self.tables.read().payment_intents.iter().find(|p| p.id == id).cloned())
  }

  async fn find_by_provider_intent_id(&self, provider_intent_id: &str) -> Result<Option<PaymentIntent>> {
    Ok(
      self
        .tables
        .read()
        .payment_intents
        .iter()
        .find(|p| p.provider_intent_id == provider_intent_id)
        .cloned(),
    )
  }

  async fn compare_and_set_status(&self, id: Uuid, expected: PaymentStatus, next: PaymentStatus) -> Result<bool> {
    let mut tables = self.tables.write();
    match tables.payment_intents.iter_mut().find(|p| p.id == id && p.status == expected) {
      Some(intent) => {
        intent.status = next;
        intent.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn append_log(&self, intent_id: Uuid, event: &str, payload: serde_json::Value) -> Result<PaymentLog> {
    let log = PaymentLog {
      id: Uuid::new_v4(),
      payment_intent_id: intent_id,
      event: event.to_string(),
      payload,
      created_at: Utc::now(),
    };
    self.tables.write().payment_logs.push(log.clone());
    Ok(log)
  }

  async fn list_logs(&self, intent_id: Uuid) -> Result<Vec<PaymentLog>> {
    Ok(
      self
        .tables
        .read()
        .payment_logs
        .iter()
        .filter(|l| l.payment_intent_id == intent_id)
        .cloned()
        .collect(),
    )
  }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
  async fn find_template_by_name(&self, name: &str) -> Result<Option<NotificationTemplate>> {
    Ok(self.tables.read().templates.iter().find(|t| t.name == name).cloned())
  }

  async fn ensure_template(&self, template: NewTemplate) -> Result<NotificationTemplate> {
    let mut tables = self.tables.write();
    if let Some(existing) = tables.templates.iter().find(|t| t.name == template.name) {
      return Ok(existing.clone());
    }
    let now = Utc::now();
    let record = NotificationTemplate {
      id: Uuid::new_v4(),
      name: template.name,
      kind: "email".into(),
      subject: Some(template.subject),
      body: template.body,
      created_at: now,
      updated_at: now,
    };
    tables.templates.push(record.clone());
    Ok(record)
  }

  async fn create_log(&self, log: NewNotificationLog) -> Result<NotificationLog> {
    let record = NotificationLog {
      id: Uuid::new_v4(),
      template_id: log.template_id,
      recipient: log.recipient,
      subject: log.subject,
      body: log.body,
      status: log.status,
      error: log.error,
      provider_message_id: None,
      metadata: log.metadata,
      sent_at: None,
      created_at: Utc::now(),
    };
    self.tables.write().notification_logs.push(record.clone());
    Ok(record)
  }

  async fn update_log_status(
    &self,
    id: Uuid,
    status: NotificationStatus,
    error: Option<String>,
    provider_message_id: Option<String>,
  ) -> Result<()> {
    let mut tables = self.tables.write();
    let log = tables
      .notification_logs
      .iter_mut()
      .find(|l| l.id == id)
      .ok_or_else(|| AppError::not_found("Notification log not found"))?;
    log.status = status;
    log.error = error;
    if provider_message_id.is_some() {
      log.provider_message_id = provider_message_id;
    }
    if status == NotificationStatus::Sent {
      log.sent_at = Some(Utc::now());
    }
    Ok(())
  }

  async fn list_logs_for(&self, recipient: &str) -> Result<Vec<NotificationLog>> {
    Ok(
      self
        .tables
        .read()
        .notification_logs
        .iter()
        .filter(|l| l.recipient == recipient)
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  async fn cart_with_owner(store: &MemoryStore) -> Cart {
    CartRepository::create(store, &CartOwner::Session("sess-1".into()), "TRY")
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn upsert_merges_matching_lines_and_keeps_total_in_sync() {
    let store = MemoryStore::new();
    let cart = cart_with_owner(&store).await;
    let product = Uuid::new_v4();

    store.upsert_item(cart.id, product, None, 2, dec!(10.50)).await.unwrap();
    let cart = store.upsert_item(cart.id, product, None, 3, dec!(10.50)).await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.items[0].total_price, dec!(52.50));
    assert_eq!(cart.total_amount, cart.items_total());
  }

  #[tokio::test]
  async fn merging_past_the_line_limit_is_rejected_and_leaves_the_line() {
    let store = MemoryStore::new();
    let cart = cart_with_owner(&store).await;
    let product = Uuid::new_v4();

    store
      .upsert_item(cart.id, product, None, CartItem::MAX_QUANTITY, dec!(1))
      .await
      .unwrap();
    for extra in [1, i32::MAX] {
      let err = store.upsert_item(cart.id, product, None, extra, dec!(1)).await.unwrap_err();
      assert!(matches!(err, AppError::Validation(m) if m == "Quantity must be at most 10000"));
    }

    let cart = store.find_by_owner(&CartOwner::Session("sess-1".into())).await.unwrap().unwrap();
    assert_eq!(cart.items[0].quantity, CartItem::MAX_QUANTITY);
    assert_eq!(cart.total_amount, dec!(10000));
  }

  #[tokio::test]
  async fn variants_are_separate_lines() {
    let store = MemoryStore::new();
    let cart = cart_with_owner(&store).await;
    let product = Uuid::new_v4();

    store.upsert_item(cart.id, product, None, 1, dec!(5)).await.unwrap();
    let cart = store
      .upsert_item(cart.id, product, Some(Uuid::new_v4()), 1, dec!(7))
      .await
      .unwrap();

    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_amount, dec!(12));
  }

  #[tokio::test]
  async fn item_updates_are_scoped_to_the_cart() {
    let store = MemoryStore::new();
    let cart = cart_with_owner(&store).await;
    let other = CartRepository::create(&store, &CartOwner::Session("sess-2".into()), "TRY")
      .await
      .unwrap();
    let cart = store.upsert_item(cart.id, Uuid::new_v4(), None, 1, dec!(3)).await.unwrap();
    let item_id = cart.items[0].id;

    assert!(store.set_item_quantity(other.id, item_id, 4).await.unwrap().is_none());
    assert!(store.remove_item(other.id, item_id).await.unwrap().is_none());

    let cart = store.set_item_quantity(cart.id, item_id, 4).await.unwrap().unwrap();
    assert_eq!(cart.total_amount, dec!(12));
    let cart = store.remove_item(cart.id, item_id).await.unwrap().unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_amount, Decimal::ZERO);
  }

  #[tokio::test]
  async fn concurrent_adds_do_not_lose_quantity() {
    let store = std::sync::Arc::new(MemoryStore::new());
    let cart_id = cart_with_owner(&store).await.id;
    let product = Uuid::new_v4();

    let tasks: Vec<_> = (0..16)
      .map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.upsert_item(cart_id, product, None, 1, dec!(2)).await })
      })
      .collect();
    for task in tasks {
      task.await.unwrap().unwrap();
    }

    let cart = CartRepository::find_by_id(store.as_ref(), cart_id).await.unwrap().unwrap();
    assert_eq!(cart.items[0].quantity, 16);
    assert_eq!(cart.total_amount, dec!(32));
  }

  #[tokio::test]
  async fn order_status_compare_and_set() {
    let store = MemoryStore::new();
    let order = OrderRepository::create(
      &store,
      NewOrder {
        order_number: "ORD-1".into(),
        user_id: Uuid::new_v4(),
        status: OrderStatus::PendingPayment,
        currency: "TRY".into(),
        shipping_cost: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        shipping_address: Default::default(),
        billing_address: Default::default(),
        items: vec![],
        note: "Order created".into(),
      },
    )
    .await
    .unwrap();

    let repo: &dyn OrderRepository = &store;
    assert!(repo
      .compare_and_set_status(order.id, OrderStatus::PendingPayment, OrderStatus::Paid, "paid")
      .await
      .unwrap());
    assert!(!repo
      .compare_and_set_status(order.id, OrderStatus::PendingPayment, OrderStatus::Cancelled, "late")
      .await
      .unwrap());

    let order = OrderRepository::find_by_id(&store, order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.status_history.len(), 2);
  }

  #[tokio::test]
  async fn duplicate_email_is_rejected_case_insensitively() {
    let store = MemoryStore::new();
    let new_user = |email: &str| NewUser {
      email: email.into(),
      password_hash: "hash".into(),
      first_name: None,
      last_name: None,
      role: crate::models::UserRole::User,
    };
    UserRepository::create(&store, new_user("Jane@Shop.test")).await.unwrap();
    let err = UserRepository::create(&store, new_user("jane@shop.test")).await.unwrap_err();
    assert_eq!(err.to_string(), format!("Validation Error: {}", USER_EXISTS));
  }
}
