// storefront/src/store/postgres.rs

//! `sqlx` implementation of the repositories. Queries are checked at runtime,
//! so the crate builds without a live database.

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
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  async fn load_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    let Some(mut cart) = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1")
      .bind(cart_id)
      .fetch_optional(&self.pool)
      .await?
    else {
      return Ok(None);
    };
    cart.items = sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at")
      .bind(cart_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(Some(cart))
  }

  async fn attach_order_details(&self, orders: &mut [Order]) -> Result<()> {
    if orders.is_empty() {
      return Ok(());
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1)")
      .bind(&ids)
      .fetch_all(&self.pool)
      .await?;
    let history = sqlx::query_as::<_, OrderStatusHistory>(
      "SELECT * FROM order_status_history WHERE order_id = ANY($1) ORDER BY created_at",
    )
    .bind(&ids)
    .fetch_all(&self.pool)
    .await?;
    for order in orders.iter_mut() {
      order.items = items.iter().filter(|i| i.order_id == order.id).cloned().collect();
      order.status_history = history.iter().filter(|h| h.order_id == order.id).cloned().collect();
    }
    Ok(())
  }
}

fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => AppError::validation(message),
    _ => AppError::Sqlx(err),
  }
}

/// Locks the cart row so concurrent mutations of one cart serialize.
async fn lock_cart(tx: &mut Transaction<'_, Postgres>, cart_id: Uuid) -> Result<bool> {
  let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
    .bind(cart_id)
    .fetch_optional(&mut **tx)
    .await?;
  Ok(found.is_some())
}

async fn recompute_cart_total(tx: &mut Transaction<'_, Postgres>, cart_id: Uuid) -> Result<()> {
  sqlx::query(
    "UPDATE carts SET total_amount = COALESCE((SELECT SUM(total_price) FROM cart_items WHERE cart_id = $1), 0), \
     updated_at = now() WHERE id = $1",
  )
  .bind(cart_id)
  .execute(&mut **tx)
  .await?;
  Ok(())
}

#[async_trait]
impl UserRepository for PgStore {
  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = lower($1)")
        .bind(email)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  #[instrument(name = "pg::users::create", skip(self, user), fields(email = %user.email), err(Display))]
  async fn create(&self, user: NewUser) -> Result<User> {
    sqlx::query_as::<_, User>(
      "INSERT INTO users (id, email, password_hash, first_name, last_name, role) \
       VALUES ($1, lower($2), $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.role)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| unique_violation(e, USER_EXISTS))
  }

  async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>> {
    Ok(
      sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
      )
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn find_address(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<Address>> {
    Ok(
      sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn create_address(&self, user_id: Uuid, input: AddressInput) -> Result<Address> {
    let mut tx = self.pool.begin().await?;
    if input.is_default {
      sqlx::query("UPDATE addresses SET is_default = FALSE, updated_at = now() WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }
    let address = sqlx::query_as::<_, Address>(
      "INSERT INTO addresses (id, user_id, first_name, last_name, address_line1, address_line2, city, state, \
       postal_code, country, phone, is_default) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.address_line1)
    .bind(&input.address_line2)
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.postal_code)
    .bind(&input.country)
    .bind(&input.phone)
    .bind(input.is_default)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(address)
  }
}

#[async_trait]
impl CatalogRepository for PgStore {
  async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_active AND ($1::uuid IS NULL OR category_id = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
      )
      .bind(filter.category_id)
      .bind(filter.limit)
      .bind(filter.offset)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(
      sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
    Ok(
      sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1 AND is_active")
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn create_product(&self, input: ProductInput, currency: &str) -> Result<Product> {
    sqlx::query_as::<_, Product>(
      "INSERT INTO products (id, name, slug, description, price, currency, sku, image, images, category_id, brand_id) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.slug)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.currency.as_deref().unwrap_or(currency))
    .bind(&input.sku)
    .bind(&input.image)
    .bind(&input.images)
    .bind(input.category_id)
    .bind(input.brand_id)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| unique_violation(e, SLUG_IN_USE))
  }

  async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>(
      "UPDATE products SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
       description = COALESCE($4, description), price = COALESCE($5, price), currency = COALESCE($6, currency), \
       sku = COALESCE($7, sku), image = COALESCE($8, image), images = COALESCE($9, images), \
       category_id = COALESCE($10, category_id), brand_id = COALESCE($11, brand_id), \
       is_active = COALESCE($12, is_active), updated_at = now() \
       WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.slug)
    .bind(&patch.description)
    .bind(patch.price)
    .bind(&patch.currency)
    .bind(&patch.sku)
    .bind(&patch.image)
    .bind(&patch.images)
    .bind(patch.category_id)
    .bind(patch.brand_id)
    .bind(patch.is_active)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| unique_violation(e, SLUG_IN_USE))
  }

  async fn deactivate_product(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = now() WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    Ok(
      sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
    Ok(
      sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn create_category(&self, input: CategoryInput) -> Result<Category> {
    let (Some(name), Some(slug)) = (&input.name, &input.slug) else {
      return Err(AppError::validation("Name and slug are required"));
    };
    sqlx::query_as::<_, Category>(
      "INSERT INTO categories (id, name, slug, description, parent_id, is_active) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(&input.description)
    .bind(input.parent_id)
    .bind(input.is_active.unwrap_or(true))
    .fetch_one(&self.pool)
    .await
    .map_err(|e| unique_violation(e, SLUG_IN_USE))
  }

  async fn update_category(&self, id: Uuid, input: CategoryInput) -> Result<Option<Category>> {
    sqlx::query_as::<_, Category>(
      "UPDATE categories SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
       description = COALESCE($4, description), parent_id = COALESCE($5, parent_id), \
       is_active = COALESCE($6, is_active), updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.slug)
    .bind(&input.description)
    .bind(input.parent_id)
    .bind(input.is_active)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| unique_violation(e, SLUG_IN_USE))
  }

  async fn deactivate_category(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE categories SET is_active = FALSE, updated_at = now() WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_brands(&self) -> Result<Vec<Brand>> {
    Ok(
      sqlx::query_as::<_, Brand>("SELECT * FROM brands ORDER BY name")
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn create_brand(&self, name: &str, slug: &str) -> Result<Brand> {
    Ok(
      sqlx::query_as::<_, Brand>(
        "INSERT INTO brands (id, name, slug) VALUES ($1, $2, $3) \
         ON CONFLICT (slug) DO UPDATE SET name = brands.name RETURNING *",
      )
      .bind(Uuid::new_v4())
      .bind(name)
      .bind(slug)
      .fetch_one(&self.pool)
      .await?,
    )
  }
}

#[async_trait]
impl CartRepository for PgStore {
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Cart>> {
    self.load_cart(id).await
  }

  async fn find_by_owner(&self, owner: &CartOwner) -> Result<Option<Cart>> {
    let cart_id = match owner {
      CartOwner::User(user_id) => {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE user_id = $1 ORDER BY updated_at DESC LIMIT 1")
          .bind(user_id)
          .fetch_optional(&self.pool)
          .await?
      }
      CartOwner::Session(session_id) => {
        sqlx::query_scalar::<_, Uuid>(
          "SELECT id FROM carts WHERE session_id = $1 AND user_id IS NULL ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
      }
    };
    match cart_id {
      Some(id) => self.load_cart(id).await,
      None => Ok(None),
    }
  }

  async fn create(&self, owner: &CartOwner, currency: &str) -> Result<Cart> {
    Ok(
      sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (id, user_id, session_id, currency) VALUES ($1, $2, $3, $4) RETURNING *",
      )
      .bind(Uuid::new_v4())
      .bind(owner.user_id())
      .bind(owner.session_id())
      .bind(currency)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  #[instrument(name = "pg::carts::upsert_item", skip(self, unit_price), err(Display))]
  async fn upsert_item(
    &self,
    cart_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
    unit_price: Decimal,
  ) -> Result<Cart> {
    let mut tx = self.pool.begin().await?;
    if !lock_cart(&mut tx, cart_id).await? {
      return Err(AppError::not_found("Cart not found"));
    }
    // The cart row lock serialises writers, so the merged quantity can be checked up front.
    let current = sqlx::query_scalar::<_, i32>(
      "SELECT quantity FROM cart_items        WHERE cart_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(variant_id)
    .fetch_optional(&mut *tx)
    .await?
    .unwrap_or(0);
    CartItem::merged_quantity(current, quantity).ok_or_else(quantity_limit_exceeded)?;
    sqlx::query(
      "INSERT INTO cart_items (id, cart_id, product_id, variant_id, quantity, unit_price, total_price) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) \
       ON CONFLICT (cart_id, product_id, variant_id) DO UPDATE SET \
       quantity = cart_items.quantity + EXCLUDED.quantity, \
       unit_price = EXCLUDED.unit_price, \
       total_price = EXCLUDED.unit_price * (cart_items.quantity + EXCLUDED.quantity), \
       updated_at = now()",
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(product_id)
    .bind(variant_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(unit_price * Decimal::from(quantity))
    .execute(&mut *tx)
    .await?;
    recompute_cart_total(&mut tx, cart_id).await?;
    tx.commit().await?;
    debug!("cart line upserted");

    self
      .load_cart(cart_id)
      .await?
      .ok_or_else(|| AppError::not_found("Cart not found"))
  }

  async fn set_item_quantity(&self, cart_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<Cart>> {
    let mut tx = self.pool.begin().await?;
    if !lock_cart(&mut tx, cart_id).await? {
      return Ok(None);
    }
    let updated = sqlx::query(
      "UPDATE cart_items SET quantity = $3, total_price = unit_price * $3, updated_at = now() \
       WHERE id = $1 AND cart_id = $2",
    )
    .bind(item_id)
    .bind(cart_id)
    .bind(quantity)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
      return Ok(None);
    }
    recompute_cart_total(&mut tx, cart_id).await?;
    tx.commit().await?;
    self.load_cart(cart_id).await
  }

  async fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<Option<Cart>> {
    let mut tx = self.pool.begin().await?;
    if !lock_cart(&mut tx, cart_id).await? {
      return Ok(None);
    }
    let deleted = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
      .bind(item_id)
      .bind(cart_id)
      .execute(&mut *tx)
      .await?;
    if deleted.rows_affected() == 0 {
      return Ok(None);
    }
    recompute_cart_total(&mut tx, cart_id).await?;
    tx.commit().await?;
    self.load_cart(cart_id).await
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "pg::orders::create", skip(self, order), fields(order_number = %order.order_number), err(Display))]
  async fn create(&self, order: NewOrder) -> Result<Order> {
    let order_id = Uuid::new_v4();
    let mut tx = self.pool.begin().await?;
    sqlx::query(
      "INSERT INTO orders (id, order_number, user_id, status, subtotal, shipping_cost, tax_amount, \
       discount_amount, total_amount, currency, shipping_address, billing_address) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(order_id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.subtotal())
    .bind(order.shipping_cost)
    .bind(order.tax_amount)
    .bind(order.discount_amount)
    .bind(order.total_amount())
    .bind(&order.currency)
    .bind(Json(&order.shipping_address))
    .bind(Json(&order.billing_address))
    .execute(&mut *tx)
    .await?;

    for item in &order.items {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, variant_id, sku, name, quantity, unit_price, total_price) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
      )
      .bind(Uuid::new_v4())
      .bind(order_id)
      .bind(item.product_id)
      .bind(item.variant_id)
      .bind(&item.sku)
      .bind(&item.name)
      .bind(item.quantity)
      .bind(item.unit_price)
      .bind(item.total_price())
      .execute(&mut *tx)
      .await?;
    }

    sqlx::query("INSERT INTO order_status_history (id, order_id, status, note) VALUES ($1, $2, $3, $4)")
      .bind(Uuid::new_v4())
      .bind(order_id)
      .bind(order.status)
      .bind(&order.note)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;

    OrderRepository::find_by_id(self, order_id)
      .await?
      .ok_or_else(|| AppError::Internal("Order vanished after insert".into()))
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>> {
    let Some(order) = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
    else {
      return Ok(None);
    };
    let mut orders = [order];
    self.attach_order_details(&mut orders).await?;
    let [order] = orders;
    Ok(Some(order))
  }

  async fn list(&self, user_id: Option<Uuid>) -> Result<Vec<Order>> {
    let mut orders = sqlx::query_as::<_, Order>(
      "SELECT * FROM orders WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    self.attach_order_details(&mut orders).await?;
    Ok(orders)
  }

  async fn compare_and_set_status(&self, id: Uuid, expected: OrderStatus, next: OrderStatus, note: &str) -> Result<bool> {
    let mut tx = self.pool.begin().await?;
    let updated = sqlx::query("UPDATE orders SET status = $3, updated_at = now() WHERE id = $1 AND status = $2")
      .bind(id)
      .bind(expected)
      .bind(next)
      .execute(&mut *tx)
      .await?;
    if updated.rows_affected() == 0 {
      return Ok(false);
    }
    sqlx::query("INSERT INTO order_status_history (id, order_id, status, note) VALUES ($1, $2, $3, $4)")
      .bind(Uuid::new_v4())
      .bind(id)
      .bind(next)
      .bind(note)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(true)
  }
}

#[async_trait]
impl PaymentRepository for PgStore {
  async fn create_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent> {
    sqlx::query_as::<_, PaymentIntent>(
      "INSERT INTO payment_intents (id, order_id, provider, provider_intent_id, amount, currency, client_secret) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(intent.order_id)
    .bind(&intent.provider)
    .bind(&intent.provider_intent_id)
    .bind(intent.amount)
    .bind(&intent.currency)
    .bind(&intent.client_secret)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| match &e {
      sqlx::Error::Database(db) if db.is_unique_violation() => {
        AppError::Conflict("Payment intent already exists".into())
      }
      _ => AppError::Sqlx(e),
    })
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentIntent>> {
    Ok(
      sqlx::query_as::<_, PaymentIntent>("SELECT * FROM payment_intents WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_by_provider_intent_id(&self, provider_intent_id: &str) -> Result<Option<PaymentIntent>> {
    Ok(
      sqlx::query_as::<_, PaymentIntent>("SELECT * FROM payment_intents WHERE provider_intent_id = $1")
        .bind(provider_intent_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn compare_and_set_status(&self, id: Uuid, expected: PaymentStatus, next: PaymentStatus) -> Result<bool> {
    let updated =
      sqlx::query("UPDATE payment_intents SET status = $3, updated_at = now() WHERE id = $1 AND status = $2")
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(&self.pool)
        .await?;
    Ok(updated.rows_affected() > 0)
  }

  async fn append_log(&self, intent_id: Uuid, event: &str, payload: serde_json::Value) -> Result<PaymentLog> {
    Ok(
      sqlx::query_as::<_, PaymentLog>(
        "INSERT INTO payment_logs (id, payment_intent_id, event, payload) VALUES ($1, $2, $3, $4) RETURNING *",
      )
      .bind(Uuid::new_v4())
      .bind(intent_id)
      .bind(event)
      .bind(payload)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn list_logs(&self, intent_id: Uuid) -> Result<Vec<PaymentLog>> {
    Ok(
      sqlx::query_as::<_, PaymentLog>("SELECT * FROM payment_logs WHERE payment_intent_id = $1 ORDER BY created_at")
        .bind(intent_id)
        .fetch_all(&self.pool)
        .await?,
    )
  }
}

#[async_trait]
impl NotificationRepository for PgStore {
  async fn find_template_by_name(&self, name: &str) -> Result<Option<NotificationTemplate>> {
    Ok(
      sqlx::query_as::<_, NotificationTemplate>("SELECT * FROM notification_templates WHERE name = $1")
        .bind(name)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn ensure_template(&self, template: NewTemplate) -> Result<NotificationTemplate> {
    Ok(
      sqlx::query_as::<_, NotificationTemplate>(
        "INSERT INTO notification_templates (id, name, kind, subject, body) VALUES ($1, $2, 'email', $3, $4) \
         ON CONFLICT (name) DO UPDATE SET name = notification_templates.name RETURNING *",
      )
      .bind(Uuid::new_v4())
      .bind(&template.name)
      .bind(&template.subject)
      .bind(&template.body)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn create_log(&self, log: NewNotificationLog) -> Result<NotificationLog> {
    Ok(
      sqlx::query_as::<_, NotificationLog>(
        "INSERT INTO notification_logs (id, template_id, recipient, subject, body, status, error, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
      )
      .bind(Uuid::new_v4())
      .bind(log.template_id)
      .bind(&log.recipient)
      .bind(&log.subject)
      .bind(&log.body)
      .bind(log.status)
      .bind(&log.error)
      .bind(&log.metadata)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn update_log_status(
    &self,
    id: Uuid,
    status: NotificationStatus,
    error: Option<String>,
    provider_message_id: Option<String>,
  ) -> Result<()> {
    sqlx::query(
      "UPDATE notification_logs SET status = $2, error = $3, \
       provider_message_id = COALESCE($4, provider_message_id), \
       sent_at = CASE WHEN $2 = 'SENT'::notification_status THEN now() ELSE sent_at END \
       WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .bind(error)
    .bind(provider_message_id)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn list_logs_for(&self, recipient: &str) -> Result<Vec<NotificationLog>> {
    Ok(
      sqlx::query_as::<_, NotificationLog>(
        "SELECT * FROM notification_logs WHERE recipient = $1 ORDER BY created_at",
      )
      .bind(recipient)
      .fetch_all(&self.pool)
      .await?,
    )
  }
}
