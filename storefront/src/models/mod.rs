// storefront/src/models/mod.rs

//! Records stored by the services, plus the request inputs that create them.

pub mod brand;
pub mod cart;
pub mod category;
pub mod notification;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use brand::Brand;
pub use cart::{Cart, CartItem, CartOwner};
pub use category::{Category, CategoryInput};
pub use notification::{NewNotificationLog, NewTemplate, NotificationLog, NotificationStatus, NotificationTemplate};
pub use order::{AddressSnapshot, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderStatusHistory};
pub use payment::{NewPaymentIntent, PaymentIntent, PaymentLog, PaymentStatus};
pub use product::{Product, ProductFilter, ProductInput, ProductPatch};
pub use user::{Address, AddressInput, NewUser, User, UserRole};
