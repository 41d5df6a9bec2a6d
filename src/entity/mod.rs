pub mod admins;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod guest_cart_items;
pub mod guest_carts;
pub mod guest_users;
pub mod order_items;
pub mod orders;
pub mod product_categories;
pub mod products;
pub mod users;

pub use admins::Entity as Admins;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use guest_cart_items::Entity as GuestCartItems;
pub use guest_carts::Entity as GuestCarts;
pub use guest_users::Entity as GuestUsers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_categories::Entity as ProductCategories;
pub use products::Entity as Products;
pub use users::Entity as Users;
