pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod merge_service;
pub mod order_service;
pub mod product_service;
pub mod tap_service;
pub mod telr_service;
pub mod user_service;
