use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AdminLoginRequest, AdminLoginResponse, GoogleLoginRequest, GuestSessionResponse,
            LoginResponse,
        },
        cart::{AddToCartRequest, CartList},
        catalog::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, LowStockList, ProductList,
            StockUpdateRequest, UpdateCategoryRequest, UpdateProductRequest,
        },
        orders::{
            AdminPlaceOrderRequest, OrderList, OrderWithItems, PlaceOrderRequest,
            UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
        },
        payments::{
            TapInitRequest, TapInitResponse, TapStatusRequest, TapStatusResponse,
            TelrPlaceRequest, TelrPlaceResponse, WebhookAck,
        },
        users::{AdminList, UpdateProfileRequest, UserList, UserProfile},
    },
    middleware::auth::Role,
    models::{
        Address, Admin, CartItem, Category, CategoryWithProducts, Order, OrderItem, OrderStatus,
        PaymentStatus, Product, ProductWithCategories, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, categories, guest_cart, health, orders, params, payments, products,
        user,
    },
    services::merge_service::MergeOutcome,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::guest_session,
        auth::google_login,
        auth::admin_login,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        guest_cart::guest_cart_list,
        guest_cart::guest_add_to_cart,
        guest_cart::guest_remove_from_cart,
        guest_cart::guest_clear_cart,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        user::get_profile,
        user::update_profile,
        orders::list_order,
        orders::place_order,
        orders::get_order,
        orders::order_feed,
        admin::list_all_orders,
        admin::list_user_orders,
        admin::place_order_for_user,
        admin::get_order_admin,
        admin::get_order_by_ref,
        admin::update_order_status,
        admin::update_payment_status,
        admin::delete_order,
        admin::list_low_stock,
        admin::set_stock,
        admin::user_cart,
        admin::list_users,
        admin::list_admins,
        payments::tap_init,
        payments::tap_status,
        payments::tap_webhook,
        payments::telr_place,
        payments::telr_webhook
    ),
    components(
        schemas(
            User,
            Address,
            Admin,
            Role,
            Product,
            Category,
            ProductWithCategories,
            CategoryWithProducts,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            MergeOutcome,
            GuestSessionResponse,
            GoogleLoginRequest,
            LoginResponse,
            AdminLoginRequest,
            AdminLoginResponse,
            AddToCartRequest,
            CartList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            StockUpdateRequest,
            LowStockList,
            PlaceOrderRequest,
            AdminPlaceOrderRequest,
            UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
            OrderList,
            OrderWithItems,
            TapInitRequest,
            TapInitResponse,
            TapStatusRequest,
            TapStatusResponse,
            TelrPlaceRequest,
            TelrPlaceResponse,
            WebhookAck,
            UpdateProfileRequest,
            UserProfile,
            UserList,
            AdminList,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<UserProfile>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Guest, shopper and admin sessions"),
        (name = "Products", description = "Product endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "User", description = "Shopper profile"),
        (name = "Cart", description = "Shopper cart endpoints"),
        (name = "Guest Cart", description = "Guest cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Payments", description = "Tap and Telr payment endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
    //.custom_html(SCALAR_HTML)
}
