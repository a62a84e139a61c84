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
        address::{AddressList, CreateAddressRequest},
        cart::{AddToCartRequest, CartList},
        menu::{
            CreateDishRequest, CreateSetmealRequest, DeleteDishesRequest, DeleteSetmealsRequest,
            MenuList, MenuStatusRequest, SetmealDishLine, SetmealWithDishes, UpdateDishRequest,
            UpdateSetmealRequest,
        },
        orders::{
            CancelOrderRequest, OrderList, OrderStatistics, OrderSubmitSummary, OrderWithDetails,
            PayOrderRequest, PaymentAck, RejectOrderRequest, SubmitOrderRequest,
        },
    },
    entity::MenuStatus,
    models::{Address, CartItem, MenuItem, Order, OrderDetail},
    order_state::{OrderStatus, PayStatus},
    response::{ApiResponse, Meta},
    routes::{address, admin, cart, health, menu, notify, orders, params},
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
        orders::submit_order,
        orders::pay_order,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        orders::repeat_order,
        notify::pay_success,
        cart::cart_list,
        cart::add_to_cart,
        cart::clean_cart,
        address::list_addresses,
        address::add_address,
        address::get_address,
        menu::list_dishes,
        menu::list_setmeals,
        menu::page_dishes,
        menu::get_dish,
        menu::create_dish,
        menu::update_dish,
        menu::set_dish_status,
        menu::delete_dishes,
        menu::page_setmeals,
        menu::get_setmeal,
        menu::create_setmeal,
        menu::update_setmeal,
        menu::set_setmeal_status,
        menu::delete_setmeals,
        admin::list_all_orders,
        admin::order_statistics,
        admin::get_order_admin,
        admin::confirm_order,
        admin::reject_order,
        admin::cancel_order,
        admin::dispatch_order,
        admin::complete_order
    ),
    components(
        schemas(
            Order,
            OrderDetail,
            OrderStatus,
            PayStatus,
            CartItem,
            Address,
            MenuItem,
            MenuStatus,
            SubmitOrderRequest,
            OrderSubmitSummary,
            PayOrderRequest,
            PaymentAck,
            RejectOrderRequest,
            CancelOrderRequest,
            OrderWithDetails,
            OrderList,
            OrderStatistics,
            AddToCartRequest,
            CartList,
            CreateAddressRequest,
            AddressList,
            MenuList,
            CreateDishRequest,
            UpdateDishRequest,
            MenuStatusRequest,
            DeleteDishesRequest,
            SetmealDishLine,
            CreateSetmealRequest,
            UpdateSetmealRequest,
            DeleteSetmealsRequest,
            SetmealWithDishes,
            params::MenuPageQuery,
            params::OrderListQuery,
            params::AdminOrderQuery,
            params::StatisticsQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithDetails>,
            ApiResponse<PaymentAck>,
            ApiResponse<MenuList>,
            ApiResponse<SetmealWithDishes>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Customer order endpoints"),
        (name = "Notify", description = "Payment gateway callbacks"),
        (name = "Cart", description = "Shopping cart endpoints"),
        (name = "Addresses", description = "Address book endpoints"),
        (name = "Menu", description = "Dish and combo endpoints"),
        (name = "Admin", description = "Merchant order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
