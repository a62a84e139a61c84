use axum::Router;

use crate::state::AppState;

pub mod address;
pub mod admin;
pub mod cart;
pub mod doc;
pub mod health;
pub mod menu;
pub mod notify;
pub mod orders;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    let user = Router::new()
        .nest("/orders", orders::router())
        .nest("/cart", cart::router())
        .nest("/addresses", address::router())
        .merge(menu::user_router());

    let admin = admin::router().merge(menu::admin_router());

    Router::new()
        .nest("/user", user)
        .nest("/notify", notify::router())
        .nest("/admin", admin)
}
