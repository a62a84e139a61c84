pub mod address_service;
pub mod admin_service;
pub mod cart_service;
pub mod dish_service;
pub mod order_service;
pub mod order_transitions;
pub mod setmeal_service;
