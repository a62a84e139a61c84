pub mod address;
pub mod cart;
pub mod menu;
pub mod orders;
