pub mod address_book;
pub mod audit_logs;
pub mod cart_items;
pub mod dishes;
pub mod order_details;
pub mod orders;
pub mod setmeal_dishes;
pub mod setmeals;
pub mod status;

pub use address_book::Entity as AddressBook;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use dishes::Entity as Dishes;
pub use order_details::Entity as OrderDetails;
pub use orders::Entity as Orders;
pub use setmeal_dishes::Entity as SetmealDishes;
pub use setmeals::Entity as Setmeals;
pub use status::MenuStatus;
