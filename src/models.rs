use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        MenuStatus, address_book, cart_items, dishes, order_details, orders, setmeals,
    },
    order_state::{OrderStatus, PayStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub number: String,
    pub user_id: Uuid,
    pub address_book_id: Uuid,
    pub status: OrderStatus,
    pub pay_status: PayStatus,
    /// Minor currency units.
    pub amount: i64,
    pub remark: Option<String>,
    pub consignee: String,
    pub phone: String,
    pub address: String,
    pub order_time: DateTime<Utc>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub cancel_time: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            number: model.number,
            user_id: model.user_id,
            address_book_id: model.address_book_id,
            status: model.status,
            pay_status: model.pay_status,
            amount: model.amount,
            remark: model.remark,
            consignee: model.consignee,
            phone: model.phone,
            address: model.address,
            order_time: model.order_time.with_timezone(&Utc),
            checkout_time: model.checkout_time.map(|dt| dt.with_timezone(&Utc)),
            delivery_time: model.delivery_time.map(|dt| dt.with_timezone(&Utc)),
            cancel_time: model.cancel_time.map(|dt| dt.with_timezone(&Utc)),
            cancel_reason: model.cancel_reason,
            rejection_reason: model.rejection_reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_id: Uuid,
    pub name: String,
    pub dish_id: Option<Uuid>,
    pub setmeal_id: Option<Uuid>,
    pub unit_price: i64,
    pub quantity: i32,
}

impl From<order_details::Model> for OrderDetail {
    fn from(model: order_details::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            name: model.name,
            dish_id: model.dish_id,
            setmeal_id: model.setmeal_id,
            unit_price: model.unit_price,
            quantity: model.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dish_id: Option<Uuid>,
    pub setmeal_id: Option<Uuid>,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            dish_id: model.dish_id,
            setmeal_id: model.setmeal_id,
            name: model.name,
            unit_price: model.unit_price,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub consignee: String,
    pub phone: String,
    pub province_name: String,
    pub city_name: String,
    pub district_name: String,
    pub detail: String,
    pub label: Option<String>,
}

impl From<address_book::Model> for Address {
    fn from(model: address_book::Model) -> Self {
        Self {
            id: model.id,
            consignee: model.consignee,
            phone: model.phone,
            province_name: model.province_name,
            city_name: model.city_name,
            district_name: model.district_name,
            detail: model.detail,
            label: model.label,
        }
    }
}

/// Menu row as served to customers and cached per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: MenuStatus,
}

impl From<dishes::Model> for MenuItem {
    fn from(model: dishes::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            price: model.price,
            description: model.description,
            image: model.image,
            status: model.status,
        }
    }
}

impl From<setmeals::Model> for MenuItem {
    fn from(model: setmeals::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            price: model.price,
            description: model.description,
            image: model.image,
            status: model.status,
        }
    }
}
