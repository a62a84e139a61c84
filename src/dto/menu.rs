use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity::MenuStatus, models::MenuItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryQuery {
    pub category_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuList {
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDishRequest {
    pub category_id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDishRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuStatusRequest {
    pub status: MenuStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteDishesRequest {
    pub ids: Vec<Uuid>,
}

/// One dish of a combo and how many portions of it the combo holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SetmealDishLine {
    pub dish_id: Uuid,
    pub copies: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSetmealRequest {
    pub category_id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub dishes: Vec<SetmealDishLine>,
}

/// Fields left out stay as they are; `dishes`, when given, replaces the whole list.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSetmealRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub dishes: Option<Vec<SetmealDishLine>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteSetmealsRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetmealWithDishes {
    pub setmeal: MenuItem,
    pub dishes: Vec<SetmealDishLine>,
}
