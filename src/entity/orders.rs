use sea_orm::entity::prelude::*;

use crate::order_state::{OrderStatus, PayStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: String,
    pub user_id: Uuid,
    pub address_book_id: Uuid,
    pub status: OrderStatus,
    pub pay_status: PayStatus,
    pub amount: i64,
    pub remark: Option<String>,
    pub consignee: String,
    pub phone: String,
    pub address: String,
    pub order_time: DateTimeWithTimeZone,
    pub checkout_time: Option<DateTimeWithTimeZone>,
    pub delivery_time: Option<DateTimeWithTimeZone>,
    pub cancel_time: Option<DateTimeWithTimeZone>,
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_details::Entity")]
    OrderDetails,
}

impl Related<super::order_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
