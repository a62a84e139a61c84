use sea_orm::entity::prelude::*;

use super::status::MenuStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "dishes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: MenuStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::setmeal_dishes::Entity")]
    SetmealDishes,
}

impl Related<super::setmeal_dishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SetmealDishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
