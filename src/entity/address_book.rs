use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "address_book")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub consignee: String,
    pub phone: String,
    pub province_name: String,
    pub city_name: String,
    pub district_name: String,
    pub detail: String,
    pub label: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Single-line address copied onto orders.
    pub fn full_address(&self) -> String {
        format!(
            "{}{}{}{}",
            self.province_name, self.city_name, self.district_name, self.detail
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
