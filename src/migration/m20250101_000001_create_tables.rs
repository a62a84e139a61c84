use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entity::{
    AddressBook, AuditLogs, CartItems, Dishes, OrderDetails, Orders, SetmealDishes, Setmeals,
    cart_items, dishes, order_details, orders, setmeal_dishes, setmeals,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_table(manager, AddressBook).await?;
        create_table(manager, CartItems).await?;
        create_table(manager, Dishes).await?;
        create_table(manager, Setmeals).await?;
        create_table(manager, SetmealDishes).await?;
        create_table(manager, Orders).await?;
        create_table(manager, OrderDetails).await?;
        create_table(manager, AuditLogs).await?;

        // Both sweeps select by status and age.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_status_order_time")
                    .table(Orders)
                    .col(orders::Column::Status)
                    .col(orders::Column::OrderTime)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_user_id")
                    .table(Orders)
                    .col(orders::Column::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_details_order_id")
                    .table(OrderDetails)
                    .col(order_details::Column::OrderId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cart_items_user_id")
                    .table(CartItems)
                    .col(cart_items::Column::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_dishes_category_id")
                    .table(Dishes)
                    .col(dishes::Column::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_setmeals_category_id")
                    .table(Setmeals)
                    .col(setmeals::Column::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_setmeal_dishes_dish_id")
                    .table(SetmealDishes)
                    .col(setmeal_dishes::Column::DishId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderDetails).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SetmealDishes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Setmeals).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dishes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CartItems).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AddressBook).to_owned())
            .await?;
        Ok(())
    }
}

async fn create_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let schema = Schema::new(manager.get_database_backend());
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}
