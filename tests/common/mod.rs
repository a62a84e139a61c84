#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum_takeout_api::{
    cache::{CacheError, CacheStore, InMemoryCacheStore},
    clock::ManualClock,
    db::{create_orm_conn, run_migrations},
    dto::{cart::AddToCartRequest, orders::SubmitOrderRequest},
    entity::{
        MenuStatus,
        address_book::{ActiveModel as AddressActive, Model as AddressModel},
        dishes::{ActiveModel as DishActive, Model as DishModel},
        setmeal_dishes::ActiveModel as SetmealDishActive,
        setmeals::{ActiveModel as SetmealActive, Model as SetmealModel},
    },
    middleware::auth::{ADMIN_ROLE, AuthUser},
    order_number::SnowflakeGenerator,
    services::{cart_service, order_service},
    stamp::{OperationKind, Stamp},
    state::AppState,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

pub struct TestContext {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<InMemoryCacheStore>,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .expect("valid start time")
}

pub async fn setup() -> anyhow::Result<TestContext> {
    let cache = Arc::new(InMemoryCacheStore::new());
    setup_with_store(cache.clone())
        .await
        .map(|(state, clock)| TestContext {
            state,
            clock,
            cache,
        })
}

pub async fn setup_with_store(
    store: Arc<dyn CacheStore>,
) -> anyhow::Result<(AppState, Arc<ManualClock>)> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    run_migrations(&orm).await?;

    let clock = Arc::new(ManualClock::new(start_time()));
    let state = AppState::new(
        orm,
        clock.clone(),
        Arc::new(SnowflakeGenerator::new(1)?),
        store,
    );
    Ok((state, clock))
}

pub fn customer() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "user".into(),
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: ADMIN_ROLE.into(),
    }
}

pub async fn seed_dish(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<DishModel> {
    let mut active = DishActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        price: Set(price),
        description: Set(None),
        image: Set(None),
        status: Set(MenuStatus::Enabled),
        ..Default::default()
    };
    active.stamp(state.clock.now(), Uuid::nil(), OperationKind::Insert);
    Ok(active.insert(&state.orm).await?)
}

pub async fn seed_setmeal(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: i64,
    dish_ids: &[Uuid],
) -> anyhow::Result<SetmealModel> {
    let mut active = SetmealActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        price: Set(price),
        description: Set(None),
        image: Set(None),
        status: Set(MenuStatus::Enabled),
        ..Default::default()
    };
    active.stamp(state.clock.now(), Uuid::nil(), OperationKind::Insert);
    let setmeal = active.insert(&state.orm).await?;

    for dish_id in dish_ids {
        SetmealDishActive {
            id: Set(Uuid::new_v4()),
            setmeal_id: Set(setmeal.id),
            dish_id: Set(*dish_id),
            copies: Set(1),
        }
        .insert(&state.orm)
        .await?;
    }
    Ok(setmeal)
}

pub async fn seed_address(state: &AppState, user: &AuthUser) -> anyhow::Result<AddressModel> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        consignee: Set("Li Lei".into()),
        phone: Set("13800000000".into()),
        province_name: Set("Zhejiang".into()),
        city_name: Set("Hangzhou".into()),
        district_name: Set("Xihu".into()),
        detail: Set("1 Lake Road".into()),
        label: Set(None),
        created_at: Set(state.clock.now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(address)
}

pub async fn add_dish(state: &AppState, user: &AuthUser, dish_id: Uuid) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            dish_id: Some(dish_id),
            setmeal_id: None,
        },
    )
    .await?;
    Ok(())
}

/// Fills the cart with two dishes worth 38.00 in total and submits it.
pub async fn place_order(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let category = Uuid::new_v4();
    let chicken = seed_dish(state, category, "Kung Pao Chicken", 2800).await?;
    let rice = seed_dish(state, category, "Egg Fried Rice", 1000).await?;
    let address = seed_address(state, user).await?;
    add_dish(state, user, chicken.id).await?;
    add_dish(state, user, rice.id).await?;

    let resp = order_service::submit_order(
        state,
        user,
        SubmitOrderRequest {
            address_book_id: address.id,
            remark: None,
            amount: Some(3800),
        },
    )
    .await?;
    let summary = resp.data.expect("submit summary");
    Ok(summary.id)
}

/// Cache backend that is always down.
pub struct UnavailableStore;

#[async_trait]
impl CacheStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn counter(&self, _key: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn incr(&self, _key: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}
