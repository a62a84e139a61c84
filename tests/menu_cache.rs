mod common;

use std::sync::Arc;

use axum_takeout_api::{
    cache::MenuNamespace,
    dto::menu::{
        CreateDishRequest, CreateSetmealRequest, DeleteDishesRequest, DeleteSetmealsRequest,
        SetmealDishLine, UpdateDishRequest, UpdateSetmealRequest,
    },
    entity::{
        Dishes, MenuStatus, SetmealDishes, Setmeals, dishes::Column as DishCol,
        setmeal_dishes::Column as SetmealDishCol,
    },
    error::{AppError, ValidationError},
    models::MenuItem,
    routes::params::MenuPageQuery,
    services::{dish_service, setmeal_service},
};
use common::{UnavailableStore, admin, seed_dish, seed_setmeal, setup, setup_with_store};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn dish_request(category_id: Uuid, name: &str, price: i64) -> CreateDishRequest {
    CreateDishRequest {
        category_id,
        name: name.to_string(),
        price,
        description: None,
        image: None,
    }
}

#[tokio::test]
async fn disabling_a_dish_drops_it_from_the_cached_listing() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let category = Uuid::new_v4();

    let noodles = dish_service::create_dish(
        &ctx.state,
        &merchant,
        dish_request(category, "Dan Dan Noodles", 1600),
    )
    .await?
    .data
    .expect("dish");
    dish_service::create_dish(
        &ctx.state,
        &merchant,
        dish_request(category, "Wontons", 1400),
    )
    .await?;

    let first = dish_service::list_by_category(&ctx.state, category)
        .await?
        .data
        .expect("listing");
    assert_eq!(first.items.len(), 2);
    assert!(!ctx.cache.is_empty());

    // Served from cache the second time round.
    let again = dish_service::list_by_category(&ctx.state, category)
        .await?
        .data
        .expect("listing");
    assert_eq!(again.items, first.items);

    dish_service::set_status(&ctx.state, &merchant, noodles.id, MenuStatus::Disabled).await?;

    let after = dish_service::list_by_category(&ctx.state, category)
        .await?
        .data
        .expect("listing");
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].name, "Wontons");
    Ok(())
}

#[tokio::test]
async fn invalidation_moves_the_read_key() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let category = Uuid::new_v4();
    let cache = &ctx.state.menu_cache;

    let before = cache.listing_key(MenuNamespace::Dishes, category).await?;
    cache
        .invalidate_category(MenuNamespace::Dishes, category)
        .await;
    let after_category = cache.listing_key(MenuNamespace::Dishes, category).await?;
    cache.invalidate_namespace(MenuNamespace::Dishes).await;
    let after_namespace = cache.listing_key(MenuNamespace::Dishes, category).await?;

    assert_ne!(before, after_category);
    assert_ne!(after_category, after_namespace);

    // Setmeal keys are unaffected by dish invalidation.
    let setmeal_key = cache.listing_key(MenuNamespace::Setmeals, category).await?;
    assert!(setmeal_key.starts_with("setmeal:0:"));
    Ok(())
}

#[tokio::test]
async fn reader_with_a_pre_write_snapshot_cannot_bring_it_back() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let category = Uuid::new_v4();
    let dish = seed_dish(&ctx.state, category, "Mapo Tofu", 1800).await?;

    // The loader reads, then the dish goes off sale and the cache is invalidated
    // before the loader hands its now stale rows back.
    let stale = ctx
        .state
        .menu_cache
        .read_through(MenuNamespace::Dishes, category, || async {
            let snapshot: Vec<MenuItem> = Dishes::find()
                .filter(DishCol::CategoryId.eq(category))
                .all(&ctx.state.orm)
                .await?
                .into_iter()
                .map(MenuItem::from)
                .collect();
            dish_service::set_status(&ctx.state, &merchant, dish.id, MenuStatus::Disabled)
                .await?;
            Ok::<_, AppError>(snapshot)
        })
        .await?;
    assert_eq!(stale.len(), 1);

    let fresh = dish_service::list_by_category(&ctx.state, category)
        .await?
        .data
        .expect("listing");
    assert!(fresh.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn namespace_invalidation_drops_old_entries() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let (starters, mains) = (Uuid::new_v4(), Uuid::new_v4());
    let dish = seed_dish(&ctx.state, starters, "Cucumber Salad", 800).await?;
    seed_dish(&ctx.state, mains, "Braised Pork", 3200).await?;
    seed_setmeal(&ctx.state, mains, "Pork Set", 3800, &[dish.id]).await?;

    dish_service::list_by_category(&ctx.state, starters).await?;
    dish_service::list_by_category(&ctx.state, mains).await?;
    setmeal_service::list_by_category(&ctx.state, mains).await?;
    assert_eq!(ctx.cache.len(), 3);

    ctx.state
        .menu_cache
        .invalidate_namespace(MenuNamespace::Dishes)
        .await;
    assert_eq!(ctx.cache.len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_listings_are_not_cached() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let listing = dish_service::list_by_category(&ctx.state, Uuid::new_v4())
        .await?
        .data
        .expect("listing");
    assert!(listing.items.is_empty());
    assert!(ctx.cache.is_empty());
    Ok(())
}

#[tokio::test]
async fn unavailable_cache_falls_back_to_the_store() -> anyhow::Result<()> {
    let (state, _clock) = setup_with_store(Arc::new(UnavailableStore)).await?;
    let merchant = admin();
    let category = Uuid::new_v4();

    let dish = dish_service::create_dish(
        &state,
        &merchant,
        dish_request(category, "Spring Rolls", 900),
    )
    .await?
    .data
    .expect("dish");

    let listing = dish_service::list_by_category(&state, category)
        .await?
        .data
        .expect("listing");
    assert_eq!(listing.items.len(), 1);

    // Invalidation failures are logged, the write still goes through.
    dish_service::set_status(&state, &merchant, dish.id, MenuStatus::Disabled).await?;
    let listing = dish_service::list_by_category(&state, category)
        .await?
        .data
        .expect("listing");
    assert!(listing.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn moving_a_dish_between_categories_refreshes_both() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let (starters, mains) = (Uuid::new_v4(), Uuid::new_v4());

    let dish = seed_dish(&ctx.state, starters, "Cucumber Salad", 800).await?;
    seed_dish(&ctx.state, mains, "Braised Pork", 3200).await?;
    assert_eq!(
        dish_service::list_by_category(&ctx.state, starters)
            .await?
            .data
            .expect("listing")
            .items
            .len(),
        1
    );
    assert_eq!(
        dish_service::list_by_category(&ctx.state, mains)
            .await?
            .data
            .expect("listing")
            .items
            .len(),
        1
    );

    dish_service::update_dish(
        &ctx.state,
        &merchant,
        dish.id,
        UpdateDishRequest {
            category_id: Some(mains),
            ..Default::default()
        },
    )
    .await?;

    let starters_now = dish_service::list_by_category(&ctx.state, starters)
        .await?
        .data
        .expect("listing");
    let mains_now = dish_service::list_by_category(&ctx.state, mains)
        .await?
        .data
        .expect("listing");
    assert!(starters_now.items.is_empty());
    assert_eq!(mains_now.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn disabling_a_dish_disables_its_combos() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let category = Uuid::new_v4();
    let dish = seed_dish(&ctx.state, category, "Kung Pao Chicken", 2800).await?;
    let combo = seed_setmeal(&ctx.state, category, "Lunch Set", 3600, &[dish.id]).await?;

    let listed = setmeal_service::list_by_category(&ctx.state, category)
        .await?
        .data
        .expect("listing");
    assert_eq!(listed.items.len(), 1);

    dish_service::set_status(&ctx.state, &merchant, dish.id, MenuStatus::Disabled).await?;

    let stored = Setmeals::find_by_id(combo.id)
        .one(&ctx.state.orm)
        .await?
        .expect("combo");
    assert_eq!(stored.status, MenuStatus::Disabled);
    let listed = setmeal_service::list_by_category(&ctx.state, category)
        .await?
        .data
        .expect("listing");
    assert!(listed.items.is_empty());

    // Cannot go back on sale while the dish is off.
    let err = setmeal_service::set_status(&ctx.state, &merchant, combo.id, MenuStatus::Enabled)
        .await
        .expect_err("dish disabled");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::StatusChangeNotAllowed(_))
    ));

    dish_service::set_status(&ctx.state, &merchant, dish.id, MenuStatus::Enabled).await?;
    setmeal_service::set_status(&ctx.state, &merchant, combo.id, MenuStatus::Enabled).await?;
    let listed = setmeal_service::list_by_category(&ctx.state, category)
        .await?
        .data
        .expect("listing");
    assert_eq!(listed.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn dishes_on_sale_or_in_combos_cannot_be_deleted() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let category = Uuid::new_v4();
    let on_sale = seed_dish(&ctx.state, category, "Fish Fragrant Eggplant", 2200).await?;

    let err = dish_service::delete_dishes(
        &ctx.state,
        &merchant,
        DeleteDishesRequest {
            ids: vec![on_sale.id],
        },
    )
    .await
    .expect_err("on sale");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::DeletionNotAllowed(_))
    ));

    let in_combo = seed_dish(&ctx.state, category, "Steamed Rice", 300).await?;
    seed_setmeal(&ctx.state, category, "Rice Set", 2400, &[in_combo.id]).await?;
    dish_service::set_status(&ctx.state, &merchant, in_combo.id, MenuStatus::Disabled).await?;
    let err = dish_service::delete_dishes(
        &ctx.state,
        &merchant,
        DeleteDishesRequest {
            ids: vec![in_combo.id],
        },
    )
    .await
    .expect_err("in combo");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::DeletionNotAllowed(_))
    ));

    dish_service::set_status(&ctx.state, &merchant, on_sale.id, MenuStatus::Disabled).await?;
    let deleted = dish_service::delete_dishes(
        &ctx.state,
        &merchant,
        DeleteDishesRequest {
            ids: vec![on_sale.id],
        },
    )
    .await?
    .data
    .expect("result");
    assert_eq!(deleted["deleted"], 1);
    Ok(())
}

#[tokio::test]
async fn only_admins_manage_the_menu() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let err = dish_service::create_dish(
        &ctx.state,
        &common::customer(),
        dish_request(Uuid::new_v4(), "Hot Pot", 9900),
    )
    .await
    .expect_err("forbidden");
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

fn line(dish_id: Uuid, copies: i32) -> SetmealDishLine {
    SetmealDishLine { dish_id, copies }
}

fn combo_request(category_id: Uuid, name: &str, dishes: Vec<SetmealDishLine>) -> CreateSetmealRequest {
    CreateSetmealRequest {
        category_id,
        name: name.to_string(),
        price: 5000,
        description: None,
        image: None,
        dishes,
    }
}

#[tokio::test]
async fn combo_admin_keeps_the_listing_current() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let (lunch, dinner) = (Uuid::new_v4(), Uuid::new_v4());
    let chicken = seed_dish(&ctx.state, lunch, "Kung Pao Chicken", 2800).await?;
    let rice = seed_dish(&ctx.state, lunch, "Egg Fried Rice", 1000).await?;

    let created = setmeal_service::create_setmeal(
        &ctx.state,
        &merchant,
        combo_request(lunch, "Family Set", vec![line(chicken.id, 2), line(rice.id, 1)]),
    )
    .await?
    .data
    .expect("combo");
    let combo_id = created.setmeal.id;
    assert_eq!(created.setmeal.status, MenuStatus::Disabled);

    let listed = setmeal_service::list_by_category(&ctx.state, lunch)
        .await?
        .data
        .expect("listing");
    assert!(listed.items.is_empty());

    setmeal_service::set_status(&ctx.state, &merchant, combo_id, MenuStatus::Enabled).await?;
    let listed = setmeal_service::list_by_category(&ctx.state, lunch)
        .await?
        .data
        .expect("listing");
    assert_eq!(listed.items.len(), 1);

    setmeal_service::update_setmeal(
        &ctx.state,
        &merchant,
        combo_id,
        UpdateSetmealRequest {
            name: Some("Family Feast".into()),
            dishes: Some(vec![line(chicken.id, 1)]),
            ..Default::default()
        },
    )
    .await?;
    let listed = setmeal_service::list_by_category(&ctx.state, lunch)
        .await?
        .data
        .expect("listing");
    assert_eq!(listed.items[0].name, "Family Feast");

    let detail = setmeal_service::get_setmeal(&ctx.state, &merchant, combo_id)
        .await?
        .data
        .expect("combo");
    assert_eq!(detail.dishes, vec![line(chicken.id, 1)]);

    setmeal_service::update_setmeal(
        &ctx.state,
        &merchant,
        combo_id,
        UpdateSetmealRequest {
            category_id: Some(dinner),
            ..Default::default()
        },
    )
    .await?;
    let lunch_now = setmeal_service::list_by_category(&ctx.state, lunch)
        .await?
        .data
        .expect("listing");
    let dinner_now = setmeal_service::list_by_category(&ctx.state, dinner)
        .await?
        .data
        .expect("listing");
    assert!(lunch_now.items.is_empty());
    assert_eq!(dinner_now.items.len(), 1);

    let err = setmeal_service::delete_setmeals(
        &ctx.state,
        &merchant,
        DeleteSetmealsRequest {
            ids: vec![combo_id],
        },
    )
    .await
    .expect_err("on sale");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::DeletionNotAllowed(_))
    ));

    setmeal_service::set_status(&ctx.state, &merchant, combo_id, MenuStatus::Disabled).await?;
    let deleted = setmeal_service::delete_setmeals(
        &ctx.state,
        &merchant,
        DeleteSetmealsRequest {
            ids: vec![combo_id],
        },
    )
    .await?
    .data
    .expect("result");
    assert_eq!(deleted["deleted"], 1);

    let lines = SetmealDishes::find()
        .filter(SetmealDishCol::SetmealId.eq(combo_id))
        .count(&ctx.state.orm)
        .await?;
    assert_eq!(lines, 0);
    let err = setmeal_service::get_setmeal(&ctx.state, &merchant, combo_id)
        .await
        .expect_err("gone");
    assert!(matches!(err, AppError::NotFound));

    // With its combo gone the dish can be taken off the menu entirely.
    dish_service::set_status(&ctx.state, &merchant, rice.id, MenuStatus::Disabled).await?;
    dish_service::delete_dishes(
        &ctx.state,
        &merchant,
        DeleteDishesRequest { ids: vec![rice.id] },
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn combo_dish_lines_are_validated() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let category = Uuid::new_v4();
    let tofu = seed_dish(&ctx.state, category, "Mapo Tofu", 1800).await?;
    let soup = seed_dish(&ctx.state, category, "Hot and Sour Soup", 900).await?;

    let err = setmeal_service::create_setmeal(
        &ctx.state,
        &merchant,
        combo_request(category, "Empty Set", vec![]),
    )
    .await
    .expect_err("no dishes");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::InvalidField(_))
    ));

    let err = setmeal_service::create_setmeal(
        &ctx.state,
        &merchant,
        combo_request(category, "Twice Set", vec![line(tofu.id, 1), line(tofu.id, 2)]),
    )
    .await
    .expect_err("duplicate dish");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::InvalidField(_))
    ));

    let err = setmeal_service::create_setmeal(
        &ctx.state,
        &merchant,
        combo_request(category, "Ghost Set", vec![line(Uuid::new_v4(), 1)]),
    )
    .await
    .expect_err("unknown dish");
    assert!(matches!(err, AppError::NotFound));
    assert_eq!(Setmeals::find().count(&ctx.state.orm).await?, 0);

    // A combo on sale cannot be given a dish that is off sale.
    let combo = seed_setmeal(&ctx.state, category, "Tofu Set", 2400, &[tofu.id]).await?;
    dish_service::set_status(&ctx.state, &merchant, soup.id, MenuStatus::Disabled).await?;
    let err = setmeal_service::update_setmeal(
        &ctx.state,
        &merchant,
        combo.id,
        UpdateSetmealRequest {
            dishes: Some(vec![line(tofu.id, 1), line(soup.id, 1)]),
            ..Default::default()
        },
    )
    .await
    .expect_err("disabled dish");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::StatusChangeNotAllowed(_))
    ));
    let detail = setmeal_service::get_setmeal(&ctx.state, &merchant, combo.id)
        .await?
        .data
        .expect("combo");
    assert_eq!(detail.dishes, vec![line(tofu.id, 1)]);
    Ok(())
}

#[tokio::test]
async fn racing_dish_disable_never_leaves_a_combo_on_sale() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let category = Uuid::new_v4();
    let dish = seed_dish(&ctx.state, category, "Twice Cooked Pork", 2600).await?;
    let combo = seed_setmeal(&ctx.state, category, "Pork Set", 3000, &[dish.id]).await?;
    setmeal_service::set_status(&ctx.state, &merchant, combo.id, MenuStatus::Disabled).await?;

    let (disabled, _enabled) = tokio::join!(
        dish_service::set_status(&ctx.state, &merchant, dish.id, MenuStatus::Disabled),
        setmeal_service::set_status(&ctx.state, &merchant, combo.id, MenuStatus::Enabled),
    );
    disabled?;

    let stored = Setmeals::find_by_id(combo.id)
        .one(&ctx.state.orm)
        .await?
        .expect("combo");
    assert_eq!(stored.status, MenuStatus::Disabled);
    Ok(())
}

#[tokio::test]
async fn racing_enable_and_delete_agree_on_the_dish() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let dish = seed_dish(&ctx.state, Uuid::new_v4(), "Boiled Fish", 4200).await?;
    dish_service::set_status(&ctx.state, &merchant, dish.id, MenuStatus::Disabled).await?;

    let (deleted, enabled) = tokio::join!(
        dish_service::delete_dishes(
            &ctx.state,
            &merchant,
            DeleteDishesRequest { ids: vec![dish.id] },
        ),
        dish_service::set_status(&ctx.state, &merchant, dish.id, MenuStatus::Enabled),
    );

    let stored = Dishes::find_by_id(dish.id).one(&ctx.state.orm).await?;
    match deleted {
        Ok(_) => {
            assert!(stored.is_none());
            assert!(matches!(enabled, Err(AppError::NotFound)));
        }
        Err(err) => {
            assert!(matches!(
                err,
                AppError::Validation(ValidationError::DeletionNotAllowed(_))
            ));
            assert_eq!(stored.map(|d| d.status), Some(MenuStatus::Enabled));
        }
    }
    Ok(())
}

#[tokio::test]
async fn back_office_pages_through_every_dish() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let category = Uuid::new_v4();
    let tofu = seed_dish(&ctx.state, category, "Mapo Tofu", 1800).await?;
    seed_dish(&ctx.state, category, "Wontons", 1400).await?;
    seed_dish(&ctx.state, category, "Spring Rolls", 900).await?;
    dish_service::set_status(&ctx.state, &merchant, tofu.id, MenuStatus::Disabled).await?;

    let page = |status: Option<MenuStatus>, name: Option<&str>| MenuPageQuery {
        category_id: Some(category),
        status,
        name: name.map(str::to_string),
        ..Default::default()
    };

    let all = dish_service::page_dishes(&ctx.state, &merchant, page(None, None)).await?;
    assert_eq!(all.data.expect("page").items.len(), 3);
    assert_eq!(all.meta.and_then(|m| m.total), Some(3));

    let off_sale = dish_service::page_dishes(
        &ctx.state,
        &merchant,
        page(Some(MenuStatus::Disabled), None),
    )
    .await?
    .data
    .expect("page");
    assert_eq!(off_sale.items.len(), 1);
    assert_eq!(off_sale.items[0].id, tofu.id);

    let by_name = dish_service::page_dishes(&ctx.state, &merchant, page(None, Some("Tofu")))
        .await?
        .data
        .expect("page");
    assert_eq!(by_name.items.len(), 1);
    let wildcard = dish_service::page_dishes(&ctx.state, &merchant, page(None, Some("%")))
        .await?
        .data
        .expect("page");
    assert!(wildcard.items.is_empty());

    let fetched = dish_service::get_dish(&ctx.state, &merchant, tofu.id)
        .await?
        .data
        .expect("dish");
    assert_eq!(fetched.status, MenuStatus::Disabled);

    let err = dish_service::page_dishes(&ctx.state, &common::customer(), page(None, None))
        .await
        .expect_err("forbidden");
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}
