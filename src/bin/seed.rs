use axum_takeout_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        MenuStatus,
        address_book::ActiveModel as AddressActive,
        dishes::{ActiveModel as DishActive, Column as DishCol, Entity as Dishes},
        setmeal_dishes::ActiveModel as SetmealDishActive,
        setmeals::ActiveModel as SetmealActive,
    },
    middleware::auth::{ADMIN_ROLE, Claims},
    stamp::{OperationKind, Stamp},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

// Fixed ids so repeated runs and local tokens line up.
const DEMO_ADMIN: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
const DEMO_USER: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002);
const DEMO_CATEGORY: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let already_seeded = Dishes::find()
        .filter(DishCol::CategoryId.eq(DEMO_CATEGORY))
        .one(&orm)
        .await?
        .is_some();
    if already_seeded {
        println!("Demo menu already present, skipping menu seed");
    } else {
        seed_menu(&orm).await?;
        seed_address(&orm).await?;
    }

    if let Ok(secret) = std::env::var("JWT_SECRET") {
        println!("Admin token: {}", dev_token(DEMO_ADMIN, ADMIN_ROLE, &secret)?);
        println!("User token:  {}", dev_token(DEMO_USER, "user", &secret)?);
    }

    println!("Seed completed. Category ID: {DEMO_CATEGORY}");
    Ok(())
}

async fn seed_menu(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now();
    let dishes = [
        ("Kung Pao Chicken", 2800, "Diced chicken, peanuts, dried chilli"),
        ("Egg Fried Rice", 1000, "Wok fried rice with egg and scallion"),
        ("Hot and Sour Soup", 1200, "Tofu, bamboo shoots, black vinegar"),
    ];

    let mut dish_ids = Vec::with_capacity(dishes.len());
    for (name, price, description) in dishes {
        let mut active = DishActive {
            id: Set(Uuid::new_v4()),
            category_id: Set(DEMO_CATEGORY),
            name: Set(name.to_string()),
            price: Set(price),
            description: Set(Some(description.to_string())),
            image: Set(None),
            status: Set(MenuStatus::Enabled),
            ..Default::default()
        };
        active.stamp(now, DEMO_ADMIN, OperationKind::Insert);
        let dish = active.insert(orm).await?;
        println!("Seeded dish {} ({})", dish.name, dish.id);
        dish_ids.push(dish.id);
    }

    let mut combo = SetmealActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(DEMO_CATEGORY),
        name: Set("Lunch Set".to_string()),
        price: Set(3600),
        description: Set(Some("Kung Pao Chicken with fried rice".to_string())),
        image: Set(None),
        status: Set(MenuStatus::Enabled),
        ..Default::default()
    };
    combo.stamp(now, DEMO_ADMIN, OperationKind::Insert);
    let combo = combo.insert(orm).await?;

    for dish_id in dish_ids.iter().take(2) {
        SetmealDishActive {
            id: Set(Uuid::new_v4()),
            setmeal_id: Set(combo.id),
            dish_id: Set(*dish_id),
            copies: Set(1),
        }
        .insert(orm)
        .await?;
    }
    println!("Seeded combo {} ({})", combo.name, combo.id);
    Ok(())
}

async fn seed_address(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(DEMO_USER),
        consignee: Set("Demo Customer".to_string()),
        phone: Set("13800000000".to_string()),
        province_name: Set("Zhejiang ".to_string()),
        city_name: Set("Hangzhou ".to_string()),
        district_name: Set("Xihu ".to_string()),
        detail: Set("1 Demo Road".to_string()),
        label: Set(Some("home".to_string())),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    println!("Seeded address {} for user {DEMO_USER}", address.id);
    Ok(())
}

fn dev_token(user_id: Uuid, role: &str, secret: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (Utc::now().timestamp() + 7 * 24 * 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}
