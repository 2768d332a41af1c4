use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use axum_delivery_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "0900000000", "admin123", "admin").await?;
    let customer_id = ensure_user(&pool, "Customer", "0911111111", "customer123", "customer").await?;
    let driver_id = ensure_user(&pool, "Driver", "0922222222", "driver123", "driver").await?;
    let owner_id = ensure_user(&pool, "Owner", "0933333333", "owner123", "restaurant").await?;
    let _ = (customer_id, driver_id);

    seed_restaurant(&pool, owner_id).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    phone: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, phone, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (phone) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(phone)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
                .bind(phone)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {phone} (role={role})");
    Ok(user_id)
}

async fn seed_restaurant(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM restaurants WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        println!("Restaurant already seeded");
        return Ok(());
    }

    let restaurant_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO restaurants
            (id, owner_id, name, description, address, area, cuisine_type, is_open, delivery_fee, min_order, delivery_time)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9, $10)
        "#,
    )
    .bind(restaurant_id)
    .bind(owner_id)
    .bind("Shawarma House")
    .bind("Charcoal shawarma and grills")
    .bind("Main St 12")
    .bind("Downtown")
    .bind("Syrian")
    .bind(5000_i64)
    .bind(10000_i64)
    .bind("30-45 min")
    .execute(pool)
    .await?;

    let items = vec![
        ("Chicken Shawarma", "Wrap with garlic sauce", 8000_i64, "Sandwiches"),
        ("Beef Shawarma", "Wrap with tahini", 9500_i64, "Sandwiches"),
        ("Fries", "Crispy fries", 3000_i64, "Sides"),
    ];

    for (name, desc, price, category) in items {
        let item_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, restaurant_id, name, description, price, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item_id)
        .bind(restaurant_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(category)
        .execute(pool)
        .await?;

        if category == "Sandwiches" {
            sqlx::query(
                r#"
                INSERT INTO addon_groups (id, menu_item_id, restaurant_id, name, is_required, max_selections, options)
                VALUES ($1, $2, $3, $4, FALSE, 2, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(item_id)
            .bind(restaurant_id)
            .bind("Extras")
            .bind(serde_json::json!([
                { "name": "Extra garlic", "price": 500 },
                { "name": "Cheese", "price": 1000 },
                { "name": "Pickles", "price": 0 }
            ]))
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded restaurant and menu");
    Ok(())
}
