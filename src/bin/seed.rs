//! Inserts demo accounts and inventory so a fresh instance is usable.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use resourcemaster::auth::password::hash_password;
use resourcemaster::auth::store::{CredentialStore, PgCredentialStore};
use resourcemaster::auth::user::{NewUser, Role};
use resourcemaster::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "resourcemaster=info".to_string()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let store = PgCredentialStore::new(db.clone());

    let demo_users = [
        ("Admin User", "admin@ambouniversity.edu", "admin123", Role::Admin),
        (
            "Inventory Manager",
            "manager@ambouniversity.edu",
            "manager123",
            Role::InventoryManager,
        ),
        ("Staff Member", "staff@ambouniversity.edu", "staff123", Role::Staff),
    ];
    for (name, email, password, role) in demo_users {
        if store.find_by_email(email).await?.is_none() {
            store
                .create(NewUser {
                    name: name.into(),
                    email: email.into(),
                    password_hash: hash_password(password)?,
                    role,
                })
                .await?;
            tracing::info!(%email, role = role.as_str(), "seeded user");
        }
    }

    let demo_resources = [
        ("Laptop Computers", "Electronics", 45, "Computer Lab", 20),
        ("Projectors", "Electronics", 12, "Classroom", 15),
        ("Textbooks", "Books", 8, "Library", 10),
        ("Lab Equipment", "Equipment", 25, "Lab", 15),
        ("Chairs", "Furniture", 150, "Classroom", 50),
        ("Tables", "Furniture", 80, "Classroom", 40),
        ("Whiteboard Markers", "Supplies", 5, "Classroom", 20),
        ("Cleaning Supplies", "Supplies", 15, "Cafeteria", 25),
    ];
    for (name, category, quantity, location, minimum_threshold) in demo_resources {
        let exists: Option<uuid::Uuid> =
            sqlx::query_scalar("SELECT id FROM resources WHERE name = $1")
                .bind(name)
                .fetch_optional(&db)
                .await?;
        if exists.is_none() {
            sqlx::query(
                r#"
                INSERT INTO resources (id, name, category, quantity, location, minimum_threshold)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(uuid::Uuid::new_v4())
            .bind(name)
            .bind(category)
            .bind(quantity)
            .bind(location)
            .bind(minimum_threshold)
            .execute(&db)
            .await?;
            tracing::info!(%name, "seeded resource");
        }
    }

    tracing::info!("seed data inserted");
    Ok(())
}
