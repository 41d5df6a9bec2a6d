use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use storefront_api::{
    db::connect_and_migrate,
    entity::{admins, categories, product_categories, products},
};
use uuid::Uuid;

struct SeedProduct {
    ename: &'static str,
    arname: &'static str,
    category: &'static str,
    sale_price: Decimal,
    regular_price: Decimal,
    weight: Decimal,
    stock: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let orm = connect_and_migrate(&database_url).await?;

    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    ensure_super_admin(&orm, &admin_email).await?;

    let cookware = ensure_category(&orm, "Cookware", "أدوات الطبخ").await?;
    let spices = ensure_category(&orm, "Spices", "بهارات").await?;
    seed_products(&orm, &[("Cookware", cookware), ("Spices", spices)]).await?;

    println!("Seed completed. Super-admin: {admin_email}");
    Ok(())
}

async fn ensure_super_admin(orm: &DatabaseConnection, email: &str) -> anyhow::Result<()> {
    admins::Entity::insert(admins::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        name: Set("Super Admin".to_string()),
        picture: Set(String::new()),
        approved: Set(true),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(admins::Column::Email)
            .update_column(admins::Column::Approved)
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    println!("Ensured approved admin {email}");
    Ok(())
}

async fn ensure_category(
    orm: &DatabaseConnection,
    ename: &str,
    arname: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = categories::Entity::find()
        .filter(categories::Column::Ename.eq(ename))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        ename: Set(ename.to_string()),
        arname: Set(arname.to_string()),
        image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(orm)
    .await?;
    println!("Seeded category {ename}");
    Ok(category.id)
}

async fn seed_products(
    orm: &DatabaseConnection,
    categories: &[(&str, Uuid)],
) -> anyhow::Result<()> {
    let catalog = [
        SeedProduct {
            ename: "Cast Iron Skillet",
            arname: "مقلاة حديد",
            category: "Cookware",
            sale_price: dec!(120.00),
            regular_price: dec!(150.00),
            weight: dec!(25),
            stock: 40,
        },
        SeedProduct {
            ename: "Chef Knife",
            arname: "سكين الطاهي",
            category: "Cookware",
            sale_price: dec!(89.50),
            regular_price: dec!(89.50),
            weight: dec!(4),
            stock: 60,
        },
        SeedProduct {
            ename: "Saffron 5g",
            arname: "زعفران ٥ غرام",
            category: "Spices",
            sale_price: dec!(45.00),
            regular_price: dec!(55.00),
            weight: dec!(1),
            stock: 3,
        },
    ];

    for item in catalog {
        let exists = products::Entity::find()
            .filter(products::Column::Ename.eq(item.ename))
            .filter(products::Column::DeletedAt.is_null())
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            ename: Set(item.ename.to_string()),
            arname: Set(item.arname.to_string()),
            edescription: Set(String::new()),
            ardescription: Set(String::new()),
            sale_price: Set(item.sale_price),
            regular_price: Set(item.regular_price),
            base_cost: Set(Decimal::ZERO),
            image: Set(String::new()),
            weight: Set(item.weight),
            stock: Set(item.stock),
            created_at: NotSet,
            updated_at: NotSet,
            deleted_at: NotSet,
        }
        .insert(orm)
        .await?;

        if let Some((_, category_id)) = categories.iter().find(|(name, _)| *name == item.category) {
            product_categories::ActiveModel {
                product_id: Set(product.id),
                category_id: Set(*category_id),
            }
            .insert(orm)
            .await?;
        }
        println!("Seeded product {}", item.ename);
    }

    Ok(())
}
