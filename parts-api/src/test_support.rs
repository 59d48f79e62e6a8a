use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::domain::models::encode_embedding;

struct Fixture {
    sku: &'static str,
    name: &'static str,
    brand: &'static str,
    category: &'static str,
    regular_price: f64,
    sale_price: Option<f64>,
    in_stock: bool,
    stock_status: Option<&'static str>,
    compatible_models: Option<&'static str>,
    description: Option<&'static str>,
    embedding: [f32; 4],
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        sku: "XWFE",
        name: "GE XWFE Refrigerator Water Filter",
        brand: "GE",
        category: "Refrigerator Parts",
        regular_price: 64.02,
        sale_price: Some(57.62),
        in_stock: true,
        stock_status: None,
        compatible_models: Some("GSS25GSHSS, GFE28GMKES"),
        description: Some("Genuine GE replacement filter that reduces chlorine taste and odor."),
        embedding: [1.0, 0.0, 0.0, 0.0],
    },
    Fixture {
        sku: "EDR1RXD1",
        name: "Whirlpool EveryDrop Refrigerator Water Filter 1",
        brand: "Whirlpool",
        category: "Refrigerator Parts",
        regular_price: 54.99,
        sale_price: Some(49.99),
        in_stock: true,
        stock_status: None,
        compatible_models: Some("WRF535SMBM00, WRS325SDHZ"),
        description: None,
        embedding: [0.9, 0.1, 0.0, 0.0],
    },
    Fixture {
        sku: "EDR4RXD1",
        name: "Whirlpool EveryDrop Refrigerator Water Filter 4",
        brand: "Whirlpool",
        category: "Refrigerator Parts",
        regular_price: 59.99,
        sale_price: None,
        in_stock: true,
        stock_status: None,
        compatible_models: None,
        description: None,
        embedding: [0.8, 0.2, 0.1, 0.0],
    },
    Fixture {
        sku: "W10380496",
        name: "Whirlpool Washer Drum Assembly",
        brand: "Whirlpool",
        category: "Washer Parts",
        regular_price: 189.99,
        sale_price: None,
        in_stock: true,
        stock_status: None,
        compatible_models: None,
        description: Some("Stainless steel inner drum for front-load washers."),
        embedding: [0.7, 0.3, 0.0, 0.0],
    },
    Fixture {
        sku: "DA29-00020B",
        name: "Samsung Refrigerator Water Filter",
        brand: "Samsung",
        category: "Refrigerator Parts",
        regular_price: 49.99,
        sale_price: Some(44.99),
        in_stock: true,
        stock_status: None,
        compatible_models: None,
        description: Some("Carbon block filter for Samsung French door refrigerators."),
        embedding: [0.95, 0.0, 0.05, 0.0],
    },
    Fixture {
        sku: "WR30X10093",
        name: "GE Refrigerator Ice Maker Assembly",
        brand: "GE",
        category: "Refrigerator Parts",
        regular_price: 129.99,
        sale_price: None,
        in_stock: false,
        stock_status: Some("Out of Stock"),
        compatible_models: Some("GSS25GSHSS"),
        description: Some("Replacement ice maker for GE side-by-side refrigerators."),
        embedding: [0.0, 0.0, 1.0, 0.0],
    },
    Fixture {
        sku: "00611475",
        name: "Bosch Dishwasher Drain Pump",
        brand: "Bosch",
        category: "Dishwasher Parts",
        regular_price: 89.5,
        sale_price: None,
        in_stock: true,
        stock_status: None,
        compatible_models: None,
        description: Some("Drain pump for Bosch dishwashers."),
        embedding: [0.0, 0.0, 0.0, 1.0],
    },
];

/// Migrated in-memory database without rows.
pub async fn empty_pool() -> SqlitePool {
    // A single connection that never expires, otherwise the in-memory
    // database disappears between queries.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

/// In-memory database holding a small appliance-parts catalog with
/// four-dimensional embeddings.
pub async fn seeded_pool() -> SqlitePool {
    let pool = empty_pool().await;

    for fixture in FIXTURES {
        sqlx::query(
            r#"
            INSERT INTO parts (
                sku, name, brand, category, regular_price, sale_price, in_stock,
                stock_status, description, compatible_models, embedding
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(fixture.sku)
        .bind(fixture.name)
        .bind(fixture.brand)
        .bind(fixture.category)
        .bind(fixture.regular_price)
        .bind(fixture.sale_price)
        .bind(fixture.in_stock)
        .bind(fixture.stock_status)
        .bind(fixture.description)
        .bind(fixture.compatible_models)
        .bind(encode_embedding(&fixture.embedding))
        .execute(&pool)
        .await
        .expect("insert fixture");
    }

    pool
}
