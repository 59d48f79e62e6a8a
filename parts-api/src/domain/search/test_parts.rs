//! Part fixtures shared by the search tests.

use crate::domain::models::Part;

pub fn part(sku: &str, name: &str, brand: &str) -> Part {
    Part {
        sku: sku.to_string(),
        name: name.to_string(),
        brand: Some(brand.to_string()),
        category: None,
        subcategory: None,
        regular_price: Some(50.0),
        sale_price: None,
        discount_percent: None,
        in_stock: true,
        stock_status: None,
        description: None,
        compatible_models: Default::default(),
        specifications: None,
        product_url: None,
        main_image_url: None,
        scraped_at: None,
    }
}
