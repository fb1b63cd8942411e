// 📦 Product entity

use serde::{Deserialize, Serialize};

/// Product - reference entity carrying its category label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
}

impl Product {
    pub fn new(product_id: i64, product_name: &str, category: &str) -> Self {
        Product {
            product_id,
            product_name: product_name.to_string(),
            category: category.to_string(),
        }
    }
}
