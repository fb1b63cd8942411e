// 👤 Customer & Region entities

use serde::{Deserialize, Serialize};

// ============================================================================
// CUSTOMER
// ============================================================================

/// Customer - created at onboarding, never mutated by analytics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,

    pub name: String,

    /// A customer belongs to at most one region
    #[serde(default)]
    pub region_id: Option<i64>,
}

impl Customer {
    pub fn new(customer_id: i64, name: &str) -> Self {
        Customer {
            customer_id,
            name: name.to_string(),
            region_id: None,
        }
    }

    pub fn in_region(mut self, region_id: i64) -> Self {
        self.region_id = Some(region_id);
        self
    }
}

// ============================================================================
// REGION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_id: i64,
    pub region_name: String,
}

impl Region {
    pub fn new(region_id: i64, region_name: &str) -> Self {
        Region {
            region_id,
            region_name: region_name.to_string(),
        }
    }
}
