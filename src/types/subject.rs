use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attributes::Attributes;

/// The read-only product attributes the engine prices.
///
/// A product cannot exist without a base price; rejecting a missing or
/// malformed price is the job of whoever builds the `Product`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub brand_id: Option<i64>,
    pub price: Decimal,
}

impl Product {
    #[must_use]
    pub fn new(id: i64, price: Decimal) -> Self {
        Self {
            id,
            category_id: None,
            brand_id: None,
            price,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand_id: i64) -> Self {
        self.brand_id = Some(brand_id);
        self
    }
}

/// The read-only customer attributes visible to pricing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub group_code: Option<String>,
}

impl Customer {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            group_id: None,
            group_code: None,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group_id: i64, group_code: &str) -> Self {
        self.group_id = Some(group_id);
        self.group_code = Some(group_code.to_owned());
        self
    }

    #[must_use]
    pub fn with_group_code(mut self, group_code: &str) -> Self {
        self.group_code = Some(group_code.to_owned());
        self
    }
}

/// Everything a rule may look at during one price calculation.
///
/// Borrowed from the caller and built fresh per call; rules never mutate it.
/// The quantity is at least 1: a zero quantity is raised to 1.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    product: &'a Product,
    customer: Option<&'a Customer>,
    quantity: u32,
    extensions: &'a Attributes,
}

impl<'a> EvaluationContext<'a> {
    #[must_use]
    pub fn new(
        product: &'a Product,
        customer: Option<&'a Customer>,
        quantity: u32,
        extensions: &'a Attributes,
    ) -> Self {
        Self {
            product,
            customer,
            quantity: quantity.max(1),
            extensions,
        }
    }

    #[must_use]
    pub fn product(&self) -> &'a Product {
        self.product
    }

    #[must_use]
    pub fn customer(&self) -> Option<&'a Customer> {
        self.customer
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn extensions(&self) -> &'a Attributes {
        self.extensions
    }
}
