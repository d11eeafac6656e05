//! Request models validated against the reference sets.

use crate::{
    validate::{
        category_exists, min_length, product_code_unique, required, supplier_exists,
        FieldErrors, Validate,
    },
    ValidationStore,
};

/// A request to create a product.
///
/// Valid when:
///
/// - `product_name` is present and at least 2 characters long,
/// - `product_code` is present and not in the `ProductCodes` set,
/// - `category` is present and in the `Categories` set,
/// - `supplier_id` is in the `SupplierIds` set.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateProductRequest {
    pub product_code: String,
    pub product_name: String,
    pub category: String,
    pub unit_price: f64,
    pub quantity: i32,
    pub in_stock: bool,
    pub description: Option<String>,
    pub supplier_id: i32,
}

impl CreateProductRequest {
    pub fn new(product_code: &str, product_name: &str, category: &str, supplier_id: i32) -> Self {
        Self {
            product_code: product_code.to_string(),
            product_name: product_name.to_string(),
            category: category.to_string(),
            unit_price: 0.0,
            quantity: 0,
            in_stock: true,
            description: None,
            supplier_id,
        }
    }
}

impl Validate for CreateProductRequest {
    fn validate(&self, store: &ValidationStore) -> FieldErrors {
        // A member reports its first failure only.
        let checks = [
            required("product_name", &self.product_name)
                .and_then(|_| min_length("product_name", &self.product_name, 2)),
            required("product_code", &self.product_code).and_then(|_| {
                product_code_unique().check(store, "product_code", Some(&self.product_code))
            }),
            required("category", &self.category)
                .and_then(|_| category_exists().check(store, "category", Some(&self.category))),
            supplier_exists().check(store, "supplier_id", Some(&self.supplier_id)),
        ];

        checks.into_iter().filter_map(Result::err).collect()
    }
}
