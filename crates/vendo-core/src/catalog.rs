//! # Product Catalog
//!
//! The products loaded into the machine's slots.
//!
//! The purchase flow only needs two things from a catalog: look a product
//! up by code and take one unit out. That contract is [`ProductCatalog`].
//! [`Catalog`] is the in-memory implementation the machine owns, with the
//! vendor's slot management on top.
//!
//! ## Slots
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Code │ Name            │ Price  │ Qty                                  │
//! │  ─────┼─────────────────┼────────┼────                                  │
//! │  A1   │ Water 500ml     │ 1.00lv │ 10     ◄── at most max quantity      │
//! │  A2   │ Cola 330ml      │ 1.80lv │  0     ◄── out of stock, still slotted│
//! │  ...  │                 │        │                                      │
//! │  (at most slot_limit rows)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::MachineConfig;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_price, validate_product_code, validate_product_name};

// =============================================================================
// Product
// =============================================================================

/// A product loaded into one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Slot code the customer types, stored uppercase.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Sale price.
    pub price: Money,

    /// Units left in the slot.
    pub quantity: u32,
}

impl Product {
    pub fn new(code: &str, name: &str, price: Money, quantity: u32) -> Self {
        Product {
            code: normalize_code(code),
            name: name.trim().to_string(),
            price,
            quantity,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Canonical form of a customer- or vendor-typed code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

// =============================================================================
// ProductCatalog contract
// =============================================================================

/// What a purchase needs from the product store.
pub trait ProductCatalog {
    /// Looks a product up by code.
    ///
    /// ## Errors
    /// `ProductNotFound` if no slot has this code.
    fn get_by_code(&self, code: &str) -> CoreResult<Product>;

    /// Takes one unit out of a slot and returns the units left.
    ///
    /// ## Errors
    /// - `ProductNotFound` if no slot has this code
    /// - `OutOfStock` if the slot is empty
    fn decrement_stock(&mut self, code: &str) -> CoreResult<u32>;
}

// =============================================================================
// Catalog
// =============================================================================

/// In-memory catalog, ordered by code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    products: BTreeMap<String, Product>,
    slot_limit: usize,
    max_quantity: u32,
}

impl Catalog {
    /// Creates an empty catalog with the configured limits.
    pub fn new(config: &MachineConfig) -> Self {
        Catalog {
            products: BTreeMap::new(),
            slot_limit: config.slot_limit,
            max_quantity: config.max_product_quantity,
        }
    }

    /// Builds a catalog from stored products.
    ///
    /// Stored rows are trusted for price and name; codes must still be
    /// unique and fit the slot limit.
    pub fn with_products(
        config: &MachineConfig,
        products: impl IntoIterator<Item = Product>,
    ) -> CoreResult<Self> {
        let mut catalog = Catalog::new(config);
        for product in products {
            let product = Product::new(&product.code, &product.name, product.price, product.quantity);
            if catalog.products.contains_key(&product.code) {
                return Err(CoreError::DuplicateProduct(product.code));
            }
            if !catalog.can_add() {
                return Err(CoreError::SlotLimitReached {
                    limit: catalog.slot_limit,
                });
            }
            catalog.products.insert(product.code.clone(), product);
        }
        Ok(catalog)
    }

    /// All products, ordered by code.
    pub fn list(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }

    /// All slot codes, ordered.
    pub fn codes(&self) -> Vec<String> {
        self.products.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn slot_limit(&self) -> usize {
        self.slot_limit
    }

    pub fn max_quantity(&self) -> u32 {
        self.max_quantity
    }

    /// True while a free slot remains.
    pub fn can_add(&self) -> bool {
        self.products.len() < self.slot_limit
    }

    /// Loads a new product into a free slot.
    pub fn add(&mut self, product: Product) -> CoreResult<&Product> {
        validate_product_code(&product.code)?;
        validate_product_name(&product.name)?;
        validate_price(product.price)?;
        self.check_quantity(product.quantity)?;

        let product = Product::new(&product.code, &product.name, product.price, product.quantity);

        if self.products.contains_key(&product.code) {
            return Err(CoreError::DuplicateProduct(product.code));
        }
        if !self.can_add() {
            return Err(CoreError::SlotLimitReached {
                limit: self.slot_limit,
            });
        }

        info!(code = %product.code, name = %product.name, price = %product.price, "Product added");
        let code = product.code.clone();
        let product: &Product = self.products.entry(code).or_insert(product);
        Ok(product)
    }

    /// Empties a slot and returns what was in it.
    pub fn remove(&mut self, code: &str) -> CoreResult<Product> {
        let code = normalize_code(code);
        let product = self
            .products
            .remove(&code)
            .ok_or_else(|| CoreError::ProductNotFound(code.clone()))?;

        info!(code = %product.code, "Product removed");
        Ok(product)
    }

    /// Changes a product's price.
    pub fn update_price(&mut self, code: &str, price: Money) -> CoreResult<&Product> {
        validate_price(price)?;
        let product = self.get_mut(code)?;
        product.price = price;

        info!(code = %product.code, %price, "Price updated");
        Ok(&*product)
    }

    /// Restocks a slot to an absolute quantity.
    pub fn update_quantity(&mut self, code: &str, quantity: u32) -> CoreResult<&Product> {
        self.check_quantity(quantity)?;
        let product = self.get_mut(code)?;
        product.quantity = quantity;

        info!(code = %product.code, quantity, "Quantity updated");
        Ok(&*product)
    }

    fn check_quantity(&self, quantity: u32) -> CoreResult<()> {
        if quantity > self.max_quantity {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: self.max_quantity as u64,
            }
            .into());
        }
        Ok(())
    }

    fn get_mut(&mut self, code: &str) -> CoreResult<&mut Product> {
        let code = normalize_code(code);
        self.products
            .get_mut(&code)
            .ok_or(CoreError::ProductNotFound(code))
    }
}

impl ProductCatalog for Catalog {
    fn get_by_code(&self, code: &str) -> CoreResult<Product> {
        let code = normalize_code(code);
        self.products
            .get(&code)
            .cloned()
            .ok_or(CoreError::ProductNotFound(code))
    }

    fn decrement_stock(&mut self, code: &str) -> CoreResult<u32> {
        let product = self.get_mut(code)?;
        if product.quantity == 0 {
            return Err(CoreError::OutOfStock {
                code: product.code.clone(),
            });
        }
        product.quantity -= 1;
        Ok(product.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::with_products(
            &MachineConfig::default(),
            vec![
                Product::new("A1", "Water", Money::from_stotinki(100), 5),
                Product::new("A2", "Cola", Money::from_stotinki(180), 0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.get_by_code(" a1 ").unwrap().name, "Water");
        assert_eq!(
            catalog.get_by_code("Z9"),
            Err(CoreError::ProductNotFound("Z9".to_string()))
        );
    }

    #[test]
    fn test_decrement_stock() {
        let mut catalog = catalog();
        assert_eq!(catalog.decrement_stock("A1").unwrap(), 4);
        assert_eq!(
            catalog.decrement_stock("A2"),
            Err(CoreError::OutOfStock {
                code: "A2".to_string()
            })
        );
        assert!(matches!(
            catalog.decrement_stock("B1"),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_add_rejects_duplicates_and_bad_input() {
        let mut catalog = catalog();
        let dup = Product::new("a1", "Other", Money::from_stotinki(50), 1);
        assert_eq!(
            catalog.add(dup).unwrap_err(),
            CoreError::DuplicateProduct("A1".to_string())
        );

        let too_many = Product::new("B1", "Chips", Money::from_stotinki(150), 11);
        assert!(matches!(
            catalog.add(too_many),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let free = Product::new("B1", "Chips", Money::zero(), 1);
        assert!(catalog.add(free).is_err());

        let ok = Product::new("b1", "Chips", Money::from_stotinki(150), 10);
        assert_eq!(catalog.add(ok).unwrap().code, "B1");
        assert_eq!(catalog.codes(), vec!["A1", "A2", "B1"]);
    }

    #[test]
    fn test_slot_limit() {
        let config = MachineConfig {
            slot_limit: 2,
            ..MachineConfig::default()
        };
        let mut catalog = Catalog::new(&config);
        catalog
            .add(Product::new("A1", "Water", Money::from_stotinki(100), 1))
            .unwrap();
        catalog
            .add(Product::new("A2", "Cola", Money::from_stotinki(100), 1))
            .unwrap();

        assert!(!catalog.can_add());
        assert_eq!(
            catalog
                .add(Product::new("A3", "Tea", Money::from_stotinki(100), 1))
                .unwrap_err(),
            CoreError::SlotLimitReached { limit: 2 }
        );
    }

    #[test]
    fn test_update_and_remove() {
        let mut catalog = catalog();
        catalog
            .update_price("A1", Money::from_stotinki(120))
            .unwrap();
        catalog.update_quantity("A2", 7).unwrap();
        assert_eq!(catalog.get_by_code("A1").unwrap().price.stotinki(), 120);
        assert_eq!(catalog.get_by_code("A2").unwrap().quantity, 7);

        assert!(catalog.update_quantity("A2", 11).is_err());

        let removed = catalog.remove("a2").unwrap();
        assert_eq!(removed.name, "Cola");
        assert_eq!(catalog.len(), 1);
        assert!(catalog.remove("A2").is_err());
    }
}
