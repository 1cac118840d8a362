//! # Catalog Repository
//!
//! Thin persistence for the reference tables: products, customers,
//! suppliers. These carry no derived computation; the engine only needs
//! identity, names, default prices and the soft-delete flag.
//!
//! Referenced rows are never hard-deleted. Every movement and sale line
//! points at a product id, so removal is `is_active = 0`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use coldstore_core::{Customer, Product, Supplier};

// =============================================================================
// Input Types
// =============================================================================

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub default_cost_cents: i64,
    pub default_price_cents: i64,
    pub supplier_id: Option<String>,
}

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub credit_limit_cents: i64,
}

/// Input for creating a supplier.
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Creates a product.
    pub async fn create_product(&self, input: NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            category: input.category,
            default_cost_cents: input.default_cost_cents,
            default_price_cents: input.default_price_cents,
            supplier_id: input.supplier_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, category, default_cost_cents, default_price_cents,
                 supplier_id, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.default_cost_cents)
        .bind(product.default_price_cents)
        .bind(&product.supplier_id)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Fetches a product by id.
    pub async fn get_product(&self, id: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, default_cost_cents, default_price_cents,
                   supplier_id, is_active, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists active products by name.
    pub async fn list_products(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, default_cost_cents, default_price_cents,
                   supplier_id, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's default cost and selling price.
    ///
    /// Catalog prices only affect future margin estimation; the FIFO cost
    /// frozen on existing sale lines is untouched.
    pub async fn update_product_prices(
        &self,
        id: &str,
        default_cost_cents: i64,
        default_price_cents: i64,
    ) -> DbResult<Product> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET default_cost_cents = ?, default_price_cents = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(default_cost_cents)
        .bind(default_price_cents)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        self.get_product(id).await
    }

    /// Soft-deletes a product.
    pub async fn deactivate_product(&self, id: &str) -> DbResult<()> {
        soft_delete(&self.pool, "products", "Product", id).await
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    /// Creates a customer.
    pub async fn create_customer(&self, input: NewCustomer) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            address: input.address,
            credit_limit_cents: input.credit_limit_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers
                (id, name, phone, email, address, credit_limit_cents,
                 is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.credit_limit_cents)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(customer_id = %customer.id, name = %customer.name, "Customer created");
        Ok(customer)
    }

    /// Fetches a customer by id.
    pub async fn get_customer(&self, id: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, address, credit_limit_cents,
                   is_active, created_at, updated_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Lists active customers by name.
    pub async fn list_customers(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, address, credit_limit_cents,
                   is_active, created_at, updated_at
            FROM customers
            WHERE is_active = 1
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Soft-deletes a customer.
    pub async fn deactivate_customer(&self, id: &str) -> DbResult<()> {
        soft_delete(&self.pool, "customers", "Customer", id).await
    }

    // -------------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------------

    /// Creates a supplier.
    pub async fn create_supplier(&self, input: NewSupplier) -> DbResult<Supplier> {
        let now = Utc::now();
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, phone, email, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(supplier_id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    /// Lists active suppliers by name.
    pub async fn list_suppliers(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, phone, email, is_active, created_at, updated_at
            FROM suppliers
            WHERE is_active = 1
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Soft-deletes a supplier.
    pub async fn deactivate_supplier(&self, id: &str) -> DbResult<()> {
        soft_delete(&self.pool, "suppliers", "Supplier", id).await
    }
}

async fn soft_delete(pool: &SqlitePool, table: &str, entity: &str, id: &str) -> DbResult<()> {
    let sql = format!("UPDATE {table} SET is_active = 0, updated_at = ? WHERE id = ?");
    let result = sqlx::query(&sql)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(entity, id));
    }
    debug!(entity, id, "Soft-deleted");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
