//! Seeds a local database with demo data: a supplier, a small frozen-goods
//! catalog, two customers, opening stock, one sale of each payment type and
//! a credit collection. Prints the resulting dashboard summary.
//!
//! ```sh
//! cargo run --bin seed
//! RUST_LOG=debug cargo run --bin seed -- ./demo.db
//! ```

use coldstore_db::{
    CreateSale, Database, DbConfig, NewCollection, NewCustomer, NewMovement, NewProduct,
    NewSupplier, SaleLine, StoreResult,
};
use coldstore_core::PaymentType;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> StoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./coldstore.db".to_string());
    info!(path = %path, "Seeding demo data");

    let db = Database::new(DbConfig::new(&path)).await?;
    let catalog = db.catalog();

    let supplier = catalog
        .create_supplier(NewSupplier {
            name: "Ocean Fresh Ltd".to_string(),
            phone: Some("+233 20 000 0000".to_string()),
            email: Some("orders@oceanfresh.example".to_string()),
        })
        .await?;

    let tilapia = catalog
        .create_product(NewProduct {
            name: "Frozen Tilapia (1kg)".to_string(),
            category: Some("fish".to_string()),
            default_cost_cents: 2200,
            default_price_cents: 3500,
            supplier_id: Some(supplier.id.clone()),
        })
        .await?;
    let chicken = catalog
        .create_product(NewProduct {
            name: "Frozen Chicken (full)".to_string(),
            category: Some("poultry".to_string()),
            default_cost_cents: 4500,
            default_price_cents: 6500,
            supplier_id: Some(supplier.id.clone()),
        })
        .await?;

    let ama = catalog
        .create_customer(NewCustomer {
            name: "Ama Serwaa".to_string(),
            phone: Some("+233 24 111 1111".to_string()),
            email: None,
            address: Some("Makola Market, stall 14".to_string()),
            credit_limit_cents: 50_000,
        })
        .await?;
    catalog
        .create_customer(NewCustomer {
            name: "Kofi Mensah".to_string(),
            phone: Some("+233 24 222 2222".to_string()),
            email: None,
            address: None,
            credit_limit_cents: 20_000,
        })
        .await?;

    // Opening stock, two receipts per product so sales blend FIFO batches
    let movements = db.movements();
    for (product, first_cost, second_cost) in
        [(&tilapia, 2000, 2400), (&chicken, 4200, 4600)]
    {
        let mut receipt = NewMovement::received(&product.id, 40, first_cost);
        receipt.supplier_id = Some(supplier.id.clone());
        movements.record(receipt).await?;

        let mut receipt = NewMovement::received(&product.id, 30, second_cost);
        receipt.supplier_id = Some(supplier.id.clone());
        movements.record(receipt).await?;
    }

    let sales = db.sales();
    let cash = sales
        .create_sale(CreateSale {
            customer_id: None,
            customer_name: Some("Walk-in".to_string()),
            items: vec![SaleLine {
                product_id: tilapia.id.clone(),
                quantity: 6,
                unit_price_cents: 3500,
            }],
            payment_type: PaymentType::Cash,
            amount_paid_cents: 21_000,
            actor_id: "seed".to_string(),
            created_at: None,
        })
        .await?;
    info!(transaction_id = %cash.sale.transaction_id, "Cash sale");

    let credit = sales
        .create_sale(CreateSale {
            customer_id: Some(ama.id.clone()),
            customer_name: None,
            items: vec![SaleLine {
                product_id: chicken.id.clone(),
                quantity: 4,
                unit_price_cents: 6500,
            }],
            payment_type: PaymentType::Credit,
            amount_paid_cents: 0,
            actor_id: "seed".to_string(),
            created_at: None,
        })
        .await?;
    info!(transaction_id = %credit.sale.transaction_id, "Credit sale");

    let partial = sales
        .create_sale(CreateSale {
            customer_id: Some(ama.id.clone()),
            customer_name: None,
            items: vec![
                SaleLine {
                    product_id: tilapia.id.clone(),
                    quantity: 10,
                    unit_price_cents: 3400,
                },
                SaleLine {
                    product_id: chicken.id.clone(),
                    quantity: 2,
                    unit_price_cents: 6500,
                },
            ],
            payment_type: PaymentType::Partial,
            amount_paid_cents: 20_000,
            actor_id: "seed".to_string(),
            created_at: None,
        })
        .await?;
    info!(
        transaction_id = %partial.sale.transaction_id,
        owed_cents = partial.sale.amount_owed_cents(),
        "Partial sale"
    );

    let receipt = db
        .credit()
        .record_collection(NewCollection {
            customer_id: ama.id.clone(),
            amount_cents: 10_000,
            notes: Some("first installment".to_string()),
            created_at: None,
        })
        .await?;
    info!(debt_left_cents = receipt.debt_left_cents, "Collection recorded");

    let dashboard = db.reports().dashboard_summary().await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&dashboard).expect("dashboard serializes")
    );

    db.close().await;
    Ok(())
}
