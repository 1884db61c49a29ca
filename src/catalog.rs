//! Catalog reconciliation for imported sale rows
//!
//! Maps a report row (code + description) onto a catalog product. The product
//! code is the only deduplication key: a product with the same name but a new
//! code is still created, with a warning. Products created here are assigned
//! to the default supplier, which is looked up or created on every call and
//! never cached between imports.

use anyhow::Result;
use tracing::{info, warn};

use crate::db::{ImportStore, Product, Supplier};

/// Sentinel supplier for products whose real supplier is unknown
pub const DEFAULT_SUPPLIER_NAME: &str = "FORNECEDOR DIVERSOS";

/// Placeholder CNPJ of the default supplier
pub const DEFAULT_SUPPLIER_TAX_ID: &str = "00.000.000/0000-00";

/// Unit of measure assigned to products created from a report
pub const DEFAULT_UNIT_OF_MEASURE: &str = "UN";

/// Get or create the default supplier.
///
/// Two concurrent imports can both miss the lookup; the second insert then
/// fails on the unique `suppliers.name` constraint and the error propagates.
pub fn ensure_default_supplier<S: ImportStore + ?Sized>(store: &S) -> Result<Supplier> {
    if let Some(supplier) = store.find_supplier_by_name(DEFAULT_SUPPLIER_NAME)? {
        return Ok(supplier);
    }

    info!(
        "Default supplier not found. Creating \"{}\"...",
        DEFAULT_SUPPLIER_NAME
    );
    store.insert_supplier(&Supplier {
        id: None,
        name: DEFAULT_SUPPLIER_NAME.to_string(),
        tax_id: Some(DEFAULT_SUPPLIER_TAX_ID.to_string()),
    })
}

/// Resolve a report row to a catalog product, creating it when the code is new
pub fn resolve_product<S: ImportStore + ?Sized>(
    store: &S,
    code: &str,
    description: &str,
) -> Result<Product> {
    if let Some(product) = store.find_product_by_code(code)? {
        return Ok(product);
    }

    info!("Product with code '{}' not found. Creating new product...", code);

    if store.find_product_by_name(description)?.is_some() {
        warn!(
            "Creating product with duplicate name '{}' because code '{}' is new",
            description, code
        );
    }

    let supplier = ensure_default_supplier(store)?;
    let product = store.insert_product(&Product {
        id: None,
        code: Some(code.to_string()),
        name: description.to_string(),
        description: None,
        unit_of_measure: DEFAULT_UNIT_OF_MEASURE.to_string(),
        supplier_id: supplier.id,
    })?;

    info!(
        "New product '{}' (ID: {}) created",
        product.name,
        product.id.unwrap_or_default()
    );
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_rows, open_in_memory, SqliteStore};

    #[test]
    fn test_existing_code_is_reused() {
        let conn = open_in_memory().unwrap();
        let store = SqliteStore::new(&conn);

        let first = resolve_product(&store, "1001", "Banana Prata").unwrap();
        let second = resolve_product(&store, "1001", "Banana Prata Climatizada").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Banana Prata");
        assert_eq!(count_rows(&conn, "products").unwrap(), 1);
    }

    #[test]
    fn test_new_product_gets_defaults() {
        let conn = open_in_memory().unwrap();
        let store = SqliteStore::new(&conn);

        let product = resolve_product(&store, "2002", "Maçã").unwrap();
        let supplier = store
            .find_supplier_by_name(DEFAULT_SUPPLIER_NAME)
            .unwrap()
            .unwrap();

        assert_eq!(product.code.as_deref(), Some("2002"));
        assert_eq!(product.name, "Maçã");
        assert_eq!(product.unit_of_measure, "UN");
        assert_eq!(product.supplier_id, supplier.id);
        assert_eq!(supplier.tax_id.as_deref(), Some(DEFAULT_SUPPLIER_TAX_ID));
    }

    #[test]
    fn test_same_name_with_new_code_creates_another_product() {
        let conn = open_in_memory().unwrap();
        let store = SqliteStore::new(&conn);

        let old = resolve_product(&store, "1001", "Banana Prata").unwrap();
        let new = resolve_product(&store, "1009", "Banana Prata").unwrap();

        assert_ne!(old.id, new.id);
        assert_eq!(count_rows(&conn, "products").unwrap(), 2);
    }

    #[test]
    fn test_default_supplier_is_created_once() {
        let conn = open_in_memory().unwrap();
        let store = SqliteStore::new(&conn);

        let a = ensure_default_supplier(&store).unwrap();
        let b = ensure_default_supplier(&store).unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(count_rows(&conn, "suppliers").unwrap(), 1);
    }

    #[test]
    fn test_existing_default_supplier_is_used() {
        let conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO suppliers (name, tax_id) VALUES (?1, NULL)",
            [DEFAULT_SUPPLIER_NAME],
        )
        .unwrap();
        let store = SqliteStore::new(&conn);

        let product = resolve_product(&store, "5005", "Mamão Formosa").unwrap();
        let supplier = ensure_default_supplier(&store).unwrap();

        assert_eq!(product.supplier_id, supplier.id);
        assert_eq!(supplier.tax_id, None);
        assert_eq!(count_rows(&conn, "suppliers").unwrap(), 1);
    }
}
