//! Hortifruti - produce retailer back-office
//!
//! This library ingests the point-of-sale sales report (PDF): it extracts the
//! sale rows, reconciles them with the product catalog and stores the sales of
//! each report atomically, keeping an import history.

pub mod catalog;
pub mod db;
pub mod error;
pub mod importers;
pub mod ingest;
pub mod utils;
