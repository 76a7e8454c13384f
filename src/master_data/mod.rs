//! Read-through Master-Data catalog (spec.md §1 Out-of-scope: "Master-Data
//! CRUD"). Only the lookups the Cart Engine needs — item pricing, tax
//! rules, payment methods — are implemented here.

pub mod models;
pub mod repository;
pub mod rounding;

pub use models::{Item, PaymentMethod, RoundMethod, TaxRule, TaxType};
pub use repository::MasterDataRepository;
