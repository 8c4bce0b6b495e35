pub mod bills;
pub mod documents;
pub mod invoice_numbers;
pub mod orders;
pub mod reconciliation;
