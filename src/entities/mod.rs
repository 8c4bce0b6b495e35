pub mod bill_record;
pub mod invoice_counter;
pub mod order;
