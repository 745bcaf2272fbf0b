pub mod memory;
pub mod pg;
pub mod record;
pub mod store;
