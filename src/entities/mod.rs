pub mod activity_log;
pub mod client;
pub mod invoice_request;
pub mod lead;
pub mod property;
pub mod property_image;
