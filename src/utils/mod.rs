pub mod invoice_link;
pub mod notification;
pub mod phone;
