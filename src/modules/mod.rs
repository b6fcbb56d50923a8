pub mod notification;

mod router;
pub use router::get_router;
