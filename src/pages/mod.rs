pub mod coming_soon;
pub mod notify_me;
pub mod pre_order;
pub mod reports;
pub mod sold_out;
