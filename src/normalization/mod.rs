pub mod identity;
pub mod money;

pub use identity::normalize_name;
pub use money::parse_money;
