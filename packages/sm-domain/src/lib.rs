pub mod skills;
pub mod week;
