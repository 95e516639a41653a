pub mod integrate;
pub mod status;
