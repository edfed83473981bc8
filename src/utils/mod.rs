pub mod geocode;
pub mod jwt;
