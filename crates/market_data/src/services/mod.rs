pub mod price_service;

pub use price_service::PriceService;
