pub mod a1;
pub mod auth;
pub mod batch;
pub mod config;
pub mod extractor;
pub mod geocoder;
pub mod sheets;
pub mod workbook;
pub mod writer;
