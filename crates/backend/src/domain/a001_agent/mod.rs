pub mod excel_import;
pub mod repository;
pub mod service;
