//! Общие типы между backend и клиентами API

pub mod domain;
