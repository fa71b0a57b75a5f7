pub mod aggregate;

pub use aggregate::{CreatePreOrderDto, PreOrder, PreOrderId, PreOrderStatus, UpdatePreOrderDto};
