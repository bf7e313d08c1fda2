pub mod create_supplier_order_command;

pub use create_supplier_order_command::{
    ConsolidationInfo, CreateSupplierOrderCommand, OrderPriority, SupplierOrderView,
};
