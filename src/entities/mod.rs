pub mod employee;
pub mod employee_session;
pub mod notification;
pub mod part;
pub mod part_request;
pub mod part_request_line;
pub mod personal_inventory_entry;
pub mod supplier;
pub mod supplier_order;
pub mod supplier_order_item;
pub mod technician_session;
pub mod usage_line;
pub mod usage_record;
