use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::commands::inventory::use_parts_command::{UsageLineView, UsageRecordView};
use crate::commands::partrequests::submit_part_request_command::{
    PartRequestView, RequestLineView, RequestedLine,
};
use crate::commands::procurement::create_supplier_order_command::{
    AssignmentView, ConsolidationInfo, DeliveryAddressView, OrderItemView, OrderPricingView,
    OrderPriority, SupplierOrderView,
};
use crate::errors::{ErrorResponse, UnavailablePart};
use crate::handlers;
use crate::services::catalog::PartView;
use crate::services::inventory::{InventoryEntryView, InventoryStatistics, InventoryView};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fieldstock API",
        version = "1.0.0",
        description = r#"
Personal parts-inventory and supplier-order consolidation API for a field
appliance-repair operation.

Technicians record the parts they install on jobs against their personal
van stock; the office consolidates approved part requests into supplier
orders with per-technician attribution and delivery routing.

All endpoints require a bearer token from one of the session stores:

```
Authorization: Bearer <token>
```
        "#
    ),
    paths(
        handlers::inventory::use_parts,
        handlers::inventory::get_personal_inventory,
        handlers::inventory::list_usage,
        handlers::part_requests::submit_part_request,
        handlers::part_requests::list_part_requests,
        handlers::part_requests::get_part_request,
        handlers::part_requests::approve_part_request,
        handlers::part_requests::reject_part_request,
        handlers::supplier_orders::create_supplier_order,
        handlers::supplier_orders::get_supplier_order,
        handlers::supplier_orders::list_supplier_orders,
        handlers::parts::get_part,
    ),
    components(schemas(
        handlers::inventory::UsePartsRequest,
        handlers::inventory::UsePartsResponse,
        handlers::part_requests::SubmitPartRequestRequest,
        handlers::part_requests::RejectPartRequestRequest,
        handlers::supplier_orders::CreateSupplierOrderRequest,
        handlers::supplier_orders::CreateSupplierOrderResponse,
        UsageRecordView,
        UsageLineView,
        InventoryView,
        InventoryEntryView,
        InventoryStatistics,
        PartRequestView,
        RequestLineView,
        RequestedLine,
        SupplierOrderView,
        OrderItemView,
        AssignmentView,
        DeliveryAddressView,
        OrderPricingView,
        OrderPriority,
        ConsolidationInfo,
        PartView,
        ErrorResponse,
        UnavailablePart,
        crate::entities::part_request::PartRequestStatus,
        crate::entities::supplier_order::SupplierOrderStatus,
        crate::entities::supplier_order::DeliveryMethod,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "inventory", description = "Personal inventory and usage ledger"),
        (name = "part-requests", description = "Part request lifecycle"),
        (name = "supplier-orders", description = "Supplier order consolidation"),
        (name = "parts", description = "Parts catalog"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
