use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_reference_tables::Migration),
            Box::new(m20240301_000002_create_session_tables::Migration),
            Box::new(m20240301_000003_create_inventory_tables::Migration),
            Box::new(m20240301_000004_create_procurement_tables::Migration),
            Box::new(m20240301_000005_create_notifications_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_reference_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Parts::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Parts::Name).string().not_null())
                        .col(ColumnDef::new(Parts::PartNumber).string().not_null())
                        .col(ColumnDef::new(Parts::UnitPrice).decimal().null())
                        .col(ColumnDef::new(Parts::Pricing).json().null())
                        .col(ColumnDef::new(Parts::WarrantyMonths).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Employees::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Employees::Name).string().not_null())
                        .col(ColumnDef::new(Employees::Role).string().not_null())
                        .col(ColumnDef::new(Employees::DeliveryPoint).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::ContactEmail).string().not_null())
                        .col(
                            ColumnDef::new(Suppliers::FreeShippingThreshold)
                                .decimal()
                                .not_null()
                                .default(500),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Parts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Parts {
        Table,
        Id,
        Name,
        PartNumber,
        UnitPrice,
        Pricing,
        WarrantyMonths,
    }

    #[derive(DeriveIden)]
    pub(super) enum Employees {
        Table,
        Id,
        Name,
        Role,
        DeliveryPoint,
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        ContactEmail,
        FreeShippingThreshold,
    }
}

mod m20240301_000002_create_session_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_session_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TechnicianSessions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TechnicianSessions::Token)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TechnicianSessions::EmployeeId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TechnicianSessions::ExpiresAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TechnicianSessions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EmployeeSessions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EmployeeSessions::Token)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EmployeeSessions::EmployeeId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EmployeeSessions::ExpiresAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EmployeeSessions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EmployeeSessions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TechnicianSessions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TechnicianSessions {
        Table,
        Token,
        EmployeeId,
        ExpiresAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum EmployeeSessions {
        Table,
        Token,
        EmployeeId,
        ExpiresAt,
        CreatedAt,
    }
}

mod m20240301_000003_create_inventory_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PersonalInventoryEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PersonalInventoryEntries::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PersonalInventoryEntries::EmployeeId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PersonalInventoryEntries::PartId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PersonalInventoryEntries::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PersonalInventoryEntries::LastUsed)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PersonalInventoryEntries::Location)
                                .string()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One stock line per (technician, part)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_personal_inventory_employee_part")
                        .table(PersonalInventoryEntries::Table)
                        .col(PersonalInventoryEntries::EmployeeId)
                        .col(PersonalInventoryEntries::PartId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UsageRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UsageRecords::UsageId)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UsageRecords::EmployeeId).string().not_null())
                        .col(ColumnDef::new(UsageRecords::OrderId).string().not_null())
                        .col(
                            ColumnDef::new(UsageRecords::UsageDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UsageRecords::TotalValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(UsageRecords::InvoiceId).string().null())
                        .col(ColumnDef::new(UsageRecords::CustomerInfo).json().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_usage_records_employee_id")
                        .table(UsageRecords::Table)
                        .col(UsageRecords::EmployeeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UsageLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UsageLines::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UsageLines::UsageId).string().not_null())
                        .col(ColumnDef::new(UsageLines::PartId).string().not_null())
                        .col(ColumnDef::new(UsageLines::PartName).string().not_null())
                        .col(ColumnDef::new(UsageLines::PartNumber).string().not_null())
                        .col(ColumnDef::new(UsageLines::Quantity).integer().not_null())
                        .col(ColumnDef::new(UsageLines::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(UsageLines::TotalPrice).decimal().not_null())
                        .col(
                            ColumnDef::new(UsageLines::InstallationNotes)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(UsageLines::WarrantyMonths).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_usage_lines_usage_id")
                        .table(UsageLines::Table)
                        .col(UsageLines::UsageId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UsageLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UsageRecords::Table).to_owned())
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(PersonalInventoryEntries::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PersonalInventoryEntries {
        Table,
        Id,
        EmployeeId,
        PartId,
        Quantity,
        LastUsed,
        Location,
    }

    #[derive(DeriveIden)]
    enum UsageRecords {
        Table,
        UsageId,
        EmployeeId,
        OrderId,
        UsageDate,
        TotalValue,
        InvoiceId,
        CustomerInfo,
    }

    #[derive(DeriveIden)]
    enum UsageLines {
        Table,
        Id,
        UsageId,
        PartId,
        PartName,
        PartNumber,
        Quantity,
        UnitPrice,
        TotalPrice,
        InstallationNotes,
        WarrantyMonths,
    }
}

mod m20240301_000004_create_procurement_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PartRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PartRequests::RequestId)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartRequests::RequestedFor)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartRequests::RequestedForName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PartRequests::Status).string().not_null())
                        .col(
                            ColumnDef::new(PartRequests::SupplierOrderId)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(PartRequests::ConsolidatedWith).json().null())
                        .col(
                            ColumnDef::new(PartRequests::RejectionReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PartRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PartRequests::ApprovedAt).timestamp().null())
                        .col(ColumnDef::new(PartRequests::RejectedAt).timestamp().null())
                        .col(ColumnDef::new(PartRequests::OrderedAt).timestamp().null())
                        .col(ColumnDef::new(PartRequests::DeliveredAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_part_requests_status")
                        .table(PartRequests::Table)
                        .col(PartRequests::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PartRequestLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PartRequestLines::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PartRequestLines::RequestId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PartRequestLines::PartId).string().not_null())
                        .col(
                            ColumnDef::new(PartRequestLines::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierOrders::OrderId)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::SupplierId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierOrders::CreatedBy).string().not_null())
                        .col(
                            ColumnDef::new(SupplierOrders::PartRequestIds)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::DeliveryMethod)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::DeliveryAddresses)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::Subtotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::ShippingCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::ExpressCharge)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::Total)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::Savings)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(SupplierOrders::Priority).string().not_null())
                        .col(ColumnDef::new(SupplierOrders::Notes).string().null())
                        .col(ColumnDef::new(SupplierOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(SupplierOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supplier_orders_status")
                        .table(SupplierOrders::Table)
                        .col(SupplierOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierOrderItems::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::OrderId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::PartId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::PartName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::TotalQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::AssignTo)
                                .json()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplierOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SupplierOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PartRequestLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PartRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PartRequests {
        Table,
        RequestId,
        RequestedFor,
        RequestedForName,
        Status,
        SupplierOrderId,
        ConsolidatedWith,
        RejectionReason,
        CreatedAt,
        ApprovedAt,
        RejectedAt,
        OrderedAt,
        DeliveredAt,
    }

    #[derive(DeriveIden)]
    enum PartRequestLines {
        Table,
        Id,
        RequestId,
        PartId,
        Quantity,
    }

    #[derive(DeriveIden)]
    enum SupplierOrders {
        Table,
        OrderId,
        SupplierId,
        CreatedBy,
        PartRequestIds,
        DeliveryMethod,
        DeliveryAddresses,
        Subtotal,
        ShippingCost,
        ExpressCharge,
        Total,
        Savings,
        Priority,
        Notes,
        Status,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplierOrderItems {
        Table,
        Id,
        OrderId,
        PartId,
        PartName,
        UnitPrice,
        TotalQuantity,
        AssignTo,
    }
}

mod m20240301_000005_create_notifications_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_notifications_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::UserId).string().null())
                        .col(ColumnDef::new(Notifications::Title).string().not_null())
                        .col(ColumnDef::new(Notifications::Message).string().not_null())
                        .col(ColumnDef::new(Notifications::Kind).string().not_null())
                        .col(ColumnDef::new(Notifications::Link).string().null())
                        .col(
                            ColumnDef::new(Notifications::Read)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        UserId,
        Title,
        Message,
        Kind,
        Link,
        Read,
        CreatedAt,
    }
}
