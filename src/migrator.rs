use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_create_orders_table::Migration),
            Box::new(m20260601_000002_create_bill_records_table::Migration),
            Box::new(m20260601_000003_create_invoice_counters_table::Migration),
        ]
    }
}

mod m20260601_000001_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260601_000001_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(
                            ColumnDef::new(Orders::GatewayOrderId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(Orders::Amount).decimal().not_null())
                        .col(ColumnDef::new(Orders::Subtotal).decimal().null())
                        .col(ColumnDef::new(Orders::Discount).decimal().null())
                        .col(ColumnDef::new(Orders::DiscountType).string().null())
                        .col(ColumnDef::new(Orders::Tax).decimal().null())
                        .col(ColumnDef::new(Orders::TaxRate).decimal().null())
                        .col(
                            ColumnDef::new(Orders::Currency)
                                .string()
                                .not_null()
                                .default("INR"),
                        )
                        .col(ColumnDef::new(Orders::Items).json().not_null())
                        .col(ColumnDef::new(Orders::ProjectIds).json().not_null())
                        .col(ColumnDef::new(Orders::GatewayPaymentId).string().null())
                        .col(ColumnDef::new(Orders::GatewaySignature).string().null())
                        .col(ColumnDef::new(Orders::PaidAt).timestamp_with_time_zone().null())
                        .col(ColumnDef::new(Orders::InvoiceNumber).string().null())
                        .col(ColumnDef::new(Orders::InvoiceDate).timestamp_with_time_zone().null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            // Invoice groups are reconstructed by this lookup at render time
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_invoice_number")
                        .table(Orders::Table)
                        .col(Orders::InvoiceNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        UserId,
        GatewayOrderId,
        Status,
        Amount,
        Subtotal,
        Discount,
        DiscountType,
        Tax,
        TaxRate,
        Currency,
        Items,
        ProjectIds,
        GatewayPaymentId,
        GatewaySignature,
        PaidAt,
        InvoiceNumber,
        InvoiceDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260601_000002_create_bill_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260601_000002_create_bill_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BillRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BillRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BillRecords::ProjectId).uuid().not_null())
                        .col(ColumnDef::new(BillRecords::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(BillRecords::DocumentType)
                                .string()
                                .not_null()
                                .default("bill"),
                        )
                        .col(ColumnDef::new(BillRecords::FileName).string().not_null())
                        .col(ColumnDef::new(BillRecords::Amount).decimal().not_null())
                        .col(
                            ColumnDef::new(BillRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bill_records_project_id")
                        .table(BillRecords::Table)
                        .col(BillRecords::ProjectId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BillRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BillRecords {
        Table,
        Id,
        ProjectId,
        OrderId,
        DocumentType,
        FileName,
        Amount,
        CreatedAt,
    }
}

mod m20260601_000003_create_invoice_counters_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260601_000003_create_invoice_counters_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InvoiceCounters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceCounters::Period)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceCounters::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceCounters::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InvoiceCounters {
        Table,
        Period,
        LastValue,
    }
}
