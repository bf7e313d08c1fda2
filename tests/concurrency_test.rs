mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{TestApp, TECH_ID};
use fieldstock_api::commands::inventory::use_parts_command::RequestedPart;
use fieldstock_api::commands::inventory::UsePartsCommand;
use fieldstock_api::entities::{personal_inventory_entry, usage_record};
use fieldstock_api::errors::ServiceError;

#[tokio::test]
async fn concurrent_usage_never_oversells_a_part() {
    let app = TestApp::new().await;
    app.seed_part("P100", "Door gasket", dec!(30)).await;
    app.seed_inventory(TECH_ID, "P100", 5).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let inventory = app.state.services.inventory.clone();
        handles.push(tokio::spawn(async move {
            inventory
                .use_parts(UsePartsCommand {
                    employee_id: TECH_ID.to_string(),
                    order_id: format!("ZL-{}", i),
                    parts: vec![RequestedPart {
                        part_id: "P100".to_string(),
                        quantity: 1,
                        installation_notes: None,
                    }],
                    add_to_invoice: false,
                    invoice_id: None,
                    customer_info: None,
                    warranty_months: None,
                })
                .await
        }));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => succeeded += 1,
            Err(ServiceError::InsufficientStock { unavailable }) => {
                assert_eq!(unavailable.len(), 1);
                assert_eq!(unavailable[0].available, 0);
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(succeeded, 5);
    assert_eq!(rejected, 5);

    // The stock line was removed when it reached zero; five ledger records exist.
    let remaining = personal_inventory_entry::Entity::find()
        .filter(personal_inventory_entry::Column::EmployeeId.eq(TECH_ID))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert!(remaining.is_empty());

    let recorded = usage_record::Entity::find()
        .filter(usage_record::Column::EmployeeId.eq(TECH_ID))
        .count(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(recorded, 5);
}

#[tokio::test]
async fn interleaved_batches_settle_to_a_consistent_total() {
    let app = TestApp::new().await;
    app.seed_part("P100", "Door gasket", dec!(30)).await;
    app.seed_part("P200", "Drain pump", dec!(12.5)).await;
    app.seed_inventory(TECH_ID, "P100", 8).await;
    app.seed_inventory(TECH_ID, "P200", 8).await;

    let mut handles = Vec::new();
    for i in 0..4 {
        let inventory = app.state.services.inventory.clone();
        handles.push(tokio::spawn(async move {
            inventory
                .use_parts(UsePartsCommand {
                    employee_id: TECH_ID.to_string(),
                    order_id: format!("ZL-B{}", i),
                    parts: vec![
                        RequestedPart {
                            part_id: "P100".to_string(),
                            quantity: 2,
                            installation_notes: None,
                        },
                        RequestedPart {
                            part_id: "P200".to_string(),
                            quantity: 1,
                            installation_notes: None,
                        },
                    ],
                    add_to_invoice: false,
                    invoice_id: None,
                    customer_info: None,
                    warranty_months: None,
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked").expect("usage failed");
    }

    let entries = personal_inventory_entry::Entity::find()
        .filter(personal_inventory_entry::Column::EmployeeId.eq(TECH_ID))
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    // P100 was consumed exactly (4 batches x 2) and its row dropped at zero.
    assert!(!entries.iter().any(|e| e.part_id == "P100"));
    let p200 = entries.iter().find(|e| e.part_id == "P200").unwrap();
    assert_eq!(p200.quantity, 4);
}
