//! Cart, checkout and purchase fulfillment, run against the in-memory store.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use uuid::Uuid;
use verdant_core::error::DomainError;
use verdant_core::purchase::PurchaseType;
use verdant_marketplace::application::checkout::{
    CheckoutContext, handle_apply_promo_code, handle_start_checkout,
};
use verdant_marketplace::application::command_handlers::{
    handle_add_to_cart, handle_remove_from_cart,
};
use verdant_marketplace::application::purchase::{PurchaseContext, handle_process_purchase};
use verdant_marketplace::application::query_handlers::get_cart;
use verdant_marketplace::domain::commands::{
    AddToCart, ApplyPromoCode, ProcessPurchase, RemoveFromCart, StartCheckout,
};
use verdant_marketplace::domain::module::{MarketplaceModule, ModuleStatus};
use verdant_marketplace::domain::pricing::RevenueSplit;
use verdant_marketplace::domain::promo::{DiscountType, PromoCode};
use verdant_marketplace::domain::purchase::{
    ItemFulfillment, NewEnrollment, PurchaseMetadata, PurchaseOutcome,
};
use verdant_marketplace::domain::repository::{CheckoutRequest, PurchaseRepository};
use verdant_test_support::fixtures::{
    corporate_admin, employee, enrollment, learner, published_module,
};
use verdant_test_support::{FixedClock, InMemoryStore, RecordingGateway, RecordingMailer};

const BASE_URL: &str = "https://verdant.test";

fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

fn add(user_id: Uuid, module_id: Uuid, employee_count: Option<i64>) -> AddToCart {
    AddToCart {
        correlation_id: Uuid::new_v4(),
        user_id,
        module_id,
        employee_count,
    }
}

fn promo(code: &str, percent: i64) -> PromoCode {
    PromoCode {
        id: Uuid::new_v4(),
        code: code.to_owned(),
        discount_type: DiscountType::Percentage,
        discount_value: percent,
        max_uses: Some(100),
        current_uses: 0,
        valid_from: None,
        valid_until: None,
        minimum_purchase_cents: 0,
        active: true,
    }
}

fn seeded_module(
    store: &InMemoryStore,
    title: &str,
    price_cents: i64,
    community: bool,
) -> MarketplaceModule {
    let community_id = community.then(Uuid::new_v4);
    let module = published_module(
        title,
        price_cents,
        community_id,
        Uuid::new_v4(),
        fixed_clock().0,
    );
    store.add_module(module.clone());
    module
}

async fn cart_add(store: &InMemoryStore, command: &AddToCart) {
    handle_add_to_cart(command, &fixed_clock(), store, store, store, store)
        .await
        .unwrap();
}

async fn checkout(
    store: &InMemoryStore,
    gateway: &RecordingGateway,
    user_id: Uuid,
    promo_code: Option<&str>,
) -> Result<CheckoutRequest, DomainError> {
    let clock = fixed_clock();
    let ctx = CheckoutContext {
        clock: &clock,
        profiles: store,
        modules: store,
        carts: store,
        promos: store,
        gateway,
        base_url: BASE_URL,
    };
    let command = StartCheckout {
        correlation_id: Uuid::new_v4(),
        user_id,
        promo_code: promo_code.map(str::to_owned),
    };
    handle_start_checkout(&command, &ctx).await?;
    Ok(gateway.requests().pop().unwrap())
}

/// Decodes the session metadata as the completion webhook would.
fn purchase_from(session_id: &str, request: &CheckoutRequest) -> ProcessPurchase {
    let metadata: HashMap<String, String> = request
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    ProcessPurchase {
        correlation_id: Uuid::new_v4(),
        session_id: session_id.to_owned(),
        metadata: PurchaseMetadata::from_session_metadata(&metadata).unwrap(),
    }
}

async fn process(
    store: &InMemoryStore,
    mailer: &RecordingMailer,
    command: &ProcessPurchase,
) -> Result<PurchaseOutcome, DomainError> {
    let clock = fixed_clock();
    let ctx = PurchaseContext {
        clock: &clock,
        profiles: store,
        purchases: store,
        promos: store,
        carts: store,
        modules: store,
        mailer,
        base_url: BASE_URL,
    };
    handle_process_purchase(command, &ctx).await
}

#[tokio::test]
async fn test_individual_add_to_cart_uses_module_price() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let module = seeded_module(&store, "Huella hídrica", 12_000, false);

    // Act
    let item = handle_add_to_cart(
        &add(buyer.id, module.id, Some(40)),
        &fixed_clock(),
        &store,
        &store,
        &store,
        &store,
    )
    .await
    .unwrap();

    // Assert
    assert_eq!(item.employee_count, 1);
    assert_eq!(item.price_snapshot_cents, 12_000);
    let cart = get_cart(buyer.id, &store, &store).await.unwrap();
    assert_eq!(cart.subtotal_cents, 12_000);
    assert_eq!(cart.items[0].module_title, "Huella hídrica");
}

#[tokio::test]
async fn test_already_enrolled_buyer_cannot_add_module() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let module = seeded_module(&store, "Huella hídrica", 12_000, false);
    store.add_enrollment(enrollment(buyer.id, module.id, fixed_clock().0));

    // Act
    let result = handle_add_to_cart(
        &add(buyer.id, module.id, None),
        &fixed_clock(),
        &store,
        &store,
        &store,
        &store,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(DomainError::Conflict(_))));
    assert!(store.cart_items().is_empty());
}

#[tokio::test]
async fn test_unpublished_module_cannot_be_added() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let mut module = published_module(
        "Borrador oculto",
        9_000,
        None,
        Uuid::new_v4(),
        fixed_clock().0,
    );
    module.status = ModuleStatus::Review;
    store.add_module(module.clone());

    // Act
    let result = handle_add_to_cart(
        &add(buyer.id, module.id, None),
        &fixed_clock(),
        &store,
        &store,
        &store,
        &store,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn test_corporate_seats_default_to_account_size_and_bill_per_pack() {
    // Arrange
    let store = InMemoryStore::new();
    let account_id = Uuid::new_v4();
    let admin = corporate_admin("Rosa Díaz", account_id);
    store.add_profile(admin.clone());
    store.add_profile(employee("Pablo Núñez", account_id));
    store.add_profile(employee("Elena Vidal", account_id));
    let small = seeded_module(&store, "Movilidad sostenible", 10_000, false);
    let large = seeded_module(&store, "Energía en planta", 10_000, false);

    // Act
    let defaulted = handle_add_to_cart(
        &add(admin.id, small.id, None),
        &fixed_clock(),
        &store,
        &store,
        &store,
        &store,
    )
    .await
    .unwrap();
    let explicit = handle_add_to_cart(
        &add(admin.id, large.id, Some(120)),
        &fixed_clock(),
        &store,
        &store,
        &store,
        &store,
    )
    .await
    .unwrap();

    // Assert
    assert_eq!(defaulted.employee_count, 3);
    assert_eq!(defaulted.price_snapshot_cents, 10_000);
    assert_eq!(explicit.employee_count, 120);
    assert_eq!(explicit.price_snapshot_cents, 30_000);
}

#[tokio::test]
async fn test_oversized_seat_count_is_rejected() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = corporate_admin("Rosa Díaz", Uuid::new_v4());
    store.add_profile(admin.clone());
    let module = seeded_module(&store, "Energía en planta", 10_000, false);

    // Act
    let result = handle_add_to_cart(
        &add(admin.id, module.id, Some(i64::MAX)),
        &fixed_clock(),
        &store,
        &store,
        &store,
        &store,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert!(store.cart_items().is_empty());
}

#[tokio::test]
async fn test_adding_again_updates_seats_instead_of_duplicating() {
    // Arrange
    let store = InMemoryStore::new();
    let account_id = Uuid::new_v4();
    let admin = corporate_admin("Rosa Díaz", account_id);
    store.add_profile(admin.clone());
    let module = seeded_module(&store, "Movilidad sostenible", 10_000, false);
    cart_add(&store, &add(admin.id, module.id, Some(10))).await;

    // Act
    cart_add(&store, &add(admin.id, module.id, Some(60))).await;

    // Assert
    let items = store.cart_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].employee_count, 60);
    assert_eq!(items[0].price_snapshot_cents, 20_000);
}

#[tokio::test]
async fn test_remove_missing_cart_item_is_not_found() {
    let store = InMemoryStore::new();
    let command = RemoveFromCart {
        correlation_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        module_id: Uuid::new_v4(),
    };

    let result = handle_remove_from_cart(&command, &store).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_promo_quote_normalizes_code() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let module = seeded_module(&store, "Huella hídrica", 12_000, false);
    cart_add(&store, &add(buyer.id, module.id, None)).await;
    store.add_promo_code(promo("VERDE20", 20));
    let command = ApplyPromoCode {
        correlation_id: Uuid::new_v4(),
        user_id: buyer.id,
        code: "  verde20 ".to_owned(),
    };

    // Act
    let quote = handle_apply_promo_code(&command, &fixed_clock(), &store, &store, &store)
        .await
        .unwrap();

    // Assert
    assert_eq!(quote.code, "VERDE20");
    assert_eq!(quote.discount_cents, 2_400);
    assert_eq!(quote.total_cents, 9_600);
    assert_eq!(store.promo_codes()[0].current_uses, 0);
}

#[tokio::test]
async fn test_unknown_promo_code_is_rejected() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let module = seeded_module(&store, "Huella hídrica", 12_000, false);
    cart_add(&store, &add(buyer.id, module.id, None)).await;
    let command = ApplyPromoCode {
        correlation_id: Uuid::new_v4(),
        user_id: buyer.id,
        code: "NOEXISTE".to_owned(),
    };

    // Act
    let result = handle_apply_promo_code(&command, &fixed_clock(), &store, &store, &store).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_rejected() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let gateway = RecordingGateway::new();

    // Act
    let result = checkout(&store, &gateway, buyer.id, None).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn test_checkout_spreads_discount_across_lines() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let first = seeded_module(&store, "Huella hídrica", 10_000, true);
    let second = seeded_module(&store, "Compras responsables", 5_000, false);
    cart_add(&store, &add(buyer.id, first.id, None)).await;
    cart_add(&store, &add(buyer.id, second.id, None)).await;
    store.add_promo_code(promo("VERDE20", 20));
    let gateway = RecordingGateway::new();

    // Act
    let request = checkout(&store, &gateway, buyer.id, Some("verde20"))
        .await
        .unwrap();

    // Assert
    assert_eq!(request.customer_email, buyer.email);
    let amounts: Vec<i64> = request.line_items.iter().map(|l| l.amount_cents).collect();
    assert_eq!(amounts, vec![8_000, 4_000]);
    assert_eq!(request.line_items[0].description, "Acceso individual");
    assert_eq!(request.metadata["purchase_type"], "individual");
    assert_eq!(request.metadata["total_amount"], "12000");
    assert_eq!(request.metadata["discount_amount"], "3000");
    assert_eq!(request.metadata["promo_codes"], "VERDE20");
    assert_eq!(
        request.success_url,
        "https://verdant.test/checkout/success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(request.cancel_url, "https://verdant.test/cart");
}

#[tokio::test]
async fn test_paid_checkout_is_fulfilled_once() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let community_module = seeded_module(&store, "Huella hídrica", 10_000, true);
    let platform_module = seeded_module(&store, "Compras responsables", 5_000, false);
    cart_add(&store, &add(buyer.id, community_module.id, None)).await;
    cart_add(&store, &add(buyer.id, platform_module.id, None)).await;
    store.add_promo_code(promo("VERDE20", 20));
    let gateway = RecordingGateway::new();
    let request = checkout(&store, &gateway, buyer.id, Some("VERDE20"))
        .await
        .unwrap();
    let command = purchase_from("cs_test_1", &request);
    let mailer = RecordingMailer::new();

    // Act
    let first = process(&store, &mailer, &command).await.unwrap();
    let redelivered = process(&store, &mailer, &command).await.unwrap();

    // Assert
    assert_eq!(first.items_fulfilled, 2);
    assert_eq!(first.enrollments_created, 2);
    assert_eq!(first.promo_codes_recorded, 1);
    assert!(first.cart_cleared);
    assert_eq!(redelivered.items_fulfilled, 0);
    assert_eq!(redelivered.items_skipped, 2);

    let sales = store.sales();
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].amount_cents, 8_000);
    assert_eq!(
        sales[0].split,
        RevenueSplit {
            community_cents: 4_000,
            creator_cents: 2_400,
            platform_cents: 1_600,
        }
    );
    assert_eq!(sales[1].split.platform_cents, 4_000);

    let enrollments = store.enrollments();
    assert_eq!(enrollments.len(), 2);
    assert!(enrollments.iter().all(|e| e.user_id == buyer.id));
    assert_eq!(store.promo_uses().len(), 1);
    assert_eq!(store.promo_uses()[0].discount_cents, 3_000);
    assert_eq!(store.promo_codes()[0].current_uses, 1);
    assert!(store.cart_items().is_empty());

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Confirmación de compra");
    assert!(sent[0].html.contains("Huella hídrica"));
}

#[tokio::test]
async fn test_corporate_purchase_enrolls_every_account_member() {
    // Arrange
    let store = InMemoryStore::new();
    let account_id = Uuid::new_v4();
    let admin = corporate_admin("Rosa Díaz", account_id);
    store.add_profile(admin.clone());
    store.add_profile(employee("Pablo Núñez", account_id));
    store.add_profile(employee("Elena Vidal", account_id));
    let module = seeded_module(&store, "Movilidad sostenible", 9_000, false);
    cart_add(&store, &add(admin.id, module.id, None)).await;
    let gateway = RecordingGateway::new();
    let request = checkout(&store, &gateway, admin.id, None).await.unwrap();
    let command = purchase_from("cs_test_1", &request);

    // Act
    let outcome = process(&store, &RecordingMailer::new(), &command)
        .await
        .unwrap();

    // Assert
    assert_eq!(command.metadata.purchase_type, PurchaseType::Corporate);
    assert_eq!(request.line_items[0].description, "3 empleados");
    assert_eq!(outcome.enrollments_created, 3);
    let enrollments = store.enrollments();
    assert!(enrollments.iter().all(|e| {
        e.corporate_account_id == Some(account_id)
            && e.purchase_type == PurchaseType::Corporate
            && e.price_paid_cents == 3_000
    }));
    assert_eq!(store.modules()[0].purchase_count, 1);
}

#[tokio::test]
async fn test_promo_tracking_failure_does_not_fail_purchase() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let module = seeded_module(&store, "Huella hídrica", 10_000, false);
    cart_add(&store, &add(buyer.id, module.id, None)).await;
    store.add_promo_code(promo("VERDE20", 20));
    let gateway = RecordingGateway::new();
    let request = checkout(&store, &gateway, buyer.id, Some("VERDE20"))
        .await
        .unwrap();
    store.fail_on("record_promo_use");
    store.fail_on("clear_cart");

    // Act
    let command = purchase_from("cs_test_1", &request);
    let outcome = process(&store, &RecordingMailer::new(), &command)
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome.items_fulfilled, 1);
    assert_eq!(outcome.promo_codes_recorded, 0);
    assert!(!outcome.cart_cleared);
    assert_eq!(store.enrollments().len(), 1);
}

#[tokio::test]
async fn test_fulfillment_failure_is_reported() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let module = seeded_module(&store, "Huella hídrica", 10_000, false);
    cart_add(&store, &add(buyer.id, module.id, None)).await;
    let gateway = RecordingGateway::new();
    let request = checkout(&store, &gateway, buyer.id, None).await.unwrap();
    store.fail_on("fulfill_item");
    let mailer = RecordingMailer::new();

    // Act
    let result = process(&store, &mailer, &purchase_from("cs_test_1", &request)).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    assert!(store.enrollments().is_empty());
    assert!(mailer.sent().is_empty());
    assert_eq!(store.cart_items().len(), 1);
}

#[tokio::test]
async fn test_redelivery_after_partial_failure_fulfills_only_the_missing_line() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let water = seeded_module(&store, "Huella hídrica", 10_000, false);
    let shopping = seeded_module(&store, "Compras responsables", 5_000, false);
    cart_add(&store, &add(buyer.id, water.id, None)).await;
    cart_add(&store, &add(buyer.id, shopping.id, None)).await;
    store.add_promo_code(promo("VERDE20", 20));
    let gateway = RecordingGateway::new();
    let request = checkout(&store, &gateway, buyer.id, Some("VERDE20"))
        .await
        .unwrap();
    let command = purchase_from("cs_test_1", &request);
    let mailer = RecordingMailer::new();
    store.fail_on_call("fulfill_item", 2);

    // Act
    let failed = process(&store, &mailer, &command).await;
    let after_failure = (store.sales().len(), store.enrollments().len());
    let redelivered = process(&store, &mailer, &command).await.unwrap();

    // Assert
    assert!(matches!(failed, Err(DomainError::Infrastructure(_))));
    assert_eq!(after_failure, (1, 1));
    assert_eq!(redelivered.items_fulfilled, 1);
    assert_eq!(redelivered.items_skipped, 1);
    assert_eq!(redelivered.promo_codes_recorded, 1);

    let sales = store.sales();
    assert_eq!(sales.len(), 2);
    assert_ne!(sales[0].module_id, sales[1].module_id);
    assert_eq!(store.enrollments().len(), 2);
    assert_eq!(store.promo_uses().len(), 1);
    assert_eq!(store.promo_codes()[0].current_uses, 1);
    assert!(store.cart_items().is_empty());
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_line_whose_enrollees_exist_distributes_no_revenue() {
    // Arrange
    let store = InMemoryStore::new();
    let buyer = learner("Ana Torres");
    store.add_profile(buyer.clone());
    let module = seeded_module(&store, "Huella hídrica", 10_000, true);
    let line = |id: Uuid| ItemFulfillment {
        module_id: module.id,
        buyer_id: buyer.id,
        amount_cents: 10_000,
        enrollments: vec![NewEnrollment {
            id,
            user_id: buyer.id,
            module_id: module.id,
            corporate_account_id: None,
            purchase_type: PurchaseType::Individual,
            price_paid_cents: 10_000,
            purchased_at: fixed_clock().0,
        }],
    };

    // Act
    let first = store.fulfill_item(&line(Uuid::new_v4())).await.unwrap();
    let raced = store.fulfill_item(&line(Uuid::new_v4())).await.unwrap();

    // Assert
    assert_eq!((first, raced), (1, 0));
    assert_eq!(store.sales().len(), 1);
    assert_eq!(store.modules()[0].purchase_count, 1);
    assert_eq!(store.enrollments().len(), 1);
}
