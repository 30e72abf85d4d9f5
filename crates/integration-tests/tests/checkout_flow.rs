//! Checkout against a recording order service.

#![allow(clippy::unwrap_used)]

use wardrobe_integration_tests::{RecordingOrders, product, sized_product};
use wardrobe_storefront::api::ApiError;
use wardrobe_storefront::cart::{CartStorage, CartStore, DEFAULT_CART_KEY, FileStorage, Variant};
use wardrobe_storefront::checkout::{
    CheckoutError, CheckoutRequest, PaymentMethod, ShippingInfo, place_order,
};
use wardrobe_storefront::state::SharedCart;

fn request() -> CheckoutRequest {
    CheckoutRequest {
        shipping: ShippingInfo {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
        },
        payment: PaymentMethod::CashOnDelivery,
    }
}

fn filled_cart(dir: &std::path::Path) -> SharedCart {
    let mut store = CartStore::open(FileStorage::open(dir).unwrap(), DEFAULT_CART_KEY);
    store.add_item(
        sized_product("s1", "Linen Shirt", 1200, &["M"]),
        1,
        Some(Variant::new("M")),
    );
    store.add_item(product("t1", "Basic Tee", 400), 3, None);
    SharedCart::new(store)
}

fn persisted(dir: &std::path::Path) -> serde_json::Value {
    let raw = FileStorage::open(dir)
        .unwrap()
        .get(DEFAULT_CART_KEY)
        .unwrap()
        .unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn test_successful_order_clears_persisted_cart() {
    let dir = tempfile::tempdir().unwrap();
    let cart = filled_cart(dir.path());
    let orders = RecordingOrders::accepting();

    let receipt = place_order(&cart, &orders, &request()).await.unwrap();
    assert_eq!(receipt.message.as_deref(), Some("Order created"));

    let received = orders.received();
    assert_eq!(received.len(), 1);
    assert_eq!(
        serde_json::to_value(&received[0]).unwrap(),
        serde_json::json!({
            "items": [
                { "productId": "s1", "quantity": 1, "selectedSize": "M" },
                { "productId": "t1", "quantity": 3 }
            ]
        })
    );

    assert!(cart.view().is_empty());
    assert_eq!(persisted(dir.path()), serde_json::json!([]));
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let dir = tempfile::tempdir().unwrap();
    let cart = filled_cart(dir.path());
    let orders = RecordingOrders::rejecting(409);

    let err = place_order(&cart, &orders, &request()).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Api(ApiError::Status { status: 409, .. })
    ));

    let view = cart.view();
    assert_eq!(view.item_count, 4);
    assert_eq!(view.subtotal, "Rs. 2400");
    assert_eq!(persisted(dir.path()).as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_shipping_never_reaches_service() {
    let dir = tempfile::tempdir().unwrap();
    let cart = filled_cart(dir.path());
    let orders = RecordingOrders::accepting();

    let mut bad = request();
    bad.shipping.email = "asha.example.com".to_string();

    let err = place_order(&cart, &orders, &bad).await.unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidEmail(_)));
    assert!(orders.received().is_empty());
    assert_eq!(cart.view().item_count, 4);
}
