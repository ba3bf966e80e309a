use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use storefront_rs::models::{validate_cart_quantity, validate_price, AddCartItemRequest, Validate};
use storefront_rs::repositories::{CartRepository, Database, SqlCartRepository};
use tokio::runtime::Runtime;

prop_compose! {
    fn arb_valid_price()(cents in 1i64..100_000) -> Decimal {
        // Prices as cents with exactly 2 decimal places
        Decimal::new(cents, 2)
    }
}

prop_compose! {
    fn arb_add()(
        product_id in 1i64..5,
        quantity in 1i32..50,
        price in arb_valid_price(),
    ) -> (i64, i32, Decimal) {
        (product_id, quantity, price)
    }
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_repeated_adds_sum_quantities_and_keep_first_price(
        adds in prop::collection::vec(arb_add(), 1..20)
    ) {
        let rt = runtime();
        let (cart, expected) = rt.block_on(async {
            let database = Database::connect_in_memory().await.unwrap();
            let repository = SqlCartRepository::new(&database);
            let cart = repository.create_cart(1).await.unwrap();

            let mut expected: HashMap<i64, (i32, Decimal)> = HashMap::new();
            for (product_id, quantity, price) in &adds {
                repository
                    .add_item(cart.id, *product_id, *quantity, *price)
                    .await
                    .unwrap();
                expected
                    .entry(*product_id)
                    .and_modify(|(total, _)| *total += quantity)
                    .or_insert((*quantity, *price));
            }

            (repository.get_active_cart(1).await.unwrap(), expected)
        });

        prop_assert_eq!(cart.items.len(), expected.len());
        for item in &cart.items {
            let (quantity, price) = expected[&item.product_id];
            prop_assert_eq!(item.quantity, quantity);
            prop_assert_eq!(item.price, price);
        }

        let expected_total: Decimal = expected
            .values()
            .map(|(quantity, price)| *price * Decimal::from(*quantity))
            .sum();
        prop_assert_eq!(cart.total_amount, expected_total);
    }

    #[test]
    fn test_persisted_total_matches_items_after_any_mutation(
        adds in prop::collection::vec(arb_add(), 1..12),
        updates in prop::collection::vec((1i64..5, 1i32..30), 0..6),
        removals in prop::collection::vec(1i64..5, 0..3),
    ) {
        let rt = runtime();
        let cart = rt.block_on(async {
            let database = Database::connect_in_memory().await.unwrap();
            let repository = SqlCartRepository::new(&database);
            let cart = repository.create_cart(3).await.unwrap();

            for (product_id, quantity, price) in &adds {
                repository
                    .add_item(cart.id, *product_id, *quantity, *price)
                    .await
                    .unwrap();
            }
            // Absent lines surface as NotFound and leave the cart alone
            for (product_id, quantity) in &updates {
                let _ = repository.update_item(cart.id, *product_id, *quantity).await;
            }
            for product_id in &removals {
                let _ = repository.remove_item(cart.id, *product_id).await;
            }

            repository.get_active_cart(3).await.unwrap()
        });

        prop_assert_eq!(Some(cart.total_amount), cart.computed_total());
        prop_assert!(cart.items.iter().all(|item| item.quantity > 0));

        let mut product_ids: Vec<_> = cart.items.iter().map(|item| item.product_id).collect();
        product_ids.sort();
        product_ids.dedup();
        prop_assert_eq!(product_ids.len(), cart.items.len());
    }

    #[test]
    fn test_quantity_validation(quantity in any::<i32>()) {
        let result = validate_cart_quantity(quantity);
        if quantity >= 1 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn test_price_validation(mantissa in -1_000_000i64..1_000_000, scale in 0u32..5) {
        let price = Decimal::new(mantissa, scale);
        let result = validate_price(&price);

        if price > Decimal::ZERO && price.scale() <= 2 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn test_add_request_validation(
        product_id in any::<i64>(),
        quantity in any::<i32>(),
    ) {
        let request = AddCartItemRequest {
            product_id,
            quantity,
            price: None,
        };

        prop_assert_eq!(request.validate().is_ok(), product_id >= 1 && quantity >= 1);
    }
}
