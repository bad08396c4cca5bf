use crate::core::constants::BALANCE_QUERIED;
use crate::core::errors::DongipError;
use crate::core::settlement::{Currency, SettlementError};
use crate::tests::{create_test_service, entry, household, new_dong};
use std::collections::BTreeMap;

#[tokio::test]
async fn test_user_balances_aggregate_across_dongs() {
    let service = create_test_service();
    let h = household(&service, "09120000001").await;

    // me pays 300 for me, b and c
    let dinner = new_dong(
        &h.category,
        300,
        vec![entry(&h.me, 300)],
        vec![entry(&h.me, 100), entry(&h.b, 100), entry(&h.c, 100)],
    );
    service.create_dong(&h.owner, dinner).await.unwrap();
    // b pays 200 for me and b
    let taxi = new_dong(
        &h.category,
        200,
        vec![entry(&h.b, 200)],
        vec![entry(&h.me, 100), entry(&h.b, 100)],
    );
    service.create_dong(&h.owner, taxi).await.unwrap();

    let balances = service.get_user_balances(&h.owner).await.unwrap();
    assert_eq!(balances.len(), 1);
    let irr = &balances[0];
    assert_eq!(irr.currency, Currency::default());

    // b's debt and credit cancel out and is dropped
    let expected: BTreeMap<String, i64> = [(h.me.id.clone(), 100), (h.c.id.clone(), -100)]
        .into_iter()
        .collect();
    assert_eq!(irr.balances, expected);
    assert_eq!(irr.transfers.len(), 1);
    assert_eq!(irr.transfers[0].from, h.c.id);
    assert_eq!(irr.transfers[0].to, h.me.id);
    assert_eq!(irr.transfers[0].amount, 100);
}

#[tokio::test]
async fn test_user_balances_split_by_currency() {
    let service = create_test_service();
    let h = household(&service, "09120000001").await;

    let irr = new_dong(&h.category, 1000, vec![entry(&h.me, 1000)], vec![entry(&h.b, 1000)]);
    service.create_dong(&h.owner, irr).await.unwrap();
    let mut usd = new_dong(&h.category, 25, vec![entry(&h.c, 25)], vec![entry(&h.me, 25)]);
    usd.currency = Some(Currency::new("USD").unwrap());
    service.create_dong(&h.owner, usd).await.unwrap();

    let balances = service.get_user_balances(&h.owner).await.unwrap();
    let codes: Vec<&str> = balances.iter().map(|b| b.currency.code()).collect();
    assert_eq!(codes, vec!["IRR", "USD"]);
    assert_eq!(balances[1].balances.get(&h.me.id), Some(&-25));
    assert_eq!(balances[1].balances.get(&h.c.id), Some(&25));
}

#[tokio::test]
async fn test_user_balances_cache_invalidated_by_dong_changes() {
    let service = create_test_service();
    let h = household(&service, "09120000001").await;

    assert!(service.get_user_balances(&h.owner).await.unwrap().is_empty());

    let first = new_dong(&h.category, 100, vec![entry(&h.me, 100)], vec![entry(&h.b, 100)]);
    let first = service.create_dong(&h.owner, first).await.unwrap();
    let balances = service.get_user_balances(&h.owner).await.unwrap();
    assert_eq!(balances[0].balances.get(&h.b.id), Some(&-100));

    // second read is served from cache and does not log
    let cached = service.get_user_balances(&h.owner).await.unwrap();
    assert_eq!(cached, balances);
    let queried = service
        .get_app_logs(&h.owner)
        .await
        .unwrap()
        .into_iter()
        .filter(|log| log.action == BALANCE_QUERIED)
        .count();
    assert_eq!(queried, 2);

    service.delete_dong(&first.dong.id, &h.owner).await.unwrap();
    assert!(service.get_user_balances(&h.owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_simplify_balances() {
    let service = create_test_service();

    let balances: BTreeMap<String, i64> = [("a", 50), ("b", -30), ("c", -20), ("d", 0)]
        .into_iter()
        .map(|(id, amount)| (id.to_string(), amount))
        .collect();
    let transfers = service.simplify_balances(&balances).unwrap();
    assert_eq!(transfers.len(), 2);
    assert_eq!((transfers[0].from.as_str(), transfers[0].amount), ("b", 30));
    assert_eq!((transfers[1].from.as_str(), transfers[1].amount), ("c", 20));

    let unbalanced: BTreeMap<String, i64> = [("a".to_string(), 10), ("b".to_string(), -5)].into_iter().collect();
    let result = service.simplify_balances(&unbalanced);
    assert!(matches!(
        result,
        Err(DongipError::Settlement(SettlementError::UnbalancedInput(5)))
    ));
}
