#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::transactions::TransactionManager;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(db: &Database, amount: Decimal, category: &str, date: NaiveDate) -> Transaction {
    TransactionManager::new(db)
        .add(&NewTransaction::new(TransactionType::Expense, amount, category).on(date))
        .unwrap()
}

fn income(db: &Database, amount: Decimal, category: &str, date: NaiveDate) -> Transaction {
    TransactionManager::new(db)
        .add(&NewTransaction::new(TransactionType::Income, amount, category).on(date))
        .unwrap()
}

// ── Create & read ─────────────────────────────────────────────

#[test]
fn test_add_then_get_by_name_roundtrips() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);

    let food = cats.add("Food", dec!(200), None).unwrap();
    let dining = cats.add("Food:Dining", dec!(50.25), Some("Food")).unwrap();

    assert_eq!(cats.get_by_name("Food").unwrap(), Some(food.clone()));
    let fetched = cats.get_by_name("Food:Dining").unwrap().unwrap();
    assert_eq!(fetched, dining);
    assert_eq!(fetched.limit_amount, dec!(50.25));
    assert_eq!(fetched.parent_id, Some(food.id));
}

#[test]
fn test_add_keeps_name_verbatim() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);

    let padded = cats.add(" Food ", dec!(10), None).unwrap();
    assert_eq!(padded.name, " Food ");
    assert_eq!(cats.get_by_name(" Food ").unwrap(), Some(padded.clone()));
    assert!(cats.get_by_name("Food").unwrap().is_none());

    let plain = cats.add("Food", dec!(20), None).unwrap();
    assert_ne!(plain.id, padded.id);

    let child = cats.add("Dining", dec!(0), Some(" Food ")).unwrap();
    assert_eq!(child.parent_id, Some(padded.id));
    expense(&db, dec!(5), " Food ", ymd(2024, 1, 1));
}

#[test]
fn test_update_rename_keeps_name_verbatim() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();

    let renamed = cats
        .update(
            &CategoryRef::Id(food.id),
            &CategoryUpdate::from_fields([("name", "Groceries ")]).unwrap(),
        )
        .unwrap();
    assert_eq!(renamed.name, "Groceries ");
    assert_eq!(cats.get_by_name("Groceries ").unwrap(), Some(renamed));
    assert!(matches!(
        cats.update(
            &CategoryRef::Id(food.id),
            &CategoryUpdate {
                name: Some("   ".into()),
                ..Default::default()
            },
        ),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_add_defaults_to_no_limit() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let misc = cats.add("Misc", Decimal::ZERO, None).unwrap();
    assert!(!misc.has_limit());
    assert!(misc.parent_id.is_none());
}

#[test]
fn test_add_duplicate_name_fails_and_keeps_one_row() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(100), None).unwrap();

    let err = cats.add("Food", dec!(999), None).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(ref name) if name == "Food"));

    let all = cats.list().unwrap();
    assert_eq!(all.iter().filter(|c| c.name == "Food").count(), 1);
    assert_eq!(cats.get_by_name("Food").unwrap().unwrap().limit_amount, dec!(100));
}

#[test]
fn test_add_with_missing_parent_fails() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let err = cats.add("Dining", dec!(0), Some("Nope")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(cats.list().unwrap().is_empty());
}

#[test]
fn test_add_rejects_blank_name() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    assert!(matches!(
        cats.add("  ", dec!(0), None),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_lookups_miss_without_error() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    assert!(cats.get_by_name("Food").unwrap().is_none());
    assert!(cats.get_by_id(42).unwrap().is_none());
    assert!(cats.get(&CategoryRef::Id(42)).unwrap().is_none());
    assert!(cats.list().unwrap().is_empty());
}

#[test]
fn test_get_by_ref() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();

    assert_eq!(cats.get(&CategoryRef::Id(food.id)).unwrap(), Some(food.clone()));
    assert_eq!(cats.get(&CategoryRef::name("Food")).unwrap(), Some(food));
    assert!(matches!(
        cats.get(&CategoryRef::name("")),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_list_sorted_by_name() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    for name in ["Rent", "Food", "Utilities", "Books"] {
        cats.add(name, dec!(0), None).unwrap();
    }
    let names: Vec<String> = cats.list().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Books", "Food", "Rent", "Utilities"]);
}

// ── Update ────────────────────────────────────────────────────

#[test]
fn test_update_by_id_and_name() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(100), None).unwrap();

    let updated = cats
        .update(
            &CategoryRef::Id(food.id),
            &CategoryUpdate {
                limit_amount: Some(dec!(150)),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.limit_amount, dec!(150));

    let renamed = cats
        .update(
            &CategoryRef::name("Food"),
            &CategoryUpdate {
                name: Some("Groceries".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.id, food.id);
    assert!(cats.get_by_name("Food").unwrap().is_none());
    assert_eq!(
        cats.get_by_name("Groceries").unwrap().unwrap().limit_amount,
        dec!(150)
    );
}

#[test]
fn test_update_parent_set_and_clear() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();
    cats.add("Dining", dec!(0), None).unwrap();

    let target = CategoryRef::name("Dining");
    let nested = cats
        .update(
            &target,
            &CategoryUpdate {
                parent: Some(Some("Food".into())),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(nested.parent_id, Some(food.id));

    let root = cats
        .update(
            &target,
            &CategoryUpdate {
                parent: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(root.parent_id.is_none());
}

#[test]
fn test_update_rejects_disallowed_field_and_leaves_row() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(100), None).unwrap();

    let err = CategoryUpdate::from_fields([("limit_amount", "5"), ("id", "99")])
        .and_then(|update| cats.update(&CategoryRef::Id(food.id), &update))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(cats.get_by_id(food.id).unwrap(), Some(food));
}

#[test]
fn test_update_rejects_empty_update() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(100), None).unwrap();
    assert!(matches!(
        cats.update(&CategoryRef::Id(food.id), &CategoryUpdate::default()),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_update_rejects_empty_reference() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let update = CategoryUpdate {
        limit_amount: Some(dec!(1)),
        ..Default::default()
    };
    assert!(matches!(
        cats.update(&CategoryRef::name(""), &update),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_update_missing_target_or_parent() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(100), None).unwrap();

    let update = CategoryUpdate {
        limit_amount: Some(dec!(1)),
        ..Default::default()
    };
    assert!(matches!(
        cats.update(&CategoryRef::Id(food.id + 1), &update),
        Err(Error::NotFound(_))
    ));

    let update = CategoryUpdate {
        parent: Some(Some("Ghost".into())),
        limit_amount: Some(dec!(1)),
        ..Default::default()
    };
    assert!(matches!(
        cats.update(&CategoryRef::Id(food.id), &update),
        Err(Error::NotFound(_))
    ));
    // The limit change was not applied either.
    assert_eq!(cats.get_by_id(food.id).unwrap().unwrap().limit_amount, dec!(100));
}

#[test]
fn test_update_rename_collision() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(0), None).unwrap();
    let rent = cats.add("Rent", dec!(0), None).unwrap();

    let err = cats
        .update(
            &CategoryRef::Id(rent.id),
            &CategoryUpdate {
                name: Some("Food".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateName(_)));
    assert_eq!(cats.get_by_id(rent.id).unwrap().unwrap().name, "Rent");
}

#[test]
fn test_update_rejects_self_parent() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(0), None).unwrap();
    let err = cats
        .update(
            &CategoryRef::name("Food"),
            &CategoryUpdate {
                parent: Some(Some("Food".into())),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_update_rejects_cycle_through_descendant() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let a = cats.add("A", dec!(0), None).unwrap();
    cats.add("B", dec!(0), Some("A")).unwrap();
    cats.add("C", dec!(0), Some("B")).unwrap();

    let err = cats
        .update(
            &CategoryRef::name("A"),
            &CategoryUpdate {
                parent: Some(Some("C".into())),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(cats.get_by_id(a.id).unwrap().unwrap().parent_id.is_none());
}

// ── Delete ────────────────────────────────────────────────────

#[test]
fn test_delete_missing_returns_false() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    assert!(!cats.delete(7, false).unwrap());
    assert!(!cats.delete(7, true).unwrap());
}

#[test]
fn test_delete_without_dependents() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();
    assert!(cats.delete(food.id, false).unwrap());
    assert!(cats.get_by_id(food.id).unwrap().is_none());
}

#[test]
fn test_delete_with_transactions_refused_without_force() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();
    let txn = expense(&db, dec!(12), "Food", ymd(2024, 1, 5));

    let err = cats.delete(food.id, false).unwrap_err();
    assert!(matches!(
        err,
        Error::HasDependents {
            transactions: 1,
            subcategories: 0,
            ..
        }
    ));

    assert!(cats.get_by_id(food.id).unwrap().is_some());
    let still_there = TransactionManager::new(&db).get(txn.id).unwrap().unwrap();
    assert_eq!(still_there.category_id, food.id);
}

#[test]
fn test_delete_with_subcategories_refused_without_force() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();
    cats.add("Food:Dining", dec!(0), Some("Food")).unwrap();

    assert!(matches!(
        cats.delete(food.id, false),
        Err(Error::HasDependents {
            subcategories: 1,
            ..
        })
    ));
    assert_eq!(cats.list().unwrap().len(), 2);
}

#[test]
fn test_force_delete_reassigns_to_parent() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();
    let dining = cats.add("Dining", dec!(0), Some("Food")).unwrap();
    let fancy = cats.add("Fancy", dec!(0), Some("Dining")).unwrap();
    let txn = expense(&db, dec!(80), "Dining", ymd(2024, 1, 5));

    assert!(cats.delete(dining.id, true).unwrap());

    assert!(cats.get_by_id(dining.id).unwrap().is_none());
    assert_eq!(
        cats.get_by_id(fancy.id).unwrap().unwrap().parent_id,
        Some(food.id)
    );
    let moved = TransactionManager::new(&db).get(txn.id).unwrap().unwrap();
    assert_eq!(moved.category_id, food.id);
    assert!(cats.get_by_name("Uncategorized").unwrap().is_none());
}

#[test]
fn test_force_delete_root_moves_transactions_to_uncategorized() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(0), None).unwrap();
    let dining = cats.add("Dining", dec!(0), Some("Food")).unwrap();
    let txn = expense(&db, dec!(10), "Food", ymd(2024, 1, 5));

    assert!(cats.delete(food.id, true).unwrap());

    let fallback = cats.get_by_name("Uncategorized").unwrap().unwrap();
    assert!(fallback.parent_id.is_none());
    assert!(!fallback.has_limit());
    let moved = TransactionManager::new(&db).get(txn.id).unwrap().unwrap();
    assert_eq!(moved.category_id, fallback.id);
    assert!(cats.get_by_id(dining.id).unwrap().unwrap().parent_id.is_none());
}

#[test]
fn test_force_delete_uncategorized_root_with_transactions_refused() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let fallback = cats.add("Uncategorized", dec!(0), None).unwrap();
    expense(&db, dec!(10), "Uncategorized", ymd(2024, 1, 5));

    assert!(matches!(
        cats.delete(fallback.id, true),
        Err(Error::Validation(_))
    ));
    assert!(cats.get_by_id(fallback.id).unwrap().is_some());
}

// ── Hierarchy ─────────────────────────────────────────────────

#[test]
fn test_hierarchy_nests_children_under_parents() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(200), None).unwrap();
    cats.add("Food:Dining", dec!(50), Some("Food")).unwrap();
    cats.add("Food:Groceries", dec!(0), Some("Food")).unwrap();
    cats.add("Rent", dec!(0), None).unwrap();

    let forest = cats.hierarchy().unwrap();
    let roots: Vec<&str> = forest.iter().map(|n| n.category.name.as_str()).collect();
    assert_eq!(roots, vec!["Food", "Rent"]);

    let food = &forest[0];
    let children: Vec<&str> = food
        .subcategories
        .iter()
        .map(|n| n.category.name.as_str())
        .collect();
    assert_eq!(children, vec!["Food:Dining", "Food:Groceries"]);
    assert!(forest[1].subcategories.is_empty());
}

#[test]
fn test_hierarchy_empty() {
    let db = Database::open_in_memory().unwrap();
    assert!(CategoryManager::new(&db).hierarchy().unwrap().is_empty());
}

// ── Spending summary ──────────────────────────────────────────

#[test]
fn test_spending_summary_child_over_budget_without_rollup() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(200), None).unwrap();
    cats.add("Food:Dining", dec!(50), Some("Food")).unwrap();
    expense(&db, dec!(60), "Food:Dining", ymd(2024, 3, 10));

    let forest = cats.hierarchy().unwrap();
    assert!(forest[0].find("Food:Dining").is_some());

    let summary = cats
        .spending_summary(Some(ymd(2024, 3, 1)), Some(ymd(2024, 3, 31)))
        .unwrap();
    let food = summary.iter().find(|s| s.name == "Food").unwrap();
    let dining = summary.iter().find(|s| s.name == "Food:Dining").unwrap();

    assert_eq!(dining.spent, dec!(60));
    assert!(dining.over_budget);
    assert_eq!(food.spent, Decimal::ZERO);
    assert!(!food.over_budget);
}

#[test]
fn test_spending_summary_counts_expenses_only_within_window() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(100), None).unwrap();
    expense(&db, dec!(30), "Food", ymd(2024, 3, 1));
    expense(&db, dec!(20), "Food", ymd(2024, 3, 31));
    expense(&db, dec!(500), "Food", ymd(2024, 4, 1));
    income(&db, dec!(1000), "Food", ymd(2024, 3, 15));

    let march = cats
        .spending_summary(Some(ymd(2024, 3, 1)), Some(ymd(2024, 3, 31)))
        .unwrap();
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].spent, dec!(50));
    assert!(!march[0].over_budget);

    let all_time = cats.spending_summary(None, None).unwrap();
    assert_eq!(all_time[0].spent, dec!(550));
    assert!(all_time[0].over_budget);

    let from_april = cats.spending_summary(Some(ymd(2024, 4, 1)), None).unwrap();
    assert_eq!(from_april[0].spent, dec!(500));
}

#[test]
fn test_spending_summary_includes_idle_categories() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(100), None).unwrap();
    cats.add("Rent", dec!(0), None).unwrap();

    let summary = cats.spending_summary(None, None).unwrap();
    assert_eq!(summary.len(), 2);
    assert!(summary.iter().all(|s| s.spent == Decimal::ZERO && !s.over_budget));
}

#[test]
fn test_spending_summary_overflow_is_an_error() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    cats.add("Food", dec!(100), None).unwrap();
    expense(&db, Decimal::MAX, "Food", ymd(2024, 3, 1));
    expense(&db, Decimal::MAX, "Food", ymd(2024, 3, 2));

    assert!(matches!(
        cats.spending_summary(None, None),
        Err(Error::Overflow(_))
    ));
}

#[test]
fn test_spending_summary_corrupt_amount_is_storage_error() {
    let db = Database::open_in_memory().unwrap();
    let cats = CategoryManager::new(&db);
    let food = cats.add("Food", dec!(100), None).unwrap();
    let session = db.session().unwrap();
    session
        .execute(
            "INSERT INTO transactions (type, amount, category_id, date)
             VALUES ('expense', 'n/a', ?1, '2024-03-01')",
            params![food.id],
        )
        .unwrap();
    session.commit().unwrap();

    assert!(matches!(
        cats.spending_summary(None, None),
        Err(Error::Storage(_))
    ));
}
