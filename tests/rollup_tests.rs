// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ledgerly::models::TxKind;
use ledgerly::rollup::{self, Period, RollupError, Timeframe};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    ledgerly::db::init_schema(&mut conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO categories(user_id, name, type, icon) VALUES
            ('u1', 'Salary', 'income', '💰'),
            ('u1', 'Groceries', 'expense', '🛒');
        "#,
    )
    .unwrap();
    conn
}

fn add(conn: &mut Connection, user: &str, date: &str, kind: TxKind, amount: &str, cat: &str) -> i64 {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let amount: Decimal = amount.parse().unwrap();
    let tx = conn.transaction().unwrap();
    let id = rollup::record_transaction(&tx, user, date, kind, amount, "", cat).unwrap();
    tx.commit().unwrap();
    id
}

fn del(conn: &mut Connection, user: &str, id: i64) {
    let tx = conn.transaction().unwrap();
    rollup::delete_transaction(&tx, user, id).unwrap();
    tx.commit().unwrap();
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn march_2024_scenario() {
    let mut conn = setup();
    add(&mut conn, "u1", "2024-03-05", TxKind::Income, "100", "Salary");
    let expense_id = add(&mut conn, "u1", "2024-03-05", TxKind::Expense, "40", "Groceries");

    // March 2024 is month index 2 and has 31 days
    let days = rollup::history(&conn, "u1", Timeframe::Month, Period { year: 2024, month: 2 }).unwrap();
    assert_eq!(days.len(), 31);
    for row in &days {
        if row.day == Some(5) {
            assert_eq!(row.income, dec("100"));
            assert_eq!(row.expense, dec("40"));
        } else {
            assert_eq!(row.income, Decimal::ZERO);
            assert_eq!(row.expense, Decimal::ZERO);
        }
    }

    del(&mut conn, "u1", expense_id);
    let days = rollup::history(&conn, "u1", Timeframe::Month, Period { year: 2024, month: 2 }).unwrap();
    let day5 = days.iter().find(|r| r.day == Some(5)).unwrap();
    assert_eq!(day5.income, dec("100"));
    assert_eq!(day5.expense, Decimal::ZERO);

    let months = rollup::history(&conn, "u1", Timeframe::Year, Period { year: 2024, month: 0 }).unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months[2].income, dec("100"));
    assert_eq!(months[2].expense, Decimal::ZERO);
}

#[test]
fn delete_and_recreate_round_trips() {
    let mut conn = setup();
    add(&mut conn, "u1", "2024-03-05", TxKind::Income, "100", "Salary");
    let id = add(&mut conn, "u1", "2024-03-05", TxKind::Expense, "40.25", "Groceries");

    let snapshot = |conn: &Connection| -> (Vec<(i32, u32, u32, String, String)>, Vec<(i32, u32, String, String)>) {
        let mut s1 = conn
            .prepare("SELECT year, month, day, income, expense FROM daily_history ORDER BY year, month, day")
            .unwrap();
        let daily = s1
            .query_map([], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        let mut s2 = conn
            .prepare("SELECT year, month, income, expense FROM monthly_history ORDER BY year, month")
            .unwrap();
        let monthly = s2
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        (daily, monthly)
    };

    let before = snapshot(&conn);
    del(&mut conn, "u1", id);
    add(&mut conn, "u1", "2024-03-05", TxKind::Expense, "40.25", "Groceries");
    assert_eq!(snapshot(&conn), before);
}

#[test]
fn aggregates_track_ledger_through_mixed_sequence() {
    let mut conn = setup();
    let a = add(&mut conn, "u1", "2024-03-05", TxKind::Income, "100", "Salary");
    add(&mut conn, "u1", "2024-03-05", TxKind::Expense, "12.50", "Groceries");
    add(&mut conn, "u1", "2024-03-20", TxKind::Expense, "7.49", "Groceries");
    let b = add(&mut conn, "u1", "2024-04-01", TxKind::Income, "55", "Salary");
    del(&mut conn, "u1", a);
    del(&mut conn, "u1", b);
    add(&mut conn, "u1", "2024-03-20", TxKind::Expense, "0.01", "Groceries");

    // ledger and rollups must agree exactly
    let issues = ledgerly::commands::doctor::scan(&conn, None).unwrap();
    assert!(issues.is_empty(), "unexpected issues: {:?}", issues);

    let days = rollup::history(&conn, "u1", Timeframe::Month, Period { year: 2024, month: 2 }).unwrap();
    let day5 = days.iter().find(|r| r.day == Some(5)).unwrap();
    assert_eq!(day5.income, Decimal::ZERO);
    assert_eq!(day5.expense, dec("12.50"));
    let day20 = days.iter().find(|r| r.day == Some(20)).unwrap();
    assert_eq!(day20.expense, dec("7.50"));
}

#[test]
fn unknown_category_aborts_whole_write() {
    let mut conn = setup();
    let tx = conn.transaction().unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let err = rollup::record_transaction(&tx, "u1", date, TxKind::Expense, dec("5"), "", "Travel")
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<RollupError>(),
        Some(&RollupError::CategoryNotFound("Travel".into()))
    );
    drop(tx);

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM daily_history", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn category_must_match_transaction_type() {
    let mut conn = setup();
    let tx = conn.transaction().unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    // 'Salary' exists, but only as an income category
    let err = rollup::record_transaction(&tx, "u1", date, TxKind::Expense, dec("5"), "", "Salary")
        .unwrap_err();
    assert!(err.downcast_ref::<RollupError>().is_some());
}

#[test]
fn deleting_unknown_transaction_leaves_rollups_alone() {
    let mut conn = setup();
    add(&mut conn, "u1", "2024-03-05", TxKind::Income, "100", "Salary");

    let tx = conn.transaction().unwrap();
    let err = rollup::delete_transaction(&tx, "u1", 9999).unwrap_err();
    assert_eq!(
        err.downcast_ref::<RollupError>(),
        Some(&RollupError::TransactionNotFound(9999))
    );
    drop(tx);

    let months = rollup::history(&conn, "u1", Timeframe::Year, Period { year: 2024, month: 0 }).unwrap();
    assert_eq!(months[2].income, dec("100"));
}

#[test]
fn owners_do_not_see_each_other() {
    let mut conn = setup();
    add(&mut conn, "u1", "2024-03-05", TxKind::Income, "100", "Salary");

    let other = rollup::history(&conn, "u2", Timeframe::Year, Period { year: 2024, month: 0 }).unwrap();
    assert!(other.is_empty());

    // deleting across owners is NotFound even for a real id
    let id: i64 = conn
        .query_row("SELECT id FROM transactions LIMIT 1", [], |r| r.get(0))
        .unwrap();
    let tx = conn.transaction().unwrap();
    assert!(rollup::delete_transaction(&tx, "u2", id).is_err());
}

#[test]
fn snapshot_fields_are_copied_onto_the_row() {
    let mut conn = setup();
    let id = add(&mut conn, "u1", "2024-03-05", TxKind::Expense, "9.99", "Groceries");
    let row = rollup::find_transaction(&conn, "u1", id).unwrap().unwrap();
    assert_eq!(row.category, "Groceries");
    assert_eq!(row.category_icon, "🛒");
    assert_eq!(row.kind, TxKind::Expense);
    assert_eq!(row.amount, dec("9.99"));
}
