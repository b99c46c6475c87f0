// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ledgerly::{cli, commands::transactions};
use rusqlite::Connection;

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

fn run(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    match matches.subcommand() {
        Some(("tx", sub)) => transactions::handle(conn, sub),
        _ => panic!("no tx subcommand"),
    }
}

fn list_rows(conn: &Connection, args: &[&str]) -> Vec<transactions::TransactionRow> {
    let matches = cli::build_cli().get_matches_from(args);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    transactions::query_rows(conn, list_m).unwrap()
}

#[test]
fn add_then_list_newest_first_with_limit() {
    let mut conn = setup();
    for day in ["2025-01-01", "2025-01-02", "2025-01-03"] {
        run(&mut conn, &[
            "ledgerly", "--user", "u1", "tx", "add",
            "--date", day, "--amount", "10", "--type", "expense", "--category", "Groceries",
        ])
        .unwrap();
    }

    let rows = list_rows(&conn, &["ledgerly", "--user", "u1", "tx", "list", "--limit", "2"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2025-01-03");
    assert_eq!(rows[0].category_icon, "🛒");
}

#[test]
fn list_filters_by_month_category_and_type() {
    let mut conn = setup();
    run(&mut conn, &[
        "ledgerly", "--user", "u1", "tx", "add",
        "--date", "2025-01-15", "--amount", "10", "--type", "expense", "--category", "Groceries",
    ])
    .unwrap();
    run(&mut conn, &[
        "ledgerly", "--user", "u1", "tx", "add",
        "--date", "2025-02-15", "--amount", "900", "--type", "income", "--category", "Salary",
        "--description", "payday",
    ])
    .unwrap();

    let rows = list_rows(&conn, &["ledgerly", "--user", "u1", "tx", "list", "--month", "2025-02"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "payday");

    let rows = list_rows(&conn, &["ledgerly", "--user", "u1", "tx", "list", "--type", "expense"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, "Groceries");

    let rows = list_rows(&conn, &["ledgerly", "--user", "u1", "tx", "list", "--category", "Salary"]);
    assert_eq!(rows.len(), 1);

    // non-zero-padded month selectors match the same rows
    let rows = list_rows(&conn, &["ledgerly", "--user", "u1", "tx", "list", "--month", "2025-2"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "payday");
}

#[test]
fn add_rejects_bad_inputs_before_the_store() {
    let mut conn = setup();
    // malformed date
    assert!(run(&mut conn, &[
        "ledgerly", "--user", "u1", "tx", "add",
        "--date", "2025-13-40", "--amount", "10", "--type", "expense", "--category", "Groceries",
    ])
    .is_err());
    // zero amount
    assert!(run(&mut conn, &[
        "ledgerly", "--user", "u1", "tx", "add",
        "--date", "2025-01-01", "--amount", "0", "--type", "expense", "--category", "Groceries",
    ])
    .is_err());
    // unknown type
    assert!(run(&mut conn, &[
        "ledgerly", "--user", "u1", "tx", "add",
        "--date", "2025-01-01", "--amount", "10", "--type", "transfer", "--category", "Groceries",
    ])
    .is_err());
    // no user
    assert!(run(&mut conn, &[
        "ledgerly", "tx", "add",
        "--date", "2025-01-01", "--amount", "10", "--type", "expense", "--category", "Groceries",
    ])
    .is_err());

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn rm_updates_rollups_atomically() {
    let mut conn = setup();
    run(&mut conn, &[
        "ledgerly", "--user", "u1", "tx", "add",
        "--date", "2025-01-15", "--amount", "10", "--type", "expense", "--category", "Groceries",
    ])
    .unwrap();
    let id: i64 = conn
        .query_row("SELECT id FROM transactions LIMIT 1", [], |r| r.get(0))
        .unwrap();

    run(&mut conn, &["ledgerly", "--user", "u1", "tx", "rm", "--id", &id.to_string()]).unwrap();

    let rows = list_rows(&conn, &["ledgerly", "--user", "u1", "tx", "list"]);
    assert!(rows.is_empty());
    let issues = ledgerly::commands::doctor::scan(&conn, Some("u1")).unwrap();
    assert!(issues.is_empty(), "unexpected issues: {:?}", issues);

    // second delete of the same id reports not found
    assert!(run(&mut conn, &["ledgerly", "--user", "u1", "tx", "rm", "--id", &id.to_string()]).is_err());
}

#[test]
fn amount_parsing_rules() {
    assert!(ledgerly::utils::parse_amount("12.50").is_ok());
    assert!(ledgerly::utils::parse_amount("0").is_err());
    assert!(ledgerly::utils::parse_amount("-3").is_err());
    assert!(ledgerly::utils::parse_amount("ten").is_err());
}
