// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ledgerly::db;

#[test]
fn open_at_creates_schema_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledgerly.sqlite");

    let conn = db::open_at(&path).unwrap();
    for table in ["categories", "transactions", "daily_history", "monthly_history"] {
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(n, 1, "missing table {}", table);
    }
}

#[test]
fn reopening_keeps_data_and_schema_init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledgerly.sqlite");

    let conn = db::open_at(&path).unwrap();
    conn.execute(
        "INSERT INTO categories(user_id, name, type, icon) VALUES ('u1', 'Salary', 'income', '💰')",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = db::open_at(&path).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}
