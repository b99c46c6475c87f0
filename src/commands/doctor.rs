// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::utils::pretty_table;
use anyhow::{Context, Result};
use chrono::Datelike;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

type DailyKey = (String, i32, u32, u32);
type MonthlyKey = (String, i32, u32);

/// Recompute day and month sums from the ledger and diff them against the
/// rollup tables. Drifted, missing or negative rollup rows are reported;
/// with `--user` the scan is limited to one owner.
pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user_filter = m.get_one::<String>("user").cloned();
    let issues = scan(conn, user_filter.as_deref())?;

    if issues.is_empty() {
        println!("✅ doctor: rollups match the ledger");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], issues));
    }
    Ok(())
}

pub fn scan(conn: &Connection, user_filter: Option<&str>) -> Result<Vec<Vec<String>>> {
    let mut expected_daily: BTreeMap<DailyKey, (Decimal, Decimal)> = BTreeMap::new();
    let mut expected_monthly: BTreeMap<MonthlyKey, (Decimal, Decimal)> = BTreeMap::new();

    let mut sql = String::from("SELECT user_id, date, amount, type FROM transactions");
    if user_filter.is_some() {
        sql.push_str(" WHERE user_id=?1");
    }
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match user_filter {
        Some(u) => stmt.query([u])?,
        None => stmt.query([])?,
    };
    while let Some(r) = rows.next()? {
        let user: String = r.get(0)?;
        let date_s: String = r.get(1)?;
        let amount_s: String = r.get(2)?;
        let type_s: String = r.get(3)?;
        let date = chrono::NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' in transactions", date_s))?;
        let amount = amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transactions", amount_s))?;
        let kind: TxKind = type_s.parse()?;

        let dk = (user.clone(), date.year(), date.month0(), date.day());
        let mk = (user, date.year(), date.month0());
        let de = expected_daily.entry(dk).or_default();
        let me = expected_monthly.entry(mk).or_default();
        match kind {
            TxKind::Income => {
                de.0 += amount;
                me.0 += amount;
            }
            TxKind::Expense => {
                de.1 += amount;
                me.1 += amount;
            }
        }
    }

    let mut issues = Vec::new();
    check_daily(conn, user_filter, &mut expected_daily, &mut issues)?;
    check_monthly(conn, user_filter, &mut expected_monthly, &mut issues)?;

    // anything the ledger expects but no rollup row covers
    for ((user, y, m, d), (inc, exp)) in expected_daily {
        issues.push(vec![
            "missing_daily_rollup".into(),
            format!("{} {:04}-{:02}-{:02} income={} expense={}", user, y, m + 1, d, inc, exp),
        ]);
    }
    for ((user, y, m), (inc, exp)) in expected_monthly {
        issues.push(vec![
            "missing_monthly_rollup".into(),
            format!("{} {:04}-{:02} income={} expense={}", user, y, m + 1, inc, exp),
        ]);
    }
    Ok(issues)
}

fn check_daily(
    conn: &Connection,
    user_filter: Option<&str>,
    expected: &mut BTreeMap<DailyKey, (Decimal, Decimal)>,
    issues: &mut Vec<Vec<String>>,
) -> Result<()> {
    let mut sql =
        String::from("SELECT user_id, year, month, day, income, expense FROM daily_history");
    if user_filter.is_some() {
        sql.push_str(" WHERE user_id=?1");
    }
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match user_filter {
        Some(u) => stmt.query([u])?,
        None => stmt.query([])?,
    };
    while let Some(r) = rows.next()? {
        let user: String = r.get(0)?;
        let year: i32 = r.get(1)?;
        let month: u32 = r.get(2)?;
        let day: u32 = r.get(3)?;
        let income = parse_field(&r.get::<_, String>(4)?, "daily_history.income")?;
        let expense = parse_field(&r.get::<_, String>(5)?, "daily_history.expense")?;
        let label = format!("{} {:04}-{:02}-{:02}", user, year, month + 1, day);

        if income < Decimal::ZERO || expense < Decimal::ZERO {
            issues.push(vec![
                "negative_daily_rollup".into(),
                format!("{} income={} expense={}", label, income, expense),
            ]);
        }
        let (want_inc, want_exp) = expected
            .remove(&(user, year, month, day))
            .unwrap_or_default();
        if income != want_inc || expense != want_exp {
            issues.push(vec![
                "daily_drift".into(),
                format!(
                    "{} has income={} expense={}, ledger says income={} expense={}",
                    label, income, expense, want_inc, want_exp
                ),
            ]);
        }
    }
    Ok(())
}

fn check_monthly(
    conn: &Connection,
    user_filter: Option<&str>,
    expected: &mut BTreeMap<MonthlyKey, (Decimal, Decimal)>,
    issues: &mut Vec<Vec<String>>,
) -> Result<()> {
    let mut sql = String::from("SELECT user_id, year, month, income, expense FROM monthly_history");
    if user_filter.is_some() {
        sql.push_str(" WHERE user_id=?1");
    }
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match user_filter {
        Some(u) => stmt.query([u])?,
        None => stmt.query([])?,
    };
    while let Some(r) = rows.next()? {
        let user: String = r.get(0)?;
        let year: i32 = r.get(1)?;
        let month: u32 = r.get(2)?;
        let income = parse_field(&r.get::<_, String>(3)?, "monthly_history.income")?;
        let expense = parse_field(&r.get::<_, String>(4)?, "monthly_history.expense")?;
        let label = format!("{} {:04}-{:02}", user, year, month + 1);

        if income < Decimal::ZERO || expense < Decimal::ZERO {
            issues.push(vec![
                "negative_monthly_rollup".into(),
                format!("{} income={} expense={}", label, income, expense),
            ]);
        }
        let (want_inc, want_exp) = expected.remove(&(user, year, month)).unwrap_or_default();
        if income != want_inc || expense != want_exp {
            issues.push(vec![
                "monthly_drift".into(),
                format!(
                    "{} has income={} expense={}, ledger says income={} expense={}",
                    label, income, expense, want_inc, want_exp
                ),
            ]);
        }
    }
    Ok(())
}

fn parse_field(s: &str, field: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}' in {}", s, field))
}
