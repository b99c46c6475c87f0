// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::utils::{maybe_print_json, parse_date, pretty_table, require_user};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balance", sub)) => balance(conn, sub)?,
        Some(("by-category", sub)) => by_category(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn range(sub: &clap::ArgMatches) -> Result<(NaiveDate, NaiveDate)> {
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    if from > to {
        bail!("Invalid range: {} is after {}", from, to);
    }
    Ok((from, to))
}

#[derive(Serialize)]
pub struct BalanceStats {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

pub fn balance_stats(
    conn: &Connection,
    user: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<BalanceStats> {
    let mut stmt = conn.prepare(
        "SELECT type, amount FROM transactions
         WHERE user_id=?1 AND date>=?2 AND date<=?3",
    )?;
    let mut rows = stmt.query(params![user, from.to_string(), to.to_string()])?;
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let type_s: String = r.get(0)?;
        let amount_s: String = r.get(1)?;
        let amount = amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transactions", amount_s))?;
        match type_s.parse::<TxKind>()? {
            TxKind::Income => income += amount,
            TxKind::Expense => expense += amount,
        }
    }
    Ok(BalanceStats {
        income,
        expense,
        balance: income - expense,
    })
}

fn balance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = require_user(sub)?;
    let (from, to) = range(sub)?;
    let stats = balance_stats(conn, &user, from, to)?;
    if !maybe_print_json(json_flag, jsonl_flag, &stats)? {
        let rows = vec![vec![
            stats.income.to_string(),
            stats.expense.to_string(),
            stats.balance.to_string(),
        ]];
        println!("{}", pretty_table(&["Income", "Expense", "Balance"], rows));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub category_icon: String,
    pub amount: Decimal,
}

pub fn category_stats(
    conn: &Connection,
    user: &str,
    kind: TxKind,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CategoryStat>> {
    let mut stmt = conn.prepare(
        "SELECT category, category_icon, amount FROM transactions
         WHERE user_id=?1 AND type=?2 AND date>=?3 AND date<=?4",
    )?;
    let mut rows = stmt.query(params![
        user,
        kind.as_str(),
        from.to_string(),
        to.to_string()
    ])?;
    let mut sums: BTreeMap<(String, String), Decimal> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let category: String = r.get(0)?;
        let icon: String = r.get(1)?;
        let amount_s: String = r.get(2)?;
        let amount = amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' for category {}", amount_s, category))?;
        *sums.entry((category, icon)).or_insert(Decimal::ZERO) += amount;
    }

    let mut stats: Vec<CategoryStat> = sums
        .into_iter()
        .map(|((category, category_icon), amount)| CategoryStat {
            category,
            category_icon,
            amount,
        })
        .collect();
    stats.sort_by(|a, b| b.amount.cmp(&a.amount));
    Ok(stats)
}

fn by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = require_user(sub)?;
    let kind: TxKind = sub.get_one::<String>("type").unwrap().parse()?;
    let (from, to) = range(sub)?;
    let stats = category_stats(conn, &user, kind, from, to)?;
    if !maybe_print_json(json_flag, jsonl_flag, &stats)? {
        let rows: Vec<Vec<String>> = stats
            .iter()
            .map(|s| {
                vec![
                    format!("{} {}", s.category_icon, s.category),
                    s.amount.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Total"], rows));
    }
    Ok(())
}
