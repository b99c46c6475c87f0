// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Incremental rollup engine: every ledger write applies the same delta to
//! the per-day and per-month history tables inside one database transaction,
//! and reads re-expand those rollups into dense, gap-free series.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Category, Transaction as Tx, TxKind};
use crate::utils::days_in_month;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RollupError {
    #[error("Category '{0}' not found")]
    CategoryNotFound(String),
    #[error("Transaction {0} not found")]
    TransactionNotFound(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Month,
    Year,
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(Timeframe::Month),
            "year" => Ok(Timeframe::Year),
            other => bail!("Invalid timeframe '{}', expected 'month' or 'year'", other),
        }
    }
}

/// Period selector; `month` is 0-based and only consulted for
/// `Timeframe::Month`.
#[derive(Debug, Clone, Copy)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub year: i32,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Record a ledger entry and fold its amount into both rollup levels.
///
/// Must run inside the caller's transaction: the ledger insert and the two
/// rollup upserts commit together or not at all. The category name and icon
/// are copied onto the row as a snapshot. Returns the new transaction id.
pub fn record_transaction(
    tx: &Transaction,
    user: &str,
    date: NaiveDate,
    kind: TxKind,
    amount: Decimal,
    description: &str,
    category: &str,
) -> Result<i64> {
    let cat = find_category(tx, user, category, kind)?
        .ok_or_else(|| RollupError::CategoryNotFound(category.to_string()))?;

    tx.execute(
        "INSERT INTO transactions(user_id, date, amount, type, description, category, category_icon)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user,
            date.to_string(),
            amount.to_string(),
            kind.as_str(),
            description,
            cat.name,
            cat.icon
        ],
    )?;
    let id = tx.last_insert_rowid();
    apply_delta(tx, user, date, kind, amount)?;
    Ok(id)
}

pub fn find_category(
    conn: &Connection,
    user: &str,
    name: &str,
    kind: TxKind,
) -> Result<Option<Category>> {
    let cat = conn
        .query_row(
            "SELECT id, name, icon FROM categories WHERE user_id=?1 AND name=?2 AND type=?3",
            params![user, name, kind.as_str()],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?
        .map(|(id, name, icon)| Category {
            id,
            user_id: user.to_string(),
            name,
            kind,
            icon,
        });
    Ok(cat)
}

/// Remove a ledger entry and subtract its amount from both rollup levels,
/// within the caller's transaction.
pub fn delete_transaction(tx: &Transaction, user: &str, id: i64) -> Result<()> {
    let row = find_transaction(tx, user, id)?.ok_or(RollupError::TransactionNotFound(id))?;

    tx.execute(
        "DELETE FROM transactions WHERE user_id=?1 AND id=?2",
        params![user, id],
    )?;
    apply_delta(tx, user, row.date, row.kind, -row.amount)
}

pub fn find_transaction(conn: &Connection, user: &str, id: i64) -> Result<Option<Tx>> {
    let row: Option<(String, String, String, String, String, String)> = conn
        .query_row(
            "SELECT date, amount, type, description, category, category_icon
             FROM transactions WHERE user_id=?1 AND id=?2",
            params![user, id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                ))
            },
        )
        .optional()?;
    let Some((date_s, amount_s, type_s, description, category, category_icon)) = row else {
        return Ok(None);
    };

    let date = NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
        .with_context(|| format!("Invalid stored date '{}' on transaction {}", date_s, id))?;
    let amount = amount_s
        .parse::<Decimal>()
        .with_context(|| format!("Invalid stored amount '{}' on transaction {}", amount_s, id))?;
    let kind: TxKind = type_s.parse()?;
    Ok(Some(Tx {
        id,
        user_id: user.to_string(),
        date,
        amount,
        kind,
        description,
        category,
        category_icon,
    }))
}

/// Apply a signed amount to the (user, day) and (user, month) rollup rows.
/// Income and expense deltas are mutually exclusive per call.
fn apply_delta(
    tx: &Transaction,
    user: &str,
    date: NaiveDate,
    kind: TxKind,
    amount: Decimal,
) -> Result<()> {
    let (year, month, day) = (date.year(), date.month0(), date.day());
    let (d_income, d_expense) = match kind {
        TxKind::Income => (amount, Decimal::ZERO),
        TxKind::Expense => (Decimal::ZERO, amount),
    };

    let daily: Option<(String, String)> = tx
        .query_row(
            "SELECT income, expense FROM daily_history
             WHERE user_id=?1 AND year=?2 AND month=?3 AND day=?4",
            params![user, year, month, day],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    match daily {
        Some((income_s, expense_s)) => {
            let income = parse_sum(&income_s, "daily_history.income")? + d_income;
            let expense = parse_sum(&expense_s, "daily_history.expense")? + d_expense;
            tx.execute(
                "UPDATE daily_history SET income=?5, expense=?6
                 WHERE user_id=?1 AND year=?2 AND month=?3 AND day=?4",
                params![user, year, month, day, income.to_string(), expense.to_string()],
            )?;
        }
        None => {
            tx.execute(
                "INSERT INTO daily_history(user_id, year, month, day, income, expense)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![user, year, month, day, d_income.to_string(), d_expense.to_string()],
            )?;
        }
    }

    let monthly: Option<(String, String)> = tx
        .query_row(
            "SELECT income, expense FROM monthly_history
             WHERE user_id=?1 AND year=?2 AND month=?3",
            params![user, year, month],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    match monthly {
        Some((income_s, expense_s)) => {
            let income = parse_sum(&income_s, "monthly_history.income")? + d_income;
            let expense = parse_sum(&expense_s, "monthly_history.expense")? + d_expense;
            tx.execute(
                "UPDATE monthly_history SET income=?4, expense=?5
                 WHERE user_id=?1 AND year=?2 AND month=?3",
                params![user, year, month, income.to_string(), expense.to_string()],
            )?;
        }
        None => {
            tx.execute(
                "INSERT INTO monthly_history(user_id, year, month, income, expense)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user, year, month, d_income.to_string(), d_expense.to_string()],
            )?;
        }
    }
    Ok(())
}

fn parse_sum(s: &str, field: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}' in {}", s, field))
}

/// Expand the rollups for one period into a dense ordered series.
///
/// A year expands to exactly 12 rows (months 0..=11), a month to exactly
/// `days_in_month` rows (days 1..=N), missing units zero-filled so charts
/// always get a complete axis. A period with no rollup rows at all yields an
/// empty series.
pub fn history(
    conn: &Connection,
    user: &str,
    timeframe: Timeframe,
    period: Period,
) -> Result<Vec<HistoryRow>> {
    match timeframe {
        Timeframe::Year => yearly_history(conn, user, period.year),
        Timeframe::Month => monthly_history(conn, user, period.year, period.month),
    }
}

fn yearly_history(conn: &Connection, user: &str, year: i32) -> Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT month, income, expense FROM monthly_history
         WHERE user_id=?1 AND year=?2 ORDER BY month",
    )?;
    let sums = collect_sums(&mut stmt, params![user, year])?;
    if sums.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(12);
    for month in 0..12u32 {
        let (income, expense) = sums.get(&month).cloned().unwrap_or_default();
        rows.push(HistoryRow {
            year,
            month,
            day: None,
            income,
            expense,
        });
    }
    Ok(rows)
}

fn monthly_history(conn: &Connection, user: &str, year: i32, month: u32) -> Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT day, income, expense FROM daily_history
         WHERE user_id=?1 AND year=?2 AND month=?3 ORDER BY day",
    )?;
    let sums = collect_sums(&mut stmt, params![user, year, month])?;
    if sums.is_empty() {
        return Ok(Vec::new());
    }

    let days = days_in_month(year, month)?;
    let mut rows = Vec::with_capacity(days as usize);
    for day in 1..=days {
        let (income, expense) = sums.get(&day).cloned().unwrap_or_default();
        rows.push(HistoryRow {
            year,
            month,
            day: Some(day),
            income,
            expense,
        });
    }
    Ok(rows)
}

fn collect_sums(
    stmt: &mut rusqlite::Statement<'_>,
    params: impl rusqlite::Params,
) -> Result<BTreeMap<u32, (Decimal, Decimal)>> {
    let mut cur = stmt.query(params)?;
    let mut sums = BTreeMap::new();
    while let Some(r) = cur.next()? {
        let unit: u32 = r.get(0)?;
        let income_s: String = r.get(1)?;
        let expense_s: String = r.get(2)?;
        sums.insert(
            unit,
            (
                parse_sum(&income_s, "history.income")?,
                parse_sum(&expense_s, "history.expense")?,
            ),
        );
    }
    Ok(sums)
}

/// Distinct years the owner has rollup data for, ascending. Falls back to the
/// current UTC year so period selectors are never empty.
pub fn available_years(conn: &Connection, user: &str) -> Result<Vec<i32>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT year FROM monthly_history WHERE user_id=?1 ORDER BY year")?;
    let rows = stmt.query_map(params![user], |r| r.get::<_, i32>(0))?;
    let mut years = Vec::new();
    for y in rows {
        years.push(y?);
    }
    if years.is_empty() {
        years.push(Utc::now().year());
    }
    Ok(years)
}
