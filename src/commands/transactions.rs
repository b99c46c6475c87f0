// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::rollup;
use crate::utils::{maybe_print_json, parse_amount, parse_date, parse_month, pretty_table, require_user};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = require_user(sub)?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let kind: TxKind = sub.get_one::<String>("type").unwrap().parse()?;
    let category = sub.get_one::<String>("category").unwrap();
    let description = sub.get_one::<String>("description").unwrap();

    let tx = conn.transaction()?;
    let id = rollup::record_transaction(&tx, &user, date, kind, amount, description, category)?;
    tx.commit()?;
    println!(
        "Recorded {} {} on {} in '{}' (id {})",
        kind, amount, date, category, id
    );
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = require_user(sub)?;
    let id = *sub.get_one::<i64>("id").unwrap();

    let tx = conn.transaction()?;
    rollup::delete_transaction(&tx, &user, id)?;
    tx.commit()?;
    println!("Deleted transaction {}", id);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.r#type.clone(),
                    r.amount.clone(),
                    format!("{} {}", r.category_icon, r.category),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Type", "Amount", "Category", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub r#type: String,
    pub amount: String,
    pub category: String,
    pub category_icon: String,
    pub description: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let user = require_user(sub)?;
    let mut sql = String::from(
        "SELECT id, date, type, amount, category, category_icon, description
         FROM transactions WHERE user_id=?",
    );
    let mut params_vec: Vec<String> = vec![user];

    if let Some(month) = sub.get_one::<String>("month") {
        // normalize so '2025-2' filters the same rows as '2025-02'
        let (year, month0) = parse_month(month)?;
        sql.push_str(" AND substr(date,1,7)=?");
        params_vec.push(format!("{:04}-{:02}", year, month0 + 1));
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND category=?");
        params_vec.push(cat.into());
    }
    if let Some(kind) = sub.get_one::<String>("type") {
        let kind: TxKind = kind.parse()?;
        sql.push_str(" AND type=?");
        params_vec.push(kind.as_str().to_string());
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            r#type: r.get(2)?,
            amount: r.get(3)?,
            category: r.get(4)?,
            category_icon: r.get(5)?,
            description: r.get(6)?,
        });
    }
    Ok(data)
}
