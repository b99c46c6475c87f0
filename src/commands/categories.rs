// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::utils::{maybe_print_json, pretty_table, require_user};
use anyhow::{Result, bail};
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = require_user(sub)?;
    let name = sub.get_one::<String>("name").unwrap();
    let kind: TxKind = sub.get_one::<String>("type").unwrap().parse()?;
    let icon = sub.get_one::<String>("icon").unwrap();

    if name.chars().count() < 3 || name.chars().count() > 20 {
        bail!("Category name '{}' must be 3 to 20 characters", name);
    }
    if icon.chars().count() > 20 {
        bail!("Category icon must be at most 20 characters");
    }

    let n = conn.execute(
        "INSERT OR IGNORE INTO categories(user_id, name, type, icon) VALUES (?1, ?2, ?3, ?4)",
        params![user, name, kind.as_str(), icon],
    )?;
    if n == 0 {
        bail!("Category '{}' ({}) already exists", name, kind);
    }
    println!("Added {} category '{}' {}", kind, name, icon);
    Ok(())
}

#[derive(Serialize)]
pub struct CategoryRow {
    pub name: String,
    pub r#type: String,
    pub icon: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|c| vec![c.icon.clone(), c.name.clone(), c.r#type.clone()])
            .collect();
        println!("{}", pretty_table(&["Icon", "Name", "Type"], rows));
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<CategoryRow>> {
    let user = require_user(sub)?;
    let mut sql = String::from(
        "SELECT name, type, icon FROM categories WHERE user_id=?1",
    );
    let mut params_vec: Vec<String> = vec![user];
    if let Some(kind) = sub.get_one::<String>("type") {
        let kind: TxKind = kind.parse()?;
        sql.push_str(" AND type=?2");
        params_vec.push(kind.as_str().to_string());
    }
    sql.push_str(" ORDER BY type, name");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(CategoryRow {
            name: r.get(0)?,
            r#type: r.get(1)?,
            icon: r.get(2)?,
        });
    }
    Ok(data)
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = require_user(sub)?;
    let name = sub.get_one::<String>("name").unwrap();
    let kind: TxKind = sub.get_one::<String>("type").unwrap().parse()?;

    // Past transactions keep their snapshotted name/icon; nothing cascades.
    let n = conn.execute(
        "DELETE FROM categories WHERE user_id=?1 AND name=?2 AND type=?3",
        params![user, name, kind.as_str()],
    )?;
    if n == 0 {
        bail!("Category '{}' ({}) not found", name, kind);
    }
    println!("Removed {} category '{}'", kind, name);
    Ok(())
}
