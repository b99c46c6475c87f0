// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::rollup::{self, Period, Timeframe};
use crate::utils::{maybe_print_json, pretty_table, require_user};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(conn, sub)?,
        Some(("periods", sub)) => periods(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = require_user(sub)?;
    let timeframe: Timeframe = sub.get_one::<String>("timeframe").unwrap().parse()?;
    let period = Period {
        year: *sub.get_one::<i32>("year").unwrap(),
        month: *sub.get_one::<u32>("month").unwrap(),
    };

    let data = rollup::history(conn, &user, timeframe, period)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        match timeframe {
            Timeframe::Month => {
                let rows: Vec<Vec<String>> = data
                    .iter()
                    .filter_map(|r| {
                        let day = r.day?;
                        Some(vec![
                            format!("{:04}-{:02}-{:02}", r.year, r.month + 1, day),
                            r.income.to_string(),
                            r.expense.to_string(),
                        ])
                    })
                    .collect();
                println!("{}", pretty_table(&["Day", "Income", "Expense"], rows));
            }
            Timeframe::Year => {
                let rows: Vec<Vec<String>> = data
                    .iter()
                    .map(|r| {
                        vec![
                            format!("{:04}-{:02}", r.year, r.month + 1),
                            r.income.to_string(),
                            r.expense.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Month", "Income", "Expense"], rows));
            }
        }
    }
    Ok(())
}

fn periods(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = require_user(sub)?;
    let years = rollup::available_years(conn, &user)?;
    if !maybe_print_json(json_flag, jsonl_flag, &years)? {
        let rows = years.iter().map(|y| vec![y.to_string()]).collect();
        println!("{}", pretty_table(&["Year"], rows));
    }
    Ok(())
}
