// Copyright (c) 2025 Ledgerly.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("ledgerly")
        .about("Personal finance ledger with incremental daily/monthly rollup histories")
        .version(clap::crate_version!())
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .global(true)
                .num_args(1)
                .help("Owner id; required by every command that touches data"),
        )
        .subcommand(Command::new("init").about("Create the database if it does not exist"))
        .subcommand(
            Command::new("category")
                .about("Manage emoji-tagged income/expense categories")
                .subcommand(
                    Command::new("add")
                        .about("Add a category (unique per user, name and type)")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("type").long("type").required(true).help("income or expense"))
                        .arg(Arg::new("icon").long("icon").default_value("")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List categories")
                        .arg(Arg::new("type").long("type").help("Filter by income or expense")),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a category; past transactions keep their snapshot")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("type").long("type").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record, delete and list ledger transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction and update both rollup histories")
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("amount").long("amount").required(true).help("Positive decimal"))
                        .arg(Arg::new("type").long("type").required(true).help("income or expense"))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("description").long("description").default_value("")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction and roll its amount back out")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions, newest first")
                        .arg(Arg::new("month").long("month").help("Filter by YYYY-MM"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("type").long("type"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("history")
                .about("Dense gap-filled income/expense series for charting")
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show one period as a complete day or month series")
                        .arg(
                            Arg::new("timeframe")
                                .long("timeframe")
                                .required(true)
                                .help("month or year"),
                        )
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .required(true)
                                .value_parser(value_parser!(i32).range(2000..=2099)),
                        )
                        .arg(
                            Arg::new("month")
                                .long("month")
                                .default_value("0")
                                .value_parser(value_parser!(u32).range(0..=11))
                                .help("0-based month, used with --timeframe month"),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("periods").about("Years with any recorded history"),
                )),
        )
        .subcommand(
            Command::new("stats")
                .about("Aggregated totals over a date range")
                .subcommand(json_flags(
                    Command::new("balance")
                        .about("Income, expense and net balance between two dates")
                        .arg(Arg::new("from").long("from").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("to").long("to").required(true).help("YYYY-MM-DD")),
                ))
                .subcommand(json_flags(
                    Command::new("by-category")
                        .about("Per-category totals between two dates")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(Arg::new("type").long("type").required(true).help("income or expense")),
                )),
        )
        .subcommand(
            Command::new("doctor")
                .about("Check that the rollup histories still match the ledger"),
        )
}
