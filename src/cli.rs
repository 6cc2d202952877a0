// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

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
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn id_arg() -> Arg {
    Arg::new("id").required(true).help("Record id")
}

fn transaction_fields(cmd: Command, required: bool) -> Command {
    let field: fn(&'static str, &'static str) -> Arg = if required { req } else { opt };
    cmd.arg(field("amount", "Signed amount; negative for expenses").allow_negative_numbers(true))
        .arg(field("date", "YYYY-MM-DD or RFC 3339 timestamp"))
        .arg(opt("description", "Free text"))
        .arg(field("category", "Category, e.g. food or housing"))
        .arg(opt("type", "Expense type: obligatoire|loisir|epargne"))
        .arg(opt("recurring", "Mark as recurring (true|false)"))
}

fn recurring_fields(cmd: Command, required: bool) -> Command {
    let field: fn(&'static str, &'static str) -> Arg = if required { req } else { opt };
    cmd.arg(field("name", "Label"))
        .arg(field("amount", "Monthly amount, positive"))
        .arg(field("day", "Day of month (1-31)"))
        .arg(field("category", "Category"))
        .arg(opt("active", "Whether the payment is active (true|false)"))
}

fn project_fields(cmd: Command, required: bool) -> Command {
    let field: fn(&'static str, &'static str) -> Arg = if required { req } else { opt };
    cmd.arg(field("name", "Label"))
        .arg(field("target", "Target amount"))
        .arg(opt("current", "Amount saved so far"))
        .arg(field("deadline", "Target date YYYY-MM-DD"))
        .arg(field("category", "Category"))
}

pub fn build_cli() -> Command {
    Command::new("fynn")
        .about("Personal finance tracking: transactions, recurring payments and savings projects")
        .version(crate_version!())
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .help("User id (defaults to FYNN_USER)"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the profile and summary for a user")
                .arg(req("name", "Display name"))
                .arg(req("email", "Email address")),
        )
        .subcommand(
            Command::new("profile")
                .about("Show or edit the profile")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(opt("name", "Display name"))
                        .arg(opt("avatar", "Avatar URL"))
                        .arg(
                            Arg::new("clear-avatar")
                                .long("clear-avatar")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("avatar"),
                        ),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Show or edit the financial summary")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(opt("balance", "Current balance").allow_negative_numbers(true))
                        .arg(opt("health", "good|warning|danger")),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(transaction_fields(Command::new("add"), true))
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(clap::value_parser!(usize)),
                    ),
                ))
                .subcommand(transaction_fields(Command::new("edit").arg(id_arg()), false))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring payments")
                .subcommand(recurring_fields(Command::new("add"), true))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(recurring_fields(Command::new("edit").arg(id_arg()), false))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("project")
                .about("Savings projects")
                .subcommand(project_fields(Command::new("add"), true))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(project_fields(Command::new("edit").arg(id_arg()), false))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(json_flags(
            Command::new("stats")
                .about("Totals, top categories, 50/30/20 split and upcoming payments")
                .arg(
                    Arg::new("top")
                        .long("top")
                        .value_parser(clap::value_parser!(usize))
                        .help("Number of categories to show"),
                )
                .arg(opt("today", "Reference date YYYY-MM-DD (defaults to today)")),
        ))
        .subcommand(
            Command::new("recalc").about("Recompute and persist the summary totals"),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .arg(req("format", "csv|json"))
                        .arg(req("out", "Output file")),
                ),
        )
}
