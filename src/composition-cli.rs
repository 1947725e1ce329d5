//! A simple CLI tool for checking whether a team line-up may register.
//! This uses the server's own composition validator, and accepts the same
//! `{ memberId, role }` records the API reports.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use roborumble_backend::model::team::{CompositionReport, Finding, Membership, RoleExcess};

const PROGRAM_NAME: &str = "check-composition";

const ABOUT_TEXT: &str = "Check a RoboRumble team line-up against the role table.

EXIT CODES:
     0: The team may register.
   255: Ran successfully, but the team may not register.
 Other: Error.";

const LINEUP_PATH: &str = "LINEUP_PATH";

const LINEUP_PATH_HELP: &str = "The path to a JSON array of memberships,\n\
each of the form `{ \"memberId\": \"...\", \"role\": \"...\" }`";

const JSON: &str = "json";

const JSON_HELP: &str = "Print the full composition report as JSON instead of text";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(LINEUP_PATH)
                .help(LINEUP_PATH_HELP)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(JSON)
                .long(JSON)
                .help(JSON_HELP)
                .action(ArgAction::SetTrue),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the line-up.
    Format(String),
}

/// A finding, worded for the terminal.
struct Friendly<'a>(&'a Finding);

impl Display for Friendly<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Finding::TeamTooSmall { size, min } => {
                write!(f, "Team has {size} member(s); at least {min} are needed.")
            }
            Finding::TeamTooLarge { size, max } => {
                write!(f, "Team has {size} members; at most {max} are allowed.")
            }
            Finding::MissingRequiredRoles { roles } => {
                let roles = roles.iter().map(|r| r.as_str()).collect::<Vec<_>>();
                write!(f, "Nobody holds: {}.", roles.join(", "))
            }
            Finding::RolesExceeded { roles } => {
                let roles = roles
                    .iter()
                    .map(|RoleExcess { role, count, cap }| format!("{role} ({count}/{cap})"))
                    .collect::<Vec<_>>();
                write!(f, "Too many members in: {}.", roles.join(", "))
            }
        }
    }
}

/// Load a line-up and evaluate it.
fn check(path: &str) -> Result<CompositionReport, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let memberships: Vec<Membership> =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    // A member can only hold one role.
    let mut seen = HashSet::with_capacity(memberships.len());
    for membership in &memberships {
        if !seen.insert(&membership.member_id) {
            return Err(Error::Format(format!(
                "member {} appears more than once",
                membership.member_id
            )));
        }
    }

    Ok(CompositionReport::evaluate(&memberships))
}

/// Print the report as text.
fn print_report(report: &CompositionReport) {
    println!("Team size: {}", report.size);
    for status in &report.roles {
        let flag = if status.exceeded {
            " (exceeded)"
        } else if status.full {
            " (full)"
        } else {
            ""
        };
        println!("  {}: {}/{}{}", status.role, status.count, status.cap, flag);
    }
    if report.unrecognised > 0 {
        println!(
            "  {} member(s) with unrecognised roles",
            report.unrecognised
        );
    }
    if report.registrable {
        println!("The team may register.");
    } else {
        println!("The team may not register:");
        for finding in &report.findings {
            println!("  {}", Friendly(finding));
        }
    }
}

/// Run the check, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(LINEUP_PATH).unwrap(); // Required argument is guaranteed to be present.
    match check(path) {
        Ok(report) => {
            if args.get_flag(JSON) {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        println!("Failed to encode report: {e}");
                        return 1;
                    }
                }
            } else {
                print_report(&report);
            }
            if report.registrable {
                0
            } else {
                255
            }
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {msg}");
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid line-up: {msg}");
            1
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
