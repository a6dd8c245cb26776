//! SRS Archive Manager

use anyhow::{bail, Error};
use clap::{Arg, ArgAction, ArgMatches, Command};
use rstn_srs::{Archive, CommonCmdLineArgs, Site};
use std::path::PathBuf;

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);

        for cause in e.chain().skip(1) {
            println!("caused by: {}", cause);
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let app = CommonCmdLineArgs::new_app("srsam", "Manage an SRS file archive.")
        .subcommand_required(true)
        .subcommand(
            Command::new("create")
                .about("Create a new archive. Ignores all global options except --root.")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Overwrite any existing archive at `root`."),
                ),
        )
        .subcommand(
            Command::new("sites").about(concat!(
                "List sites in the archive with their date ranges. Ignores all global options",
                " except --root."
            )),
        )
        .subcommand(
            Command::new("inv")
                .about(concat!(
                    "Get the inventory of observing days for a site. Ignores all ",
                    "global options except --root."
                ))
                .arg(
                    Arg::new("site")
                        .index(1)
                        .required(true)
                        .help("The site to get the inventory for."),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Add SRS files, gzip'd or not, to the archive.")
                .arg(
                    Arg::new("files")
                        .index(1)
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Files to add."),
                ),
        )
        .subcommand(Command::new("clean").about(concat!(
            "Remove missing files from the index, index files missing from it, and delete files ",
            "that are not SRS data."
        )));

    let (common_args, matches) = CommonCmdLineArgs::matches(app)?;
    common_args.init_logging();

    match matches.subcommand() {
        Some(("create", sub_args)) => create(common_args, sub_args)?,
        Some(("sites", _)) => sites(common_args)?,
        Some(("inv", sub_args)) => inventory(common_args, sub_args)?,
        Some(("add", sub_args)) => add(common_args, sub_args)?,
        Some(("clean", _)) => Archive::connect(&common_args.root())?.clean()?,
        _ => unreachable!(),
    }

    Ok(())
}

fn create(common_args: CommonCmdLineArgs, sub_args: &ArgMatches) -> Result<(), Error> {
    // Check if the archive already exists. (try connecting to it)
    let already_exists: bool = Archive::connect(&common_args.root()).is_ok();

    if already_exists && sub_args.get_flag("force") {
        ::std::fs::remove_dir_all(common_args.root())?;
    } else if already_exists {
        bail!("Archive already exists, must use --force to overwrite.");
    }

    Archive::create(&common_args.root())?;

    Ok(())
}

fn sites(common_args: CommonCmdLineArgs) -> Result<(), Error> {
    let arch = Archive::connect(&common_args.root())?;

    let sites = arch.sites()?;
    if sites.is_empty() {
        println!("No sites in the archive.");
        return Ok(());
    }

    println!("{:<15} {:^10} {:^10} {:>6}", "SITE", "FIRST", "LAST", "DAYS");
    for site in sites {
        let dates = arch.dates(site)?;

        if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
            println!("{:<15} {} {} {:>6}", site, first, last, dates.len());
        }
    }

    Ok(())
}

fn inventory(common_args: CommonCmdLineArgs, sub_args: &ArgMatches) -> Result<(), Error> {
    let arch = Archive::connect(&common_args.root())?;

    // Safe to unwrap because the argument is required.
    let site = sub_args.get_one::<String>("site").unwrap();
    let site = Site::lookup(site)?;

    let inv = arch.inventory(site)?;

    println!("\nInventory for {}.", site);
    println!("   start: {}", inv.first);
    println!("     end: {}", inv.last);

    if inv.is_complete() {
        println!("\n   No missing days!");
    } else {
        println!("Missing:");
        println!("{:^10} -> {:^10} : {:6}", "From", "To", "Days");

        // Group consecutive missing days into ranges.
        let mut ranges: Vec<(chrono::NaiveDate, chrono::NaiveDate)> = vec![];
        for &day in &inv.missing {
            match ranges.last_mut() {
                Some(range) if day - range.1 == chrono::Duration::days(1) => range.1 = day,
                _ => ranges.push((day, day)),
            }
        }

        for (start, end) in ranges {
            println!("{} -> {} : {:6}", start, end, (end - start).num_days() + 1);
        }
    }

    Ok(())
}

fn add(common_args: CommonCmdLineArgs, sub_args: &ArgMatches) -> Result<(), Error> {
    let arch = Archive::connect(&common_args.root())?;

    for path in sub_args.get_many::<PathBuf>("files").into_iter().flatten() {
        match arch.add_file(path) {
            Ok(stored) => println!("Added {} as {}", path.display(), stored.display()),
            Err(err) => println!("Unable to add {}: {}", path.display(), err),
        }
    }

    Ok(())
}
