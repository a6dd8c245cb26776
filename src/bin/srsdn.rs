//! SRS Downloader.
//!
//! Downloads RSTN spectrograph files into a directory or into your archive.

use anyhow::{Context, Error};
use chrono::{Duration, NaiveDate, Utc};
use clap::{value_parser, Arg};
use rstn_srs::{
    days_between, parse_date, Archive, Client, CommonCmdLineArgs, Site, Spectrogram, SrsDataErr,
};
use std::path::{Path, PathBuf};

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);

        for cause in e.chain().skip(1) {
            println!("caused by: {}", cause);
        }

        ::std::process::exit(1);
    }
}

// Result from a single step in the processing chain
enum StepResult {
    Saved(Vec<PathBuf>),       // Paths written
    Archived(PathBuf),         // Path in the archive
    NoData,                    // Nothing published
    DownloadError(SrsDataErr), // Any other error downloading
    ArchiveError(SrsDataErr),  // Error adding it to the archive
}

fn run() -> Result<(), Error> {
    let app = CommonCmdLineArgs::new_app("srsdn", "Download RSTN spectrograph data.")
        .arg(
            Arg::new("date")
                .index(1)
                .help("Last day to download, YYYY-MM-DD. Defaults to today (UTC)."),
        )
        .arg(
            Arg::new("save-dir")
                .long("save-dir")
                .value_parser(value_parser!(PathBuf))
                .help("Save files in this directory instead of the archive."),
        );

    let (common_args, matches) = CommonCmdLineArgs::matches(app)?;
    common_args.init_logging();

    let end = match matches.get_one::<String>("date") {
        Some(text) => parse_date(text)?,
        None => Utc::now().date_naive(),
    };
    let start = end - Duration::days(common_args.days_back());

    let client = Client::new(common_args.config().clone())?;

    match matches.get_one::<PathBuf>("save-dir") {
        Some(save_dir) => download_to_dir(&client, &common_args, start, end, save_dir),
        None => download_to_archive(&client, &common_args, start, end),
    }
}

fn download_to_dir(
    client: &Client,
    common_args: &CommonCmdLineArgs,
    start: NaiveDate,
    end: NaiveDate,
    save_dir: &Path,
) -> Result<(), Error> {
    let sites = common_args.sites();

    days_between(start, end)
        .map(|date| {
            let res = match client.download_data(&date, sites, &save_dir) {
                Ok(paths) => StepResult::Saved(paths),
                Err(SrsDataErr::NoData { .. }) => StepResult::NoData,
                Err(err) => StepResult::DownloadError(err),
            };

            (date, res)
        })
        .for_each(|(date, res)| report(&date, &sites.to_string(), res));

    Ok(())
}

fn download_to_archive(
    client: &Client,
    common_args: &CommonCmdLineArgs,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), Error> {
    let arch = Archive::connect(&common_args.root())
        .with_context(|| format!("opening archive at {}", common_args.root().display()))?;
    let sites: Vec<Site> = common_args.sites().sites();

    days_between(start, end)
        .flat_map(|date| sites.iter().map(move |&site| (site, date)))
        // Skip data already in the database, but report a database that can't be asked
        .filter_map(|(site, date)| {
            let res = match needs_download(&arch, site, date) {
                Ok(false) => return None,
                Ok(true) => download_one(client, &arch, site, date),
                Err(res) => res,
            };

            Some((site, date, res))
        })
        .for_each(|(site, date, res)| report(&date, site.name(), res));

    Ok(())
}

fn needs_download(arch: &Archive, site: Site, date: NaiveDate) -> Result<bool, StepResult> {
    arch.exists(site, date)
        .map(|found| !found)
        .map_err(StepResult::ArchiveError)
}

fn download_one(client: &Client, arch: &Archive, site: Site, date: NaiveDate) -> StepResult {
    match client.fetch(&date, site) {
        Ok(data) => match Spectrogram::from_bytes(&data) {
            Ok(srs) => match arch.add(&srs) {
                Ok(path) => StepResult::Archived(path),
                Err(err) => StepResult::ArchiveError(err),
            },
            Err(err) => StepResult::DownloadError(err),
        },
        Err(SrsDataErr::NoData { .. }) => StepResult::NoData,
        Err(err) => StepResult::DownloadError(err),
    }
}

fn report(date: &NaiveDate, what: &str, res: StepResult) {
    use StepResult::*;

    match res {
        Saved(paths) => paths
            .iter()
            .for_each(|path| println!("{} saved {}", date, path.display())),
        Archived(path) => println!("{} {} archived as {}", date, what, path.display()),
        NoData => println!("{} {}: no data.", date, what),
        DownloadError(err) | ArchiveError(err) => {
            println!("Error with {} for {}.", date, what);
            println!("  {}", err);

            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                println!("  caused by: {}", cause);
                source = cause.source();
            }
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_index_errors_are_reported() {
        let tmp = TempDir::new("srsdn-test").unwrap();
        let arch = Archive::create(&tmp.path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        assert!(matches!(needs_download(&arch, Site::SanVito, date), Ok(true)));

        // Break the index behind the archive's back.
        rusqlite::Connection::open(tmp.path().join("index.db"))
            .unwrap()
            .execute_batch("DROP TABLE files")
            .unwrap();

        match needs_download(&arch, Site::SanVito, date) {
            Err(StepResult::ArchiveError(err)) => assert!(err.to_string().contains("files")),
            Err(_) => panic!("Expected an archive error."),
            Ok(needed) => panic!("Expected an archive error, got Ok({}).", needed),
        }
    }
}
