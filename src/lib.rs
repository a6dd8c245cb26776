#![deny(missing_docs)]
//! Package to find, download, archive, and plot solar radio spectrograph (SRS) data from the Radio
//! Solar Telescope Network (RSTN).
//!
//! The free functions at the crate root use the public archives over HTTP with the default
//! configuration. Use a [`Client`] for anything else.

//
// Public API
//
pub use archive::{default_root, Archive};
pub use client::{Client, SiteSelection};
pub use cmd_line::CommonCmdLineArgs;
pub use config::Config;
pub use dates::{days_between, parse_date, Mjd, ToObservingDate};
pub use errors::{FormatErr, SrsDataErr};
pub use inventory::Inventory;
pub use plot::{plot_srs, plot_stack, ColorMap, ColorScale, Figure, Panel, PlotOptions};
pub use providers::{Provider, RemoteFile};
pub use remote::{HttpRemote, RemoteSource};
pub use site::Site;
pub use srs::{
    combine, load_srs_data, rectify, BandHeader, CombinedSpectrogram, SpectralView, Spectrogram,
    Sweep, CHANNELS_PER_BAND, NUM_BANDS, RECORD_LEN,
};

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// The set of `sites` with data for `date`, checked over HTTP with the default configuration.
///
/// An empty set means the archives have nothing for that day. Failing to reach them is an error.
pub fn check_data_availability(
    date: &dyn ToObservingDate,
    sites: &SiteSelection,
) -> Result<BTreeSet<Site>, SrsDataErr> {
    Client::new(Config::default())?.check_data_availability(date, sites)
}

/// Download the data for `sites` on `date` into `save_dir` over HTTP with the default
/// configuration, returning the path of each file.
pub fn download_data(
    date: &dyn ToObservingDate,
    sites: &SiteSelection,
    save_dir: &dyn AsRef<Path>,
) -> Result<Vec<PathBuf>, SrsDataErr> {
    Client::new(Config::default())?.download_data(date, sites, save_dir)
}

//
// Implementation only
//
#[macro_use]
extern crate log;
#[macro_use]
extern crate strum_macros;

mod archive;
mod client;
mod cmd_line;
mod config;
mod dates;
mod errors;
mod inventory;
mod plot;
mod providers;
mod remote;
mod site;
mod srs;

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::{
        client::unit::{jan_10, test_config, test_remote},
        remote::memory::MemoryRemote,
    };

    use chrono::NaiveDate;
    use std::str::FromStr;
    use tempdir::TempDir;

    #[test]
    fn test_san_vito_day() {
        let tmp = TempDir::new("rstn-srs-test").unwrap();
        let client = Client::with_remote(test_remote(), test_config());

        let available = client
            .check_data_availability(&"2025-01-10", &SiteSelection::All)
            .unwrap();
        assert!(available.contains(&Site::SanVito));

        let paths = client
            .download_data(&jan_10(), &SiteSelection::from(Site::SanVito), &tmp.path())
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].exists());

        let srs = load_srs_data(&paths[0]).unwrap();
        assert_eq!(srs.site(), Site::SanVito);
        assert_eq!(srs.date(), jan_10());
        assert_eq!(srs.num_sweeps(), 20);

        let figure = plot_srs(&srs, &PlotOptions::default()).unwrap();
        assert_eq!(figure.title(), "San Vito @ 2025-01-10");
        assert_eq!(figure.x_label, "UTC Time");
    }

    #[test]
    fn test_all_sites_then_combined() {
        let tmp = TempDir::new("rstn-srs-test").unwrap();
        let client = Client::with_remote(test_remote(), test_config());

        let available = client
            .check_data_availability(&jan_10(), &SiteSelection::All)
            .unwrap();
        assert_eq!(
            available.iter().copied().collect::<Vec<_>>(),
            vec![Site::Learmonth, Site::SanVito]
        );

        let paths = client
            .download_data(&jan_10(), &SiteSelection::All, &tmp.path())
            .unwrap();
        let spectrograms = paths
            .iter()
            .map(|path| load_srs_data(path))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let combined = combine(&spectrograms).unwrap();
        assert_eq!(combined.sites(), &[Site::Learmonth, Site::SanVito]);

        let figure = plot_srs(&combined, &PlotOptions::default()).unwrap();
        assert!(figure.title().starts_with("Learmonth+San Vito"));
    }

    #[test]
    fn test_quiet_day_is_empty() {
        let client = Client::with_remote(test_remote(), test_config());
        let quiet = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();

        let available = client
            .check_data_availability(&quiet, &SiteSelection::All)
            .unwrap();
        assert!(available.is_empty());
    }

    #[test]
    fn test_network_failure_is_not_empty() {
        let client = Client::with_remote(MemoryRemote::down(), test_config());

        let err = client
            .check_data_availability(&jan_10(), &SiteSelection::All)
            .unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn test_empty_selection_checks_nothing() {
        // No site is probed, so nothing goes over the network.
        let available =
            check_data_availability(&jan_10(), &SiteSelection::Only(vec![])).unwrap();
        assert!(available.is_empty());
    }

    #[test]
    fn test_unknown_site() {
        let err = SiteSelection::from_str("Atlantis").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_and_serialize_agree() {
        let tmp = TempDir::new("rstn-srs-test").unwrap();
        let client = Client::with_remote(test_remote(), test_config());

        let bytes = client.fetch(&jan_10(), Site::Learmonth).unwrap();
        let srs = Spectrogram::from_bytes(&bytes).unwrap();
        assert_eq!(srs.to_bytes(), bytes);

        let times = srs.times();
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));

        let path = tmp.path().join("again.srs.gz");
        srs.save(&path).unwrap();
        assert_eq!(load_srs_data(&path).unwrap(), srs);
    }
}
