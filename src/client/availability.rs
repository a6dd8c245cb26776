use super::{Client, SiteSelection};
use crate::{
    dates::ToObservingDate,
    errors::SrsDataErr,
    providers::{Provider, RemoteFile},
    remote::RemoteSource,
    site::Site,
};
use std::collections::BTreeSet;
use strum::IntoEnumIterator;

impl<R: RemoteSource> Client<R> {
    /// Find the remote file for each selected site with data on `date`, in site order.
    ///
    /// NOAA is searched first. Sites it doesn't have are then looked for at the WDC.
    pub fn locate_data(
        &self,
        date: &dyn ToObservingDate,
        filter: &SiteSelection,
    ) -> Result<Vec<RemoteFile>, SrsDataErr> {
        let date = date.to_observing_date()?;
        let mut remaining = filter.sites();
        let mut found = vec![];

        for provider in Provider::iter() {
            let mut missing = vec![];

            for site in remaining {
                match self.probe_site(provider, site, date)? {
                    Some(remote_file) => found.push(remote_file),
                    None => missing.push(site),
                }
            }

            remaining = missing;
        }

        found.sort_by_key(|remote_file| remote_file.site);
        Ok(found)
    }

    /// The set of selected sites with data on `date`.
    ///
    /// An empty set means the archives answered and have nothing. Failing to reach them is an
    /// error.
    pub fn check_data_availability(
        &self,
        date: &dyn ToObservingDate,
        filter: &SiteSelection,
    ) -> Result<BTreeSet<Site>, SrsDataErr> {
        let sites = self
            .locate_data(date, filter)?
            .into_iter()
            .map(|remote_file| remote_file.site)
            .collect();

        Ok(sites)
    }

    fn probe_site(
        &self,
        provider: Provider,
        site: Site,
        date: chrono::NaiveDate,
    ) -> Result<Option<RemoteFile>, SrsDataErr> {
        for candidate in provider.candidates(&self.config, site, date) {
            if self.remote.probe(&candidate.url)? {
                debug!("found {} for {} at {}", date, site, candidate.url);
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::{
        client::unit::{jan_10, srs_bytes, test_config, test_remote, NOAA},
        remote::memory::MemoryRemote,
    };

    use chrono::NaiveDate;

    #[test]
    fn test_san_vito_available() {
        let client = Client::with_remote(test_remote(), test_config());

        let sites = client
            .check_data_availability(&"2025-01-10", &SiteSelection::All)
            .unwrap();

        assert!(sites.contains(&Site::SanVito));
        assert!(sites.contains(&Site::Learmonth));
        assert_eq!(sites.len(), 2);
    }

    #[test]
    fn test_nothing_available_is_empty() {
        let client = Client::with_remote(test_remote(), test_config());
        let date = NaiveDate::from_ymd_opt(1990, 6, 1).unwrap();

        let sites = client
            .check_data_availability(&date, &SiteSelection::All)
            .unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn test_filter_limits_sites() {
        let client = Client::with_remote(test_remote(), test_config());

        let sites = client
            .check_data_availability(&jan_10(), &SiteSelection::from(Site::Learmonth))
            .unwrap();
        assert_eq!(sites.into_iter().collect::<Vec<_>>(), vec![Site::Learmonth]);
    }

    #[test]
    fn test_unreachable_is_an_error() {
        let client = Client::with_remote(MemoryRemote::down(), test_config());

        let err = client
            .check_data_availability(&jan_10(), &SiteSelection::All)
            .unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn test_bad_date() {
        let client = Client::with_remote(test_remote(), test_config());

        assert!(matches!(
            client.check_data_availability(&"10 Jan", &SiteSelection::All),
            Err(SrsDataErr::InvalidDate(_))
        ));
    }

    #[test]
    fn test_lower_case_noaa_names_and_urls() {
        let url = format!("{}/palehua/2025/01/kp250110.srs.gz", NOAA);
        let remote = MemoryRemote::default().with_file(&url, srs_bytes(Site::Palehua, jan_10()));
        let client = Client::with_remote(remote, test_config());

        let found = client.locate_data(&jan_10(), &SiteSelection::All).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].site, Site::Palehua);
        assert_eq!(found[0].provider, Provider::Noaa);
        assert_eq!(found[0].url, url);
    }
}
