use super::{Client, SiteSelection};
use crate::{
    dates::ToObservingDate,
    errors::SrsDataErr,
    providers::RemoteFile,
    remote::RemoteSource,
    site::Site,
    srs::{gunzip, gzip, is_gzip},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

impl<R: RemoteSource> Client<R> {
    /// Get the uncompressed SRS records for one site and day without touching the disk.
    pub fn fetch(&self, date: &dyn ToObservingDate, site: Site) -> Result<Vec<u8>, SrsDataErr> {
        let date = date.to_observing_date()?;

        let remote_file = self
            .locate_data(&date, &SiteSelection::from(site))?
            .into_iter()
            .next()
            .ok_or(SrsDataErr::NoData {
                site: Some(site),
                date,
            })?;

        let data = self.fetch_remote(&remote_file, date)?;

        if is_gzip(&data) {
            gunzip(&data)
        } else {
            Ok(data)
        }
    }

    /// Download the data for the selected sites on `date` into `save_dir`.
    ///
    /// Returns the path of each file, in site order. Files are stored gzip'd. Every site named
    /// explicitly must have data, and this is checked before anything is written. An existing file
    /// is left alone, and its path returned, unless the configuration allows overwriting.
    pub fn download_data(
        &self,
        date: &dyn ToObservingDate,
        sites: &SiteSelection,
        save_dir: &dyn AsRef<Path>,
    ) -> Result<Vec<PathBuf>, SrsDataErr> {
        let date = date.to_observing_date()?;
        let remote_files = self.locate_data(&date, sites)?;

        if sites.is_explicit() {
            for site in sites.sites() {
                if !remote_files.iter().any(|rf| rf.site == site) {
                    return Err(SrsDataErr::NoData {
                        site: Some(site),
                        date,
                    });
                }
            }
        } else if remote_files.is_empty() {
            return Err(SrsDataErr::NoData { site: None, date });
        }

        let save_dir = save_dir.as_ref();
        fs::create_dir_all(save_dir)?;

        let mut paths = Vec::with_capacity(remote_files.len());
        for remote_file in &remote_files {
            let path = save_dir.join(remote_file.local_name());

            if path.exists() && !self.config.overwrite {
                warn!(
                    "{} exists, keeping it (set overwrite to replace it)",
                    path.display()
                );
                paths.push(path);
                continue;
            }

            let data = self.fetch_remote(remote_file, date)?;
            let data = if is_gzip(&data) { data } else { gzip(&data)? };

            let mut part = path.clone().into_os_string();
            part.push(".part");
            let part = PathBuf::from(part);

            if let Err(err) = fs::write(&part, &data).and_then(|_| fs::rename(&part, &path)) {
                // Nothing half written is left behind.
                let _ = fs::remove_file(&part);
                return Err(err.into());
            }

            info!("saved {} for {} to {}", date, remote_file.site, path.display());
            paths.push(path);
        }

        Ok(paths)
    }

    fn fetch_remote(
        &self,
        remote_file: &RemoteFile,
        date: chrono::NaiveDate,
    ) -> Result<Vec<u8>, SrsDataErr> {
        debug!("downloading {}", remote_file.url);

        // The file can disappear between the probe and the download.
        self.remote
            .fetch(&remote_file.url)?
            .ok_or(SrsDataErr::NoData {
                site: Some(remote_file.site),
                date,
            })
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::{
        client::unit::{jan_10, srs_bytes, test_config, test_remote},
        config::Config,
        remote::memory::MemoryRemote,
        srs::load_srs_data,
    };

    use chrono::NaiveDate;
    use tempdir::TempDir;

    fn tmp() -> TempDir {
        TempDir::new("rstn-srs-test").unwrap()
    }

    #[test]
    fn test_download_san_vito() {
        let tmp = tmp();
        let client = Client::with_remote(test_remote(), test_config());

        let paths = client
            .download_data(&"2025-01-10", &SiteSelection::from(Site::SanVito), &tmp.path())
            .unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].exists());
        assert_eq!(paths[0].file_name().unwrap(), "sv250110.srs.gz");

        let srs = load_srs_data(&paths[0]).unwrap();
        assert_eq!(srs.site(), Site::SanVito);
        assert_eq!(srs.date(), jan_10());
    }

    #[test]
    fn test_plain_files_are_compressed() {
        let tmp = tmp();
        let client = Client::with_remote(test_remote(), test_config());

        let paths = client
            .download_data(&jan_10(), &SiteSelection::All, &tmp.path())
            .unwrap();

        let names: Vec<_> = paths.iter().map(|p| p.file_name().unwrap()).collect();
        assert_eq!(names, vec!["LM250110.srs.gz", "sv250110.srs.gz"]);

        let written = std::fs::read(&paths[0]).unwrap();
        assert!(is_gzip(&written));
        assert_eq!(
            gunzip(&written).unwrap(),
            srs_bytes(Site::Learmonth, jan_10())
        );
    }

    #[test]
    fn test_creates_save_dir() {
        let tmp = tmp();
        let dir = tmp.path().join("nested").join("dir");
        let client = Client::with_remote(test_remote(), test_config());

        let paths = client
            .download_data(&jan_10(), &SiteSelection::from(Site::Learmonth), &dir)
            .unwrap();
        assert!(paths[0].starts_with(&dir));
        assert!(!dir.join("LM250110.srs.gz.part").exists());
    }

    #[test]
    fn test_missing_site_writes_nothing() {
        let tmp = tmp();
        let client = Client::with_remote(test_remote(), test_config());
        let sites = SiteSelection::Only(vec![Site::SanVito, Site::Holloman]);

        match client.download_data(&jan_10(), &sites, &tmp.path()) {
            Err(SrsDataErr::NoData { site, date }) => {
                assert_eq!(site, Some(Site::Holloman));
                assert_eq!(date, jan_10());
            }
            other => panic!("Expected no data, got {:?}", other),
        }

        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_no_data_any_site() {
        let tmp = tmp();
        let client = Client::with_remote(test_remote(), test_config());
        let date = NaiveDate::from_ymd_opt(1990, 6, 1).unwrap();

        let err = client
            .download_data(&date, &SiteSelection::All, &tmp.path())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_existing_files_are_kept() {
        let tmp = tmp();
        let existing = tmp.path().join("sv250110.srs.gz");
        std::fs::write(&existing, b"keep me").unwrap();

        let client = Client::with_remote(test_remote(), test_config());
        let paths = client
            .download_data(&jan_10(), &SiteSelection::from(Site::SanVito), &tmp.path())
            .unwrap();

        assert_eq!(paths, vec![existing.clone()]);
        assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");

        let config = Config {
            overwrite: true,
            ..test_config()
        };
        let client = Client::with_remote(test_remote(), config);
        client
            .download_data(&jan_10(), &SiteSelection::from(Site::SanVito), &tmp.path())
            .unwrap();
        assert!(load_srs_data(&existing).is_ok());
    }

    #[test]
    fn test_failed_write_leaves_no_part_file() {
        let tmp = tmp();

        // A directory in the way of the final name makes the rename fail.
        let blocker = tmp.path().join("sv250110.srs.gz");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"keep me").unwrap();

        let config = Config {
            overwrite: true,
            ..test_config()
        };
        let client = Client::with_remote(test_remote(), config);

        let err = client
            .download_data(&jan_10(), &SiteSelection::from(Site::SanVito), &tmp.path())
            .unwrap_err();
        assert!(matches!(err, SrsDataErr::IO(_)));

        assert!(!tmp.path().join("sv250110.srs.gz.part").exists());
        assert!(blocker.join("keep").is_file());
    }

    #[test]
    fn test_fetch_decompresses() {
        let client = Client::with_remote(test_remote(), test_config());

        for site in &[Site::SanVito, Site::Learmonth] {
            let data = client.fetch(&jan_10(), *site).unwrap();
            assert_eq!(data, srs_bytes(*site, jan_10()));
        }

        let err = client.fetch(&jan_10(), Site::SagamoreHill).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_network_failure() {
        let tmp = tmp();
        let client = Client::with_remote(MemoryRemote::down(), test_config());

        let err = client
            .download_data(&jan_10(), &SiteSelection::All, &tmp.path())
            .unwrap_err();
        assert!(err.is_network());
    }
}
