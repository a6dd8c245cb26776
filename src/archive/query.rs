use std::{path::PathBuf, str::FromStr};

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::Archive;

use crate::{errors::SrsDataErr, inventory::Inventory, site::Site, srs::Spectrogram};

impl Archive {
    /// Retrieve a list of sites in the archive.
    pub fn sites(&self) -> Result<Vec<Site>, SrsDataErr> {
        let mut stmt = self
            .db_conn
            .prepare("SELECT DISTINCT site FROM files")?;

        let vals: Result<Vec<Site>, SrsDataErr> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|res| res.map_err(SrsDataErr::Database))
            .map(|res| res.and_then(|slug| Site::from_str(&slug).map_err(SrsDataErr::StrumError)))
            .collect();

        let mut sites = vals?;
        sites.sort();
        Ok(sites)
    }

    /// Every observing day stored for a site, earliest first.
    pub fn dates(&self, site: Site) -> Result<Vec<NaiveDate>, SrsDataErr> {
        let mut stmt = self
            .db_conn
            .prepare("SELECT obs_date FROM files WHERE site = ?1 ORDER BY obs_date ASC")?;

        let vals: Result<Vec<NaiveDate>, SrsDataErr> = stmt
            .query_map(params![site.slug()], |row| row.get::<_, NaiveDate>(0))?
            .map(|res| res.map_err(SrsDataErr::Database))
            .collect();

        vals
    }

    /// Check to see if a file is present in the archive.
    pub fn exists(&self, site: Site, date: NaiveDate) -> Result<bool, SrsDataErr> {
        let num_records: i64 = self.db_conn.query_row(
            "SELECT COUNT(*) FROM files WHERE site = ?1 AND obs_date = ?2",
            params![site.slug(), date],
            |row| row.get(0),
        )?;

        Ok(num_records == 1)
    }

    /// Path to the stored file for a site and day.
    pub fn file_path(&self, site: Site, date: NaiveDate) -> Result<PathBuf, SrsDataErr> {
        let file_name: Option<String> = self
            .db_conn
            .query_row(
                "SELECT file_name FROM files WHERE site = ?1 AND obs_date = ?2",
                params![site.slug(), date],
                |row| row.get(0),
            )
            .optional()?;

        file_name
            .map(|fname| self.data_root().join(fname))
            .ok_or(SrsDataErr::NotInIndex)
    }

    /// Retrieve a file from the archive.
    pub fn retrieve(&self, site: Site, date: NaiveDate) -> Result<Spectrogram, SrsDataErr> {
        let path = self.file_path(site, date)?;
        Spectrogram::from_file(&path)
    }

    /// The latest observing day stored for a site.
    pub fn most_recent(&self, site: Site) -> Result<NaiveDate, SrsDataErr> {
        let date: Result<NaiveDate, _> = self.db_conn.query_row(
            "
                SELECT obs_date
                FROM files
                WHERE site = ?1
                ORDER BY obs_date DESC
                LIMIT 1
            ",
            params![site.slug()],
            |row| row.get(0),
        );

        match date {
            Ok(date) => Ok(date),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(SrsDataErr::NotInIndex),
            Err(x) => Err(SrsDataErr::Database(x)),
        }
    }

    /// Get an inventory of observing days for a site.
    pub fn inventory(&self, site: Site) -> Result<Inventory, SrsDataErr> {
        let dates = self.dates(site)?;
        Inventory::new(dates)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::archive::unit::*; // test helpers.

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, d).unwrap()
    }

    #[test]
    fn test_sites() {
        let TestArchive {
            tmp: _tmp,
            mut arch,
        } = create_test_archive().expect("Failed to create test archive.");

        assert!(arch.sites().unwrap().is_empty());
        fill_test_archive(&mut arch);

        assert_eq!(
            arch.sites().expect("Error querying archive."),
            vec![Site::Learmonth, Site::SanVito]
        );
    }

    #[test]
    fn test_file_exists() {
        let TestArchive {
            tmp: _tmp,
            mut arch,
        } = create_test_archive().expect("Failed to create test archive.");

        fill_test_archive(&mut arch);

        for d in &[1, 2, 5] {
            assert!(arch.exists(Site::SanVito, day(*d)).unwrap());
        }
        for d in &[3, 4, 6] {
            assert!(!arch.exists(Site::SanVito, day(*d)).unwrap());
        }
        assert!(arch.exists(Site::Learmonth, day(3)).unwrap());
    }

    #[test]
    fn test_retrieve() {
        let TestArchive {
            tmp: _tmp,
            mut arch,
        } = create_test_archive().expect("Failed to create test archive.");

        fill_test_archive(&mut arch);

        let srs = arch.retrieve(Site::SanVito, day(2)).unwrap();
        assert_eq!(srs, test_spectrogram(Site::SanVito, day(2)));

        match arch.retrieve(Site::Holloman, day(2)) {
            Err(SrsDataErr::NotInIndex) => {}
            Err(_) => panic!("Wrong error type returned."),
            Ok(_) => panic!("This should not exist in the database."),
        }
    }

    #[test]
    fn test_most_recent() {
        let TestArchive {
            tmp: _tmp,
            mut arch,
        } = create_test_archive().expect("Failed to create test archive.");

        fill_test_archive(&mut arch);

        assert_eq!(arch.most_recent(Site::SanVito).unwrap(), day(5));
        assert_eq!(arch.most_recent(Site::Learmonth).unwrap(), day(3));
        assert!(matches!(
            arch.most_recent(Site::Palehua),
            Err(SrsDataErr::NotInIndex)
        ));
    }

    #[test]
    fn test_inventory() {
        let TestArchive {
            tmp: _tmp,
            mut arch,
        } = create_test_archive().expect("Failed to create test archive.");

        fill_test_archive(&mut arch);

        let expected = Inventory {
            first: day(1),
            last: day(5),
            missing: vec![day(3), day(4)],
        };

        assert_eq!(arch.inventory(Site::SanVito).unwrap(), expected);
        assert!(arch.inventory(Site::Holloman).is_err());
    }
}
