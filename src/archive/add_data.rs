use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::params;

use super::Archive;

use crate::{errors::SrsDataErr, site::Site, srs::Spectrogram};

impl Archive {
    /// Add a spectrogram to the archive, replacing any already there for the same site and day.
    ///
    /// Returns the path of the stored file.
    pub fn add(&self, srs: &Spectrogram) -> Result<PathBuf, SrsDataErr> {
        let file_name = Self::compressed_file_name(srs.site(), srs.date());
        let path = self.data_root().join(&file_name);

        srs.save(&path)?;
        self.index(srs, &file_name)?;

        Ok(path)
    }

    /// Load an SRS file from anywhere, gzip'd or not, and add it to the archive.
    pub fn add_file(&self, path: &dyn AsRef<Path>) -> Result<PathBuf, SrsDataErr> {
        let srs = Spectrogram::from_file(path)?;
        self.add(&srs)
    }

    pub(super) fn index(&self, srs: &Spectrogram, file_name: &str) -> Result<(), SrsDataErr> {
        self.db_conn.execute(
            "
                INSERT OR REPLACE INTO files
                    (site, obs_date, first_time, last_time, num_sweeps, file_name)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                srs.site().slug(),
                srs.date(),
                srs.first_time(),
                srs.last_time(),
                srs.num_sweeps() as i64,
                file_name,
            ],
        )?;

        Ok(())
    }

    /// Remove a file from the archive.
    pub fn remove(&self, site: Site, date: NaiveDate) -> Result<(), SrsDataErr> {
        let path = self.file_path(site, date)?;

        std::fs::remove_file(path).map_err(SrsDataErr::IO)?;

        self.db_conn.execute(
            "DELETE FROM files WHERE site = ?1 AND obs_date = ?2",
            params![site.slug(), date],
        )?;

        Ok(())
    }

    pub(super) fn compressed_file_name(site: Site, date: NaiveDate) -> String {
        format!("{}_{}.srs.gz", date.format("%Y%m%d"), site.slug())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::archive::unit::*; // test helpers.
    use crate::srs::unit::make_spectrogram;

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        assert_eq!(
            Archive::compressed_file_name(Site::SanVito, date),
            "20250110_san-vito.srs.gz"
        );
    }

    #[test]
    fn test_add_and_replace() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let srs = test_spectrogram(Site::SanVito, date);

        let path = arch.add(&srs).expect("Error adding.");
        assert!(path.is_file());
        assert!(arch.exists(Site::SanVito, date).unwrap());

        // Adding again replaces the row rather than failing.
        arch.add(&srs).expect("Error replacing.");
        assert_eq!(arch.dates(Site::SanVito).unwrap(), vec![date]);
    }

    #[test]
    fn test_add_across_midnight() {
        let TestArchive { tmp: _tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let day = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 9)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let srs = make_spectrogram(Site::Learmonth, start, 100, 430);

        let path = arch.add(&srs).expect("Error adding.");
        assert!(path.ends_with(Archive::compressed_file_name(Site::Learmonth, day)));
        assert!(arch.exists(Site::Learmonth, day).unwrap());
        assert!(!arch.exists(Site::Learmonth, start.date()).unwrap());
    }

    #[test]
    fn test_add_file() {
        let TestArchive { tmp, arch } =
            create_test_archive().expect("Failed to create test archive.");

        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let srs = test_spectrogram(Site::Holloman, date);

        let outside = tmp.path().join("HO250110.srs");
        srs.save(&outside).unwrap();

        arch.add_file(&outside).expect("Error adding file.");
        assert_eq!(
            arch.retrieve(Site::Holloman, date).unwrap().to_bytes(),
            srs.to_bytes()
        );
    }

    #[test]
    fn test_remove_file() {
        let TestArchive {
            tmp: _tmp,
            mut arch,
        } = create_test_archive().expect("Failed to create test archive.");

        fill_test_archive(&mut arch);

        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let path = arch.file_path(Site::SanVito, date).unwrap();

        assert!(arch.exists(Site::SanVito, date).expect("Error checking db"));
        arch.remove(Site::SanVito, date)
            .expect("Error while removing.");
        assert!(!arch.exists(Site::SanVito, date).expect("Error checking db"));
        assert!(!path.exists());

        match arch.remove(Site::SanVito, date) {
            Err(SrsDataErr::NotInIndex) => {}
            other => panic!("Expected NotInIndex, got {:?}", other),
        }
    }
}
