//! The cleaning method for Archive is complex, so it has its own module.

use std::collections::HashSet;

use crate::{errors::SrsDataErr, srs::Spectrogram};

use super::Archive;

impl Archive {
    /// Validate files listed in the index are in the archive too, if not remove them from the
    /// index. Files in the archive that are not in the index are added to it, unless they can't be
    /// parsed or duplicate an indexed day, in which case they are deleted.
    pub fn clean(&self) -> Result<(), SrsDataErr> {
        self.db_conn.execute_batch("PRAGMA cache_size=10000")?;

        info!("Building set of files from the index.");
        let index_vals = self.get_all_files_from_index()?;

        info!("Building set of files from the file system.");
        let file_system_vals = self.get_all_files_in_data_dir()?;

        info!("Comparing sets for files in index but not in the archive.");
        let mut files_in_index_but_not_on_file_system = index_vals.difference(&file_system_vals);
        self.remove_missing_files_from_index(&mut files_in_index_but_not_on_file_system)?;

        info!("Comparing sets for files in archive but not in the index.");
        let mut files_not_in_index = file_system_vals.difference(&index_vals);
        self.handle_files_in_archive_but_not_index(&mut files_not_in_index)?;

        info!("Compressing index.");
        self.db_conn.execute_batch("VACUUM")?;

        Ok(())
    }

    #[inline]
    fn get_all_files_from_index(&self) -> Result<HashSet<String>, SrsDataErr> {
        let mut all_files_stmt = self.db_conn.prepare("SELECT file_name FROM files")?;

        let index_vals: Result<HashSet<String>, SrsDataErr> = all_files_stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|res| res.map_err(SrsDataErr::Database))
            .collect();

        index_vals
    }

    #[inline]
    fn get_all_files_in_data_dir(&self) -> Result<HashSet<String>, SrsDataErr> {
        Ok(std::fs::read_dir(self.data_root())?
            .filter_map(Result::ok)
            .map(|de| de.path())
            .filter(|p| p.is_file())
            .filter_map(|p| p.file_name().map(ToOwned::to_owned))
            .map(|p| p.to_string_lossy().to_string())
            .collect())
    }

    #[inline]
    fn remove_missing_files_from_index(
        &self,
        files_in_index_but_not_on_file_system: &mut dyn Iterator<Item = &String>,
    ) -> Result<(), SrsDataErr> {
        let tx = self.db_conn.unchecked_transaction()?;
        {
            let mut del_stmt = tx.prepare("DELETE FROM files WHERE file_name = ?1")?;

            for missing_file in files_in_index_but_not_on_file_system {
                del_stmt.execute([missing_file])?;
                info!("Removing {} from index.", missing_file);
            }
        }
        tx.commit()?;

        Ok(())
    }

    #[inline]
    fn handle_files_in_archive_but_not_index(
        &self,
        files_not_in_index: &mut dyn Iterator<Item = &String>,
    ) -> Result<(), SrsDataErr> {
        let tx = self.db_conn.unchecked_transaction()?;

        for extra_file in files_not_in_index {
            let path = self.data_root().join(extra_file);

            let message = match Spectrogram::from_file(&path) {
                Ok(srs) => {
                    if self.exists(srs.site(), srs.date())? {
                        std::fs::remove_file(&path)?;
                        format!("Duplicate file removed: {}", extra_file)
                    } else {
                        self.index(&srs, extra_file)?;
                        format!("Added {}", extra_file)
                    }
                }
                Err(err) => {
                    // Remove non-SRS file
                    std::fs::remove_file(&path)?;
                    format!("Removed non-SRS file: {} ({})", extra_file, err)
                }
            };

            info!("{}", message);
        }

        tx.commit()?;

        Ok(())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
