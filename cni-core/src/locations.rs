//! Loader for the gram-panchayat election CSV that seeds the location tree.
//!
//! Row format, one gram panchayat per line after the header:
//! `state_id,state_name,district_id,district_name,mandal_id,mandal_name,gp_code,gp_name`

use std::fs;
use std::path::Path;

use tracing::info;

use crate::common::error::{CoreError, Result};
use crate::domain::{District, GramPanchayat, Mandal, State};
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct LocationRow {
    pub state: State,
    pub district: District,
    pub mandal: Mandal,
    pub gram_panchayat: GramPanchayat,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoadStats {
    pub rows: usize,
}

pub fn parse_csv(content: &str) -> Result<Vec<LocationRow>> {
    content
        .lines()
        .enumerate()
        .skip(1) // header
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_row(line, idx + 1))
        .collect()
}

fn parse_row(line: &str, line_no: usize) -> Result<LocationRow> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 8 {
        return Err(CoreError::Validation(format!(
            "line {line_no}: expected 8 columns, got {}",
            fields.len()
        )));
    }

    let id = |raw: &str, what: &str| -> Result<u32> {
        raw.parse().map_err(|_| {
            CoreError::Validation(format!("line {line_no}: bad {what} id '{raw}'"))
        })
    };

    let state_id = id(fields[0], "state")?;
    let district_id = id(fields[2], "district")?;
    let mandal_id = id(fields[4], "mandal")?;
    let gp_id = id(fields[6], "gram panchayat")?;

    Ok(LocationRow {
        state: State {
            id: state_id,
            name: fields[1].to_string(),
        },
        district: District {
            id: district_id,
            state_id,
            name: fields[3].to_string(),
        },
        mandal: Mandal {
            id: mandal_id,
            district_id,
            name: fields[5].to_string(),
        },
        gram_panchayat: GramPanchayat {
            id: gp_id,
            mandal_id,
            name: fields[7].to_string(),
        },
    })
}

/// Read and import a CSV file. Upserts keyed on the CSV ids, so re-running
/// the import is harmless.
pub async fn load_csv_file(storage: &dyn Storage, path: &Path) -> Result<LoadStats> {
    let content = fs::read_to_string(path)?;
    let rows = parse_csv(&content)?;
    load_rows(storage, &rows).await
}

pub async fn load_rows(storage: &dyn Storage, rows: &[LocationRow]) -> Result<LoadStats> {
    for row in rows {
        storage.upsert_state(&row.state).await?;
        storage.upsert_district(&row.district).await?;
        storage.upsert_mandal(&row.mandal).await?;
        storage.upsert_gram_panchayat(&row.gram_panchayat).await?;
    }
    info!("Imported {} location rows", rows.len());
    Ok(LoadStats { rows: rows.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
state_id,state_name,district_id,district_name,mandal_id,mandal_name,gpcode,gp_name
36,Telangana,1,Adilabad,101,Tamsi,5001,Ponnari
36,Telangana,1,Adilabad,101,Tamsi,5002,Gona
36,Telangana,2,Nirmal,201,Soan,6001,Kaman";

    #[test]
    fn parses_rows_and_skips_the_header() {
        let rows = parse_csv(SAMPLE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].state.name, "Telangana");
        assert_eq!(rows[1].gram_panchayat.id, 5002);
        assert_eq!(rows[2].mandal.district_id, 2);
    }

    #[test]
    fn rejects_short_rows() {
        let bad = "h\n36,Telangana,1,Adilabad";
        assert!(matches!(
            parse_csv(bad),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let bad = "h\nXX,Telangana,1,Adilabad,101,Tamsi,5001,Ponnari";
        assert!(parse_csv(bad).is_err());
    }

    #[tokio::test]
    async fn loads_from_a_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gp.csv");
        fs::write(&path, SAMPLE).unwrap();

        let storage = crate::storage::InMemoryStorage::new();
        let stats = load_csv_file(&storage, &path).await.unwrap();
        assert_eq!(stats.rows, 3);
    }

    #[tokio::test]
    async fn import_is_idempotent() {
        let storage = crate::storage::InMemoryStorage::new();
        let rows = parse_csv(SAMPLE).unwrap();
        load_rows(&storage, &rows).await.unwrap();
        load_rows(&storage, &rows).await.unwrap();

        assert_eq!(storage.get_states().await.unwrap().len(), 1);
        assert_eq!(storage.get_districts(36).await.unwrap().len(), 2);
        assert_eq!(storage.get_mandals(1).await.unwrap().len(), 1);
        assert_eq!(storage.get_gram_panchayats(101).await.unwrap().len(), 2);
    }
}
