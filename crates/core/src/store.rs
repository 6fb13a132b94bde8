use crate::error::StoreError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const INDEX_FILE_NAME: &str = "documents.json";

pub fn index_file_path(location: &Path) -> PathBuf {
    location.join(INDEX_FILE_NAME)
}

/// Writes the chunk texts as a JSON array. Vectors are never persisted.
pub fn save_index<S: AsRef<str>>(chunks: &[S], location: &Path) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(location)?;

    let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.as_ref()).collect();
    let path = index_file_path(location);
    let payload = serde_json::to_vec(&texts).map_err(|error| StoreError::Corrupt {
        path: path.clone(),
        details: error.to_string(),
    })?;
    fs::write(&path, payload)?;

    Ok(path)
}

/// The caller has to refit a vectorizer on the returned chunks before searching.
pub fn load_index(location: &Path) -> Result<Vec<String>, StoreError> {
    let path = index_file_path(location);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path));
        }
        Err(error) => return Err(StoreError::Io(error)),
    };

    serde_json::from_slice::<Vec<String>>(&bytes).map_err(|error| StoreError::Corrupt {
        path,
        details: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn saved_chunks_load_back_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let location = dir.path().join("index");
        let chunks = vec!["first chunk".to_string(), "second \"quoted\" chunk".to_string()];

        let path = save_index(chunks.as_slice(), &location)?;

        assert_eq!(path, location.join(INDEX_FILE_NAME));
        assert_eq!(load_index(&location)?, chunks);
        Ok(())
    }

    #[test]
    fn index_file_is_a_plain_string_array() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        save_index(&["a", "b"], dir.path())?;

        let raw = fs::read_to_string(dir.path().join(INDEX_FILE_NAME))?;
        assert_eq!(raw, r#"["a","b"]"#);
        Ok(())
    }

    #[test]
    fn missing_index_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert!(matches!(load_index(dir.path()), Err(StoreError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn non_string_array_is_corrupt() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join(INDEX_FILE_NAME), b"[1, 2, 3]")?;
        assert!(matches!(
            load_index(dir.path()),
            Err(StoreError::Corrupt { .. })
        ));

        fs::write(dir.path().join(INDEX_FILE_NAME), b"{not json")?;
        assert!(matches!(
            load_index(dir.path()),
            Err(StoreError::Corrupt { .. })
        ));
        Ok(())
    }
}
