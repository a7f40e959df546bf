use std::fs;
use std::io;
use std::path::Path;

use tracing::info;

use super::atomic_io::write_text_atomic;
use super::{ProfileData, ProfileError, PROFILE_VERSION};
use crate::level::MAX_LEVEL_PROGRESS;

/// Reads the profile at `path`. A missing file yields a fresh profile.
pub fn load_profile(path: &Path) -> Result<ProfileData, ProfileError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "profile_missing_using_default");
            return Ok(ProfileData::default());
        }
        Err(source) => {
            return Err(ProfileError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let data = parse_profile_json(path, &raw)?;
    validate_profile(path, &data)?;
    info!(
        path = %path.display(),
        owned_items = data.owned_item_ids.len(),
        level_progress = data.level_progress,
        "profile_loaded"
    );
    Ok(data)
}

pub fn save_profile(path: &Path, data: &ProfileData) -> Result<(), ProfileError> {
    let json = serde_json::to_string_pretty(data).map_err(ProfileError::Encode)?;
    write_text_atomic(path, &json).map_err(|source| ProfileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_profile_json(path: &Path, raw: &str) -> Result<ProfileData, ProfileError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, ProfileData>(&mut deserializer).map_err(|error| {
        let field_path = error.path().to_string();
        ProfileError::Parse {
            path: path.to_path_buf(),
            field_path: if field_path.is_empty() {
                ".".to_string()
            } else {
                field_path
            },
            message: error.into_inner().to_string(),
        }
    })
}

fn validate_profile(path: &Path, data: &ProfileData) -> Result<(), ProfileError> {
    if data.profile_version != PROFILE_VERSION {
        return Err(ProfileError::Invalid {
            path: path.to_path_buf(),
            message: format!(
                "profile_version: expected {PROFILE_VERSION}, got {}",
                data.profile_version
            ),
        });
    }
    if !(0..=MAX_LEVEL_PROGRESS).contains(&data.level_progress) {
        return Err(ProfileError::Invalid {
            path: path.to_path_buf(),
            message: format!(
                "level_progress: {} is outside 0..={MAX_LEVEL_PROGRESS}",
                data.level_progress
            ),
        });
    }
    for (category, item_id) in &data.active_items {
        if !data.owned_item_ids.contains(item_id) {
            return Err(ProfileError::Invalid {
                path: path.to_path_buf(),
                message: format!(
                    "active_items.{category}: item {item_id} is active but not owned"
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::catalog::{ItemCategory, ItemId};

    #[test]
    fn missing_file_gives_default_profile() {
        let temp = TempDir::new().expect("temp");
        let data = load_profile(&temp.path().join("profile.json")).expect("load");
        assert_eq!(data, ProfileData::default());
    }

    #[test]
    fn saved_profile_reads_back() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("saves").join("profile.json");
        let mut data = ProfileData {
            level_progress: 13,
            ..ProfileData::default()
        };
        data.owned_item_ids.insert(ItemId(3));
        data.active_items.insert(ItemCategory::Weapon, ItemId(3));

        save_profile(&path, &data).expect("save");
        assert_eq!(load_profile(&path).expect("load"), data);
    }

    #[test]
    fn parse_error_reports_field_path() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("profile.json");
        fs::write(
            &path,
            r#"{"profile_version":1,"owned_item_ids":[1,"two"],"active_items":{}}"#,
        )
        .expect("write");

        let err = load_profile(&path).expect_err("parse");
        match err {
            ProfileError::Parse { field_path, .. } => {
                assert_eq!(field_path, "owned_item_ids[1]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_category_key_is_a_parse_error() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("profile.json");
        fs::write(
            &path,
            r#"{"profile_version":1,"owned_item_ids":[1],"active_items":{"None":1}}"#,
        )
        .expect("write");

        assert!(matches!(
            load_profile(&path).expect_err("parse"),
            ProfileError::Parse { .. }
        ));
    }

    #[test]
    fn active_item_must_be_owned() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("profile.json");
        fs::write(
            &path,
            r#"{"profile_version":1,"owned_item_ids":[1],"active_items":{"Skin":2}}"#,
        )
        .expect("write");

        let err = load_profile(&path).expect_err("invalid");
        assert!(err.to_string().contains("active_items.Skin"));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("profile.json");
        fs::write(&path, r#"{"profile_version":99}"#).expect("write");

        assert!(matches!(
            load_profile(&path).expect_err("version"),
            ProfileError::Invalid { .. }
        ));
    }

    #[test]
    fn out_of_range_progress_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("profile.json");
        for level_progress in [-1, MAX_LEVEL_PROGRESS + 1, i64::MAX] {
            let raw = format!(r#"{{"profile_version":1,"level_progress":{level_progress}}}"#);
            fs::write(&path, raw).expect("write");

            let err = load_profile(&path).expect_err("out of range");
            assert!(
                matches!(
                    &err,
                    ProfileError::Invalid { message, .. } if message.starts_with("level_progress")
                ),
                "{err}"
            );
        }
    }
}
