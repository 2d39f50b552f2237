use std::path::Path;

use serde::Serialize;
use snafu::ResultExt;

use super::error::{
    CreateDirectorySnafu, EncodeDocumentSnafu, ReplaceDocumentSnafu, StorageResult,
    WriteStagingSnafu,
};

/// Writes `value` as pretty JSON to `path` without ever exposing a partial file.
///
/// The document goes to a `.tmp` sibling first and is then renamed over the
/// target; missing parent directories are created.
pub fn write_json_atomically<T>(path: &Path, value: &T) -> StorageResult<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateDirectorySnafu {
            stage: "atomic-write-create-parent",
            path: parent.to_path_buf(),
        })?;
    }

    let encoded = serde_json::to_vec_pretty(value).context(EncodeDocumentSnafu {
        stage: "atomic-write-encode",
    })?;

    let staging = staging_path(path);
    std::fs::write(&staging, encoded).context(WriteStagingSnafu {
        stage: "atomic-write-staging",
        path: staging.clone(),
    })?;

    std::fs::rename(&staging, path).context(ReplaceDocumentSnafu {
        stage: "atomic-write-replace",
        from: staging,
        to: path.to_path_buf(),
    })
}

fn staging_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
