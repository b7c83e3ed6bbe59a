use std::path::Path;

use tokio::{fs::File, io::AsyncReadExt};

/// Reads the snapshot file at `path`, or `None` when it does not exist.
pub async fn read_rdb_file(path: &Path) -> tokio::io::Result<Option<Vec<u8>>> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(error) if error.kind() == tokio::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };

    let mut buffer = Vec::with_capacity(file.metadata().await?.len() as usize);
    file.read_to_end(&mut buffer).await?;

    Ok(Some(buffer))
}
