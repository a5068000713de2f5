//! Representation for firmware upgrade payloads.

use std::path::PathBuf;

/// One payload image of a device firmware update.
#[derive(Debug)]
pub struct Payload {
    /// URI the payload will be fetched from.
    pub uri: String,

    /// The size of the payload in bytes.
    pub size: usize,

    /// The raw bytes of the payload.
    pub bytes: Vec<u8>,
}

/// Create the payload list of an update from raw image files. Each
/// payload's URI is the file name appended to `uri_base`.
pub fn from_files(files: &[PathBuf], uri_base: &str) -> Vec<Payload> {
    files
        .iter()
        .map(|file| {
            let bytes = std::fs::read(file)
                .unwrap_or_else(|_| panic!("could not read file `{:?}`", file));

            let name = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_else(|| panic!("unusable file name `{:?}`", file));

            Payload {
                uri: format!("{}{}", uri_base, name),
                size: bytes.len(),
                bytes,
            }
        })
        .collect()
}
