//! Result cache file format.
//!
//! A cache file holds exactly one [`ResolvedResult`]: a fixed header (the
//! `WFRC` magic followed by a little-endian `u16` format version) and a
//! `bincode` payload. Writers replace the target through a sibling temporary
//! file so readers never observe a half-written cache.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use bincode::{deserialize_from, serialize_into};
use log::debug;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use wayfetch_core::ResolvedResult;

/// File identifier for result caches.
pub const CACHE_MAGIC: [u8; 4] = *b"WFRC";

/// Supported version of the cache format.
pub const CACHE_VERSION: u16 = 1;

/// Header and payload as written to disk.
#[derive(Debug, Serialize)]
struct CacheFile<'a> {
    magic: [u8; 4],
    version: u16,
    result: &'a ResolvedResult,
}

/// Error emitted when saving or loading a result cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache could not be read from or written to disk.
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        /// Cache file location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The result could not be encoded.
    #[error("failed to encode cache for {path}: {source}")]
    Encode {
        /// Cache file location.
        path: PathBuf,
        /// Encoder failure from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The payload could not be decoded.
    #[error("failed to decode cache from {path}: {source}")]
    Decode {
        /// Cache file location.
        path: PathBuf,
        /// Decoder error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The file did not start with the cache magic.
    #[error("{path} is not a wayfetch cache: expected magic {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Cache file location.
        path: PathBuf,
        /// Expected byte sequence.
        expected: [u8; 4],
        /// Sequence read from the file.
        found: [u8; 4],
    },
    /// The file was written by an incompatible format version.
    #[error("unsupported cache version {found} in {path}; supported version is {supported}")]
    UnsupportedVersion {
        /// Cache file location.
        path: PathBuf,
        /// Version present in the file header.
        found: u16,
        /// Version this binary reads and writes.
        supported: u16,
    },
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Persist `result` at `path`, replacing any existing file.
///
/// Missing parent directories are created. The payload is written to a
/// temporary file in the destination directory, flushed to disk and then
/// renamed over `path`.
///
/// # Errors
///
/// Returns [`CacheError::Io`] when the directory, temporary file or rename
/// fails and [`CacheError::Encode`] when serialisation fails.
pub fn save(path: &Path, result: &ResolvedResult) -> Result<(), CacheError> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| CacheError::io(path, source))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|source| CacheError::io(path, source))?;
    let payload = CacheFile {
        magic: CACHE_MAGIC,
        version: CACHE_VERSION,
        result,
    };
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serialize_into(&mut writer, &payload).map_err(|source| CacheError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        writer
            .flush()
            .map_err(|source| CacheError::io(path, source))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|source| CacheError::io(path, source))?;
    temp.persist(path)
        .map_err(|err| CacheError::io(path, err.error))?;

    debug!("saved {} ways to {}", result.ways.len(), path.display());
    Ok(())
}

/// Load a result previously written by [`save`].
///
/// # Errors
///
/// Returns [`CacheError::Io`] when the file is missing or truncated inside
/// the header, [`CacheError::InvalidMagic`] for foreign files,
/// [`CacheError::UnsupportedVersion`] for other format versions and
/// [`CacheError::Decode`] for corrupt payloads.
pub fn load(path: &Path) -> Result<ResolvedResult, CacheError> {
    let file = File::open(path).map_err(|source| CacheError::io(path, source))?;
    let mut reader = BufReader::new(file);

    let mut magic = [0_u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|source| CacheError::io(path, source))?;
    if magic != CACHE_MAGIC {
        return Err(CacheError::InvalidMagic {
            path: path.to_path_buf(),
            expected: CACHE_MAGIC,
            found: magic,
        });
    }

    let mut version_bytes = [0_u8; 2];
    reader
        .read_exact(&mut version_bytes)
        .map_err(|source| CacheError::io(path, source))?;
    let version = u16::from_le_bytes(version_bytes);
    if version != CACHE_VERSION {
        return Err(CacheError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: version,
            supported: CACHE_VERSION,
        });
    }

    let result: ResolvedResult =
        deserialize_from(&mut reader).map_err(|source| CacheError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("loaded {} ways from {}", result.ways.len(), path.display());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;
    use wayfetch_core::{Member, MemberKind, Node, Relation, ResolvedWay, Tags};

    fn way(id: u64, nodes: Vec<Node>) -> ResolvedWay {
        ResolvedWay {
            id,
            nodes,
            tags: Tags::from([("highway".to_owned(), "residential".to_owned())]),
        }
    }

    #[fixture]
    fn temp_cache_path() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("roads.wfrc");
        (dir, path)
    }

    fn empty() -> ResolvedResult {
        ResolvedResult::default()
    }

    fn way_without_nodes() -> ResolvedResult {
        ResolvedResult {
            ways: vec![way(1, Vec::new())],
            relations: Vec::new(),
        }
    }

    fn duplicate_coordinates() -> ResolvedResult {
        let start = Node::untagged(11, 19.98687, 50.0885);
        ResolvedResult {
            ways: vec![way(
                2,
                vec![
                    start.clone(),
                    Node::new(
                        12,
                        19.9903,
                        50.0904,
                        Tags::from([("crossing".to_owned(), "zebra".to_owned())]),
                    ),
                    Node::untagged(13, 19.9903, 50.0904),
                    start,
                ],
            )],
            relations: vec![Relation {
                id: 90,
                members: vec![Member {
                    kind: MemberKind::Way,
                    reference: 2,
                    role: "forward".to_owned(),
                }],
                tags: Tags::from([("route".to_owned(), "bicycle".to_owned())]),
            }],
        }
    }

    #[rstest]
    #[case::zero_ways(empty())]
    #[case::way_without_nodes(way_without_nodes())]
    #[case::duplicate_coordinates(duplicate_coordinates())]
    fn save_then_load_reproduces_result(
        temp_cache_path: (TempDir, PathBuf),
        #[case] result: ResolvedResult,
    ) {
        let (_dir, path) = temp_cache_path;
        save(&path, &result).expect("save cache");
        let loaded = load(&path).expect("load cache");
        assert_eq!(loaded, result);
    }

    #[rstest]
    fn save_creates_missing_directories(temp_cache_path: (TempDir, PathBuf)) {
        let (dir, _) = temp_cache_path;
        let nested = dir.path().join("a").join("b").join("roads.wfrc");
        save(&nested, &duplicate_coordinates()).expect("save cache");
        assert!(nested.is_file());
    }

    #[rstest]
    fn save_overwrites_existing_cache(temp_cache_path: (TempDir, PathBuf)) {
        let (_dir, path) = temp_cache_path;
        save(&path, &duplicate_coordinates()).expect("first save");
        save(&path, &empty()).expect("second save");
        assert_eq!(load(&path).expect("load cache"), empty());
    }

    #[rstest]
    fn missing_file_is_an_io_error(temp_cache_path: (TempDir, PathBuf)) {
        let (_dir, path) = temp_cache_path;
        let err = load(&path).expect_err("missing cache");
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[rstest]
    fn foreign_magic_is_rejected(temp_cache_path: (TempDir, PathBuf)) {
        let (_dir, path) = temp_cache_path;
        fs::write(&path, b"PK\x03\x04rest-of-a-zip").expect("write file");
        let err = load(&path).expect_err("foreign file");
        match err {
            CacheError::InvalidMagic { found, expected, .. } => {
                assert_eq!(found, *b"PK\x03\x04");
                assert_eq!(expected, CACHE_MAGIC);
            }
            other => panic!("expected InvalidMagic, got {other:?}"),
        }
    }

    #[rstest]
    fn other_versions_are_rejected(temp_cache_path: (TempDir, PathBuf)) {
        let (_dir, path) = temp_cache_path;
        let mut bytes = CACHE_MAGIC.to_vec();
        bytes.extend_from_slice(&(CACHE_VERSION + 1).to_le_bytes());
        fs::write(&path, bytes).expect("write file");
        let err = load(&path).expect_err("future version");
        assert!(matches!(
            err,
            CacheError::UnsupportedVersion { found, supported, .. }
                if found == CACHE_VERSION + 1 && supported == CACHE_VERSION
        ));
    }

    #[rstest]
    fn truncated_payload_is_a_decode_error(temp_cache_path: (TempDir, PathBuf)) {
        let (_dir, path) = temp_cache_path;
        save(&path, &duplicate_coordinates()).expect("save cache");
        let bytes = fs::read(&path).expect("read cache");
        let cut = bytes.get(..bytes.len() - 5).expect("payload longer than 5 bytes");
        fs::write(&path, cut).expect("truncate cache");
        let err = load(&path).expect_err("corrupt payload");
        assert!(matches!(err, CacheError::Decode { .. }));
    }
}
