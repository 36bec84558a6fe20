use crate::config::InertiaConfig;
use crate::utils::inertia_err_msg;
use futures_util::future::BoxFuture;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Version reported when assets versioning is disabled.
pub const NO_VERSIONING: &str = "__noversioning__";

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("environment variable pattern is valid")
});

/// Computes the assets version from the contents of the assets directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFingerprinter {
    enabled: bool,
    directories: Vec<PathBuf>,
}

impl AssetFingerprinter {
    pub fn new(enabled: bool, directories: Vec<PathBuf>) -> Self {
        Self {
            enabled,
            directories,
        }
    }

    /// Builds a fingerprinter from `config.use_versioning` and `config.assets_dirs`, expanding
    /// `$VAR` / `${VAR}` environment variables and `@alias` prefixes in every directory.
    pub fn from_config(config: &InertiaConfig) -> Self {
        let directories = config
            .assets_dirs
            .iter()
            .map(|dir| expand_path(dir, &config.aliases))
            .collect();

        Self::new(config.use_versioning, directories)
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Hashes every assets directory and folds the results into a single token. Identical
    /// directory trees always produce the same token.
    pub async fn fingerprint(&self) -> String {
        if !self.enabled {
            return NO_VERSIONING.to_string();
        }

        let mut aggregates = String::new();
        for directory in &self.directories {
            aggregates.push_str(&hash_directory(directory.clone()).await);
        }

        sha256_hex(aggregates.as_bytes())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Recursive aggregate hash of a directory. Entries are visited by name, subdirectories
/// contribute their own aggregate and files the hash of their contents. A missing directory
/// hashes to an empty string.
fn hash_directory(directory: PathBuf) -> BoxFuture<'static, String> {
    Box::pin(async move {
        let mut entries = match tokio::fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    log::warn!(
                        "{}",
                        inertia_err_msg(format!(
                            "Failed to read assets directory {}: {}",
                            directory.display(),
                            err
                        ))
                    );
                }
                return String::new();
            }
        };

        let mut paths = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => paths.push(entry.path()),
                Ok(None) => break,
                Err(err) => {
                    log::warn!(
                        "{}",
                        inertia_err_msg(format!(
                            "Failed to list assets directory {}: {}",
                            directory.display(),
                            err
                        ))
                    );
                    break;
                }
            }
        }
        paths.sort();

        let mut hashes = String::new();
        for path in paths {
            let is_dir = tokio::fs::metadata(&path)
                .await
                .map(|metadata| metadata.is_dir())
                .unwrap_or(false);

            if is_dir {
                hashes.push_str(&hash_directory(path).await);
                continue;
            }

            match tokio::fs::read(&path).await {
                Ok(contents) => hashes.push_str(&sha256_hex(&contents)),
                Err(err) => log::warn!(
                    "{}",
                    inertia_err_msg(format!(
                        "Failed to read asset {}: {}",
                        path.display(),
                        err
                    ))
                ),
            }
        }

        sha256_hex(hashes.as_bytes())
    })
}

/// Expands `@alias` prefixes, then `$VAR` / `${VAR}` environment variables.
pub(crate) fn expand_path(raw: &str, aliases: &HashMap<String, String>) -> PathBuf {
    let path = if raw.starts_with('@') {
        let (alias, rest) = raw.split_at(raw.find('/').unwrap_or(raw.len()));

        match aliases.get(alias) {
            Some(target) => format!("{}{}", target, rest),
            None => {
                log::warn!(
                    "{}",
                    inertia_err_msg(format!("Unknown alias {} in assets directory {}", alias, raw))
                );
                raw.to_string()
            }
        }
    } else {
        raw.to_string()
    };

    let expanded = ENV_VAR.replace_all(&path, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |name| name.as_str());

        std::env::var(name).unwrap_or_else(|_| {
            log::warn!(
                "{}",
                inertia_err_msg(format!(
                    "Environment variable {} used by assets directory {} is not set",
                    name, raw
                ))
            );
            String::new()
        })
    });

    PathBuf::from(expanded.into_owned())
}
