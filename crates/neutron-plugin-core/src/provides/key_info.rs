// # RNDC Key Info
//
// Key material is read from a BIND style key file and handed to every
// peer on the relation. Each line is split on whitespace; the first token
// is a label and the second its value:
//
// ```text
// key "rndc-key" {
//     algorithm hmac-md5;
//     secret "c3VwZXJzZWNyZXQ=";
// };
// ```
//
// Only the `algorithm` and `secret` labels are used. A trailing `;` and
// surrounding double quotes are stripped from values. Labels that never
// appear yield absent values instead of errors.

use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::RemoteData;

/// Remote key carrying the RNDC secret
pub const RNDC_KEY_KEY: &str = "rndckey";

/// Remote key carrying the key algorithm
pub const ALGORITHM_KEY: &str = "algorithm";

/// Key material parsed from a key file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInfo {
    /// Key algorithm (e.g., "hmac-md5")
    pub algorithm: Option<String>,
    /// Key secret
    pub secret: Option<String>,
}

impl KeyInfo {
    /// Parse key file contents
    ///
    /// Never fails: unrecognised or short lines are skipped, and if a label
    /// appears more than once the last value wins.
    pub fn parse(content: &str) -> Self {
        let mut info = KeyInfo::default();

        for line in content.lines() {
            let mut tokens = line.split_whitespace();
            let (Some(label), Some(value)) = (tokens.next(), tokens.next()) else {
                continue;
            };

            match label {
                "algorithm" => info.algorithm = clean_value(value),
                "secret" => info.secret = clean_value(value),
                _ => {}
            }
        }

        info
    }

    /// Read and parse a key file
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyFile` if the file cannot be read. Missing labels
    /// are not errors.
    pub async fn read(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::key_file(path, e))?;

        let info = Self::parse(&content);
        if info.algorithm.is_none() || info.secret.is_none() {
            tracing::warn!(
                "Key file {} is missing algorithm or secret; sending absent values",
                path.display()
            );
        }
        Ok(info)
    }

    /// Remote data announcing this key to a peer
    pub fn to_remote_data(&self) -> RemoteData {
        RemoteData::new()
            .with_optional(RNDC_KEY_KEY, self.secret.clone())
            .with_optional(ALGORITHM_KEY, self.algorithm.clone())
    }
}

fn clean_value(value: &str) -> Option<String> {
    let value = value.trim_end_matches(';').trim_matches('"');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
