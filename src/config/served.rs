// Served-file set
// The exact list of names given on the command line; nothing else is reachable

use std::ffi::OsString;

/// Immutable allow-list of shared files
#[derive(Debug, Clone, Default)]
pub struct ServedFiles {
    names: Vec<String>,
}

impl ServedFiles {
    /// Build the set from raw command-line arguments
    ///
    /// A leading `./` is dropped so that `./a.txt` is served as `/a.txt`.
    /// Names that are not valid UTF-8 cannot be addressed by a decoded
    /// request path and are skipped with a warning.
    pub fn from_args(args: impl IntoIterator<Item = OsString>) -> Self {
        let names = args
            .into_iter()
            .filter_map(|arg| match arg.into_string() {
                Ok(name) => Some(name),
                Err(raw) => {
                    crate::logger::log_warning(&format!(
                        "Skipping {}: file name is not valid UTF-8",
                        raw.to_string_lossy()
                    ));
                    None
                }
            })
            .map(|name| match name.strip_prefix("./") {
                Some(stripped) if !stripped.is_empty() => stripped.to_string(),
                _ => name,
            })
            .collect();

        Self { names }
    }

    /// Exact string match, no normalization
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The only entry, when exactly one file is shared
    pub fn single(&self) -> Option<&str> {
        match self.names.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ServedFiles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
