//! Canonical form of the `files` argument accepted by `add`.
//!
//! Clients send nothing, one name, or several names (possibly
//! comma-separated). Every shape collapses to one ordered, non-empty list
//! before a backend sees it.

/// Token meaning "everything under the working directory".
pub const ALL_FILES: &str = ".";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileArgs(Vec<String>);

impl FileArgs {
    /// No files given: stage everything.
    pub fn all() -> Self {
        Self(vec![ALL_FILES.to_string()])
    }

    pub fn from_scalar(file: &str) -> Self {
        Self::from_list([file])
    }

    pub fn from_list<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let files: Vec<String> = files
            .into_iter()
            .flat_map(|f| {
                f.as_ref()
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        if files.is_empty() {
            Self::all()
        } else {
            Self(files)
        }
    }

    /// Normalize an optional list.
    pub fn normalize(files: Option<&[String]>) -> Self {
        match files {
            None => Self::all(),
            Some(files) => Self::from_list(files),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// `a, b, c` for confirmation messages.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}
