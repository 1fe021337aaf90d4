use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// The header row of a CSV source: column names in file order plus a reverse index.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<Header>,
    header_map: HashMap<Header, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from a list of header strings. Duplicate headers are rejected
    /// because cells could no longer be addressed by name.
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<Header> = headers.into_iter().map(|s| s.into().into()).collect();

        let header_map: HashMap<Header, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.to_owned(), idx))
            .collect();

        if header_map.len() != headers.len() {
            let mut seen = HashMap::new();
            let duplicate = headers
                .iter()
                .find(|h| seen.insert(*h, ()).is_some())
                .map(|h| h.as_ref().to_string())
                .unwrap_or_default();
            return Err(MappingError(format!(
                "Encountered a duplicate header '{duplicate}'"
            )));
        }

        Ok(Self {
            headers,
            header_map,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn header_index(&self, header: impl Into<Header>) -> Option<usize> {
        let h = header.into();
        self.header_map.get(&h).cloned()
    }

    /// Like `header_index` but for columns the caller cannot do without.
    pub fn require(&self, header: &str) -> Result<usize, MappingError> {
        self.header_index(header).ok_or_else(|| {
            MappingError(format!(
                "The required column '{header}' is missing, found columns: {}",
                self.headers
                    .iter()
                    .map(|h| format!("'{}'", h.as_ref()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.headers.iter().map(|h| h.as_ref()))
    }
}

/// Represents a column header in the CSV source, for example, `Total (EUR)`
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct Header(String);

impl AsRef<str> for Header {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl<S: Into<String>> From<S> for Header {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
