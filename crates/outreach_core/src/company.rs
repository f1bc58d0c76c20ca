use serde::{Deserialize, Serialize};

/// Minimum query length before a lookup is worth issuing.
pub const MIN_QUERY_LEN: usize = 2;

/// A company record as returned by the autocomplete endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub logo: String,
}

impl Company {
    /// A record known only by its domain, e.g. when supplied on the command line.
    pub fn from_domain(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            name: domain.clone(),
            domain,
            logo: String::new(),
        }
    }
}

/// Which of the two company pickers a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

/// Trims `raw` and returns it if it is long enough to look up.
pub fn lookup_query(raw: &str, min_len: usize) -> Option<&str> {
    let query = raw.trim();
    (query.chars().count() >= min_len).then_some(query)
}
