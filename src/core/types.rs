use serde::Serialize;

/// Identifier of a booth, stable for the booth's whole life
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BoothId(pub(crate) String);

impl BoothId {
    /// Create a new booth ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BoothId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BoothId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a toll plaza
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlazaId(pub(crate) u32);

impl PlazaId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Derive the ID of the `index`th booth of this plaza, e.g. `P1-B3`
    pub fn booth(&self, index: usize) -> BoothId {
        BoothId(format!("P{}-B{}", self.0, index))
    }
}

impl std::fmt::Display for PlazaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlazaId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
