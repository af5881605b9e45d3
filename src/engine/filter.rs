//! Shared crew eligibility predicate. The table view, the scoring pass and
//! the combo candidate set all go through the same filter so they can never
//! disagree about which crew are in play.

use crate::engine::state::CrewRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipFilter {
    Any,
    OwnedOnly,
    UnownedOnly,
}

impl Default for OwnershipFilter {
    fn default() -> Self {
        OwnershipFilter::Any
    }
}

impl OwnershipFilter {
    /// Lenient parse for query strings and CLI flags. Empty means no filter.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "all" => Some(Self::Any),
            "owned" | "owned-only" => Some(Self::OwnedOnly),
            "unowned" | "unowned-only" => Some(Self::UnownedOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievabilityFilter {
    Any,
    RetrievableOnly,
    NonRetrievableOnly,
}

impl Default for RetrievabilityFilter {
    fn default() -> Self {
        RetrievabilityFilter::Any
    }
}

impl RetrievabilityFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "all" => Some(Self::Any),
            "retrievable" => Some(Self::RetrievableOnly),
            "non-retrievable" | "nonretrievable" | "unretrievable" => {
                Some(Self::NonRetrievableOnly)
            }
            _ => None,
        }
    }
}

/// The user's active view filters. `matches` covers the hard criteria;
/// search text is kept separate because combo discovery ranks by it instead
/// of excluding on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrewFilter {
    pub ownership: OwnershipFilter,
    /// Exact max-rarity bucket, e.g. 5 shows only five-star crew.
    pub rarity: Option<u8>,
    pub retrievability: RetrievabilityFilter,
    pub search: Option<String>,
}

impl CrewFilter {
    pub fn matches(&self, crew: &CrewRecord) -> bool {
        let ownership_ok = match self.ownership {
            OwnershipFilter::Any => true,
            OwnershipFilter::OwnedOnly => crew.owned(),
            OwnershipFilter::UnownedOnly => !crew.owned(),
        };
        if !ownership_ok {
            return false;
        }

        if let Some(rarity) = self.rarity {
            if crew.max_rarity != rarity {
                return false;
            }
        }

        match self.retrievability {
            RetrievabilityFilter::Any => true,
            RetrievabilityFilter::RetrievableOnly => crew.retrievable,
            RetrievabilityFilter::NonRetrievableOnly => !crew.retrievable,
        }
    }

    /// Case-insensitive name match; trivially true with no search term.
    pub fn search_matches(&self, crew: &CrewRecord) -> bool {
        match self.search_term() {
            Some(term) => crew.name.to_lowercase().contains(&term),
            None => true,
        }
    }

    pub fn matches_with_search(&self, crew: &CrewRecord) -> bool {
        self.matches(crew) && self.search_matches(crew)
    }

    pub fn has_search(&self) -> bool {
        self.search_term().is_some()
    }

    fn search_term(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim().to_lowercase();
        if term.is_empty() {
            None
        } else {
            Some(term)
        }
    }
}
