//! Field search for the condition editor, plus the debounce policy that drives it.

use crate::error::CatalogError;
use crate::registry::vocabulary::{CONDITIONS, MEDICATIONS};
use crate::registry::{DemographicField, Domain, OperatorRegistry};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCandidate {
    pub code: String,
    pub display: String,
    pub frequency: u32,
}

/// A ranked field lookup for one domain.
pub trait CatalogSearch {
    fn search(&self, term: &str, domain: Domain) -> Result<Vec<CatalogCandidate>, CatalogError>;
}

/// Searches the registry catalogs and seed vocabularies.
///
/// Prefix matches on code or display rank before substring matches; ties break on
/// frequency, then code.
pub struct RegistryCatalog<'a> {
    registry: &'a OperatorRegistry,
    min_chars: usize,
    limit: usize,
}

impl<'a> RegistryCatalog<'a> {
    pub fn new(registry: &'a OperatorRegistry) -> Self {
        Self {
            registry,
            min_chars: 2,
            limit: 20,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn candidates(&self, domain: Domain) -> Vec<CatalogCandidate> {
        let candidate = |code: &str, display: &str, frequency: u32| CatalogCandidate {
            code: code.to_string(),
            display: display.to_string(),
            frequency,
        };
        match domain {
            Domain::Demographic => DemographicField::ALL
                .iter()
                .map(|f| candidate(f.as_str(), f.display(), 0))
                .collect(),
            Domain::LabValue => self
                .registry
                .labs()
                .map(|l| candidate(&l.id, &l.display, l.frequency))
                .collect(),
            Domain::VitalSign => self
                .registry
                .vitals()
                .map(|v| candidate(&v.id, &v.display, v.frequency))
                .collect(),
            Domain::MedicalCondition => CONDITIONS
                .iter()
                .map(|e| candidate(e.code, e.display, e.frequency))
                .collect(),
            Domain::Medication => MEDICATIONS
                .iter()
                .map(|e| candidate(e.code, e.display, e.frequency))
                .collect(),
        }
    }
}

impl CatalogSearch for RegistryCatalog<'_> {
    fn search(&self, term: &str, domain: Domain) -> Result<Vec<CatalogCandidate>, CatalogError> {
        let term = term.trim().to_lowercase();
        if term.chars().count() < self.min_chars {
            return Err(CatalogError::TermTooShort {
                min_chars: self.min_chars,
            });
        }
        let mut ranked: Vec<(u8, CatalogCandidate)> = self
            .candidates(domain)
            .into_iter()
            .filter_map(|c| {
                let code = c.code.to_lowercase();
                let display = c.display.to_lowercase();
                let rank = if code.starts_with(&term) || display.starts_with(&term) {
                    0
                } else if code.contains(&term) || display.contains(&term) {
                    1
                } else {
                    return None;
                };
                Some((rank, c))
            })
            .collect();
        ranked.sort_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then(b.frequency.cmp(&a.frequency))
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(ranked.into_iter().take(self.limit).map(|(_, c)| c).collect())
    }
}

/// Debounces keystrokes into search requests: the last term wins once input has been
/// quiet for the debounce interval.
///
/// The caller feeds it instants; it never sleeps or spawns.
#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    min_chars: usize,
    generation: u64,
    pending: Option<(String, Instant)>,
}

/// A search request released by the debouncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
    pub generation: u64,
}

impl SearchDebouncer {
    pub fn new(delay: Duration, min_chars: usize) -> Self {
        Self {
            delay,
            min_chars,
            generation: 0,
            pending: None,
        }
    }

    pub fn from_config(config: &crate::config::SearchConfig) -> Self {
        Self::new(Duration::from_millis(config.debounce_ms), config.min_chars)
    }

    /// Records a keystroke. Terms shorter than the minimum cancel any pending search.
    pub fn input(&mut self, term: &str, now: Instant) {
        self.generation += 1;
        let term = term.trim();
        self.pending = if term.chars().count() >= self.min_chars {
            Some((term.to_string(), now))
        } else {
            None
        };
    }

    /// Releases the pending search once the input has been quiet long enough.
    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        let (_, at) = self.pending.as_ref()?;
        if now.saturating_duration_since(*at) < self.delay {
            return None;
        }
        let (term, _) = self.pending.take()?;
        Some(SearchRequest {
            term,
            generation: self.generation,
        })
    }

    /// Whether results for `request` are still wanted (no newer input since).
    pub fn accept(&self, request: &SearchRequest) -> bool {
        request.generation == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matches_rank_first() {
        let registry = OperatorRegistry::new();
        let catalog = RegistryCatalog::new(&registry);
        let codes = |term: &str| -> Vec<String> {
            catalog
                .search(term, Domain::VitalSign)
                .unwrap()
                .into_iter()
                .map(|c| c.code)
                .collect()
        };
        // Substring matches only, so frequency decides.
        assert_eq!(
            codes("press"),
            vec!["blood-pressure", "blood-pressure-systolic", "blood-pressure-diastolic"]
        );
        // The prefix match outranks the more frequent heart rate.
        assert_eq!(codes("te"), vec!["temperature", "heart-rate", "respiratory-rate"]);
        let results = catalog.search("gl", Domain::LabValue).unwrap();
        assert_eq!(results[0].code, "glucose");
    }

    #[test]
    fn short_terms_are_rejected() {
        let registry = OperatorRegistry::new();
        let catalog = RegistryCatalog::new(&registry);
        assert_eq!(
            catalog.search("a", Domain::Medication),
            Err(CatalogError::TermTooShort { min_chars: 2 })
        );
    }

    #[test]
    fn debouncer_releases_last_term() {
        let start = Instant::now();
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(300), 2);
        debouncer.input("me", start);
        debouncer.input("met", start + Duration::from_millis(100));
        assert_eq!(debouncer.poll(start + Duration::from_millis(350)), None);
        let request = debouncer.poll(start + Duration::from_millis(400)).unwrap();
        assert_eq!(request.term, "met");
        assert!(debouncer.accept(&request));
        debouncer.input("metf", start + Duration::from_millis(450));
        assert!(!debouncer.accept(&request));
    }
}
