//! Directory names produced during the current run
//!
//! Two different ad links can render to the same directory name, for example
//! two ads with the same title under a title-based name template. The
//! registry lets the run loop notice this instead of overwriting the first
//! ad's listing. It lives for one run only and is never persisted.

use std::collections::HashMap;

/// Result of reserving a directory name for an ad
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// First time this ad is seen in this run, write it to this directory
    Fresh(String),

    /// The ad was already written in this run, to this directory
    Repeat(String),
}

/// Maps each produced directory name to the id of the ad written there
#[derive(Debug, Clone, Default)]
pub struct VisitedRegistry {
    dirs: HashMap<String, String>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `name` was already produced in this run
    pub fn contains(&self, name: &str) -> bool {
        self.dirs.contains_key(name)
    }

    /// Reserves a directory name for an ad
    ///
    /// Names are tried in the order `name`, `name-id`, `name-id-2`,
    /// `name-id-3`, ... until one is free or already belongs to this ad.
    ///
    /// # Returns
    ///
    /// * `Claim::Fresh(dir)` - `dir` is now reserved for this ad
    /// * `Claim::Repeat(dir)` - this ad was already written to `dir`
    pub fn claim(&mut self, name: &str, id: &str) -> Claim {
        let mut candidate = name.to_string();
        let mut attempt = 1u32;

        loop {
            match self.dirs.get(&candidate) {
                Some(owner) if owner == id => return Claim::Repeat(candidate),
                Some(_) => {}
                None => {
                    if candidate != name {
                        tracing::warn!(
                            dir = name,
                            using = %candidate,
                            "directory already written in this run"
                        );
                    }
                    self.dirs.insert(candidate.clone(), id.to_string());
                    return Claim::Fresh(candidate);
                }
            }

            attempt += 1;
            candidate = if attempt == 2 {
                format!("{}-{}", name, id)
            } else {
                format!("{}-{}-{}", name, id, attempt - 1)
            };
        }
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}
