/*
 * Search Module
 *
 * Manual filtering of the catalog (category, tags, exclusive-only) and the
 * mapping of oracle answers back onto catalog entries. An oracle answer
 * without ids falls back to the manual filter, so a genuine "no match" and
 * a failed oracle call look the same to the rest of the app.
 */

use crate::catalog::Dapp;

pub const APP_TAGS: [&str; 12] = [
    "AI",
    "Betting",
    "DeFi",
    "DePIN",
    "Gaming",
    "Governance",
    "NFT",
    "Other",
    "Payments",
    "Prediction",
    "RWA",
    "Social",
];

pub const INFRA_TAGS: [&str; 18] = [
    "Account",
    "Abstraction",
    "Analytics",
    "Cross-Chain",
    "Dev",
    "Tooling",
    "Gaming",
    "Identity",
    "Indexer",
    "Onramp",
    "Oracle",
    "Other",
    "Infra",
    "Privacy",
    "RPC",
    "Stablecoin",
    "Wallet",
    "Zero-Knowledge",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    App,
    Infra,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::All, Category::App, Category::Infra];

    pub fn label(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::App => "App",
            Category::Infra => "Infra",
        }
    }

    // Tags offered for this category; "All" is the sorted union
    pub fn visible_tags(self) -> Vec<&'static str> {
        match self {
            Category::App => APP_TAGS.to_vec(),
            Category::Infra => INFRA_TAGS.to_vec(),
            Category::All => {
                let mut tags: Vec<&'static str> =
                    APP_TAGS.iter().chain(INFRA_TAGS.iter()).copied().collect();
                tags.sort_unstable();
                tags.dedup();
                tags
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualFilter {
    pub category: Category,
    pub selected_tags: Vec<String>,
    pub exclusive_only: bool,
}

impl ManualFilter {
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.selected_tags.iter().position(|t| t == tag) {
            self.selected_tags.remove(pos);
        } else {
            self.selected_tags.push(tag.to_string());
        }
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected_tags.iter().any(|t| t == tag)
    }

    pub fn matches(&self, dapp: &Dapp) -> bool {
        if self.category != Category::All {
            let category = self.category.label().to_lowercase();
            if !dapp.project_type.to_lowercase().contains(&category) {
                return false;
            }
        }

        if !self.selected_tags.is_empty() {
            let any_tag = self.selected_tags.iter().any(|wanted| {
                let wanted = wanted.to_lowercase();
                dapp.tags.iter().any(|t| t.to_lowercase().contains(&wanted))
            });
            if !any_tag {
                return false;
            }
        }

        !self.exclusive_only || dapp.exclusive
    }

    pub fn apply(&self, entries: &[Dapp]) -> Vec<Dapp> {
        entries.iter().filter(|d| self.matches(d)).cloned().collect()
    }

    pub fn count(&self, entries: &[Dapp]) -> usize {
        entries.iter().filter(|d| self.matches(d)).count()
    }
}

/// Resolve oracle ids to entries, or fall back to the manual filter when
/// the oracle returned nothing.
pub fn resolve_results(entries: &[Dapp], ids: &[String], fallback: &ManualFilter) -> Vec<Dapp> {
    if ids.is_empty() {
        return fallback.apply(entries);
    }
    entries
        .iter()
        .filter(|d| ids.iter().any(|id| *id == d.id))
        .cloned()
        .collect()
}
