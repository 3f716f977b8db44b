//! Redirect rules and the id ranges that own them.
//!
//! Rule ids live in a flat integer namespace shared with any other rule owner
//! in the enforcement engine. SiteGate only ever claims ids from its reserved
//! [`IdRange`]; the destination at list position `i` always maps to
//! `base + i`, recomputed from the current settings on every pass.

pub mod block_page;
mod range;

pub use range::IdRange;

use serde::{Deserialize, Serialize};

/// Kind of request a rule applies to.
///
/// SiteGate only emits [`ResourceType::MainFrame`]; the rest appear in rules
/// other owners keep in the same engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Top-level navigation
    MainFrame,
    SubFrame,
    Script,
    Image,
    Xmlhttprequest,
    Other,
}

/// What the engine does with a matching request. Generated rules always
/// redirect; `Block` is read back from other owners' rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleAction {
    Redirect { redirect: Redirect },
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub url: String,
}

/// Which requests a rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// A single redirect rule as held by the enforcement engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

impl Rule {
    /// Pattern the rule matches against.
    pub fn url_filter(&self) -> &str {
        &self.condition.url_filter
    }

    /// Redirect target, if this is a redirect rule.
    pub fn redirect_url(&self) -> Option<&str> {
        match &self.action {
            RuleAction::Redirect { redirect } => Some(&redirect.url),
            RuleAction::Block => None,
        }
    }
}

/// Fixed parts shared by every generated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTemplate {
    pub base_offset: u32,
    pub priority: u32,
    pub redirect_url: String,
}

/// Build one redirect rule per destination.
///
/// Patterns are passed through verbatim; pattern syntax is the engine's
/// concern. Ids are `base_offset + index`, contiguous and increasing. Ids
/// never wrap: output stops at the first destination whose id would pass
/// `u32::MAX`, which [`IdRange::owned_within`] rules out for a valid reserved
/// range.
pub fn build_rules(destinations: &[String], template: &RuleTemplate) -> Vec<Rule> {
    destinations
        .iter()
        .enumerate()
        .map_while(|(index, site)| {
            let id = u32::try_from(index)
                .ok()
                .and_then(|i| template.base_offset.checked_add(i))?;
            Some((id, site))
        })
        .map(|(id, site)| Rule {
            id,
            priority: template.priority,
            action: RuleAction::Redirect {
                redirect: Redirect {
                    url: template.redirect_url.clone(),
                },
            },
            condition: RuleCondition {
                url_filter: site.clone(),
                resource_types: vec![ResourceType::MainFrame],
            },
        })
        .collect()
}
