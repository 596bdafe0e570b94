//! Selector resolution
//!
//! Turns a [`Selector`] into a [`ResolvedBundle`]: the ordered, duplicate
//! free list of skill names to install. Output is always ordered by tier
//! rank and then by declaration order, because later tiers build on the
//! vocabulary of earlier ones.

use std::collections::HashSet;
use tracing::{debug, info};

use skillpm_types::{ResolvedBundle, Selector, Tier};

use crate::bundles::BundleCatalog;
use crate::error::ResolutionError;
use crate::registry::SkillRegistry;

/// Resolves selectors against one registry snapshot
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a SkillRegistry,
    bundles: &'a BundleCatalog,
}

/// Walk state for one resolution
#[derive(Default)]
struct Walk {
    /// Registry positions in first-seen order
    picked: Vec<usize>,
    seen: HashSet<usize>,
    /// Bundles currently being expanded, outermost first
    stack: Vec<String>,
    /// Bundles already fully expanded
    expanded: HashSet<String>,
}

impl Walk {
    fn pick(&mut self, position: usize) {
        if self.seen.insert(position) {
            self.picked.push(position);
        }
    }
}

impl<'a> Resolver<'a> {
    /// Create a resolver over `registry` with bundle definitions `bundles`
    pub fn new(registry: &'a SkillRegistry, bundles: &'a BundleCatalog) -> Self {
        Self { registry, bundles }
    }

    /// Resolve a selector.
    ///
    /// Fails fast on the first unknown skill, unknown bundle or cycle; no
    /// partial output is returned.
    pub fn resolve(&self, selector: &Selector) -> Result<ResolvedBundle, ResolutionError> {
        let mut walk = Walk::default();
        self.collect(selector, &mut walk)?;

        let records = self.registry.records();
        let mut picked = walk.picked;
        picked.sort_by_key(|&i| records[i].order_key());

        let names: Vec<String> = picked.iter().map(|&i| records[i].name.clone()).collect();
        info!("Resolved {} to {} skills", selector, names.len());

        Ok(ResolvedBundle { label: None, names })
    }

    /// Resolve a named bundle, carrying its label into the result
    pub fn resolve_bundle(&self, id: &str) -> Result<ResolvedBundle, ResolutionError> {
        let def = self
            .bundles
            .get(id)
            .ok_or_else(|| ResolutionError::UnknownBundle {
                name: id.to_string(),
            })?;

        let mut resolved = self.resolve(&Selector::bundle(id))?;
        resolved.label = Some(def.label.clone());
        Ok(resolved)
    }

    fn collect(&self, selector: &Selector, walk: &mut Walk) -> Result<(), ResolutionError> {
        match selector {
            Selector::Skills(names) => {
                for name in names {
                    let record =
                        self.registry
                            .get(name)
                            .ok_or_else(|| ResolutionError::UnknownSkill {
                                name: name.clone(),
                            })?;
                    walk.pick(record.ordinal);
                }
            }
            Selector::Tier(tier) => self.collect_tiers(walk, |t| t == *tier),
            Selector::UpToTier(max) => self.collect_tiers(walk, |t| t.rank() <= max.rank()),
            Selector::Union(parts) => {
                for part in parts {
                    self.collect(part, walk)?;
                }
            }
            Selector::Bundle(id) => self.collect_bundle(id, walk)?,
        }

        Ok(())
    }

    fn collect_tiers<F>(&self, walk: &mut Walk, include: F)
    where
        F: Fn(Tier) -> bool,
    {
        for tier in Tier::ALL.into_iter().filter(|t| include(*t)) {
            for record in self.registry.by_tier(tier) {
                walk.pick(record.ordinal);
            }
        }
    }

    fn collect_bundle(&self, id: &str, walk: &mut Walk) -> Result<(), ResolutionError> {
        if let Some(start) = walk.stack.iter().position(|open| open == id) {
            let mut path = walk.stack[start..].to_vec();
            path.push(id.to_string());
            return Err(ResolutionError::Cycle { path });
        }

        if walk.expanded.contains(id) {
            debug!("Bundle '{}' already expanded", id);
            return Ok(());
        }

        let def = self
            .bundles
            .get(id)
            .ok_or_else(|| ResolutionError::UnknownBundle {
                name: id.to_string(),
            })?;

        walk.stack.push(id.to_string());
        self.collect(&def.select, walk)?;
        walk.stack.pop();
        walk.expanded.insert(id.to_string());

        Ok(())
    }
}
