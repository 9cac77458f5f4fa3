//! Relation resolver: include requests → joined derived relations.

use tally_events::{DbEvent, EventSink};
use tracing::debug;

use crate::{
    error::{DbError, Result},
    query::{
        args::{FindArgs, Include, Includes},
        plan::{Join, QueryPlan},
    },
    schema::TableDescriptor,
};

/// Expands includes recursively, tracking the chain of tables currently being expanded.
pub(crate) struct IncludeResolver<'a> {
    events: &'a dyn EventSink,
    chain: Vec<&'static str>,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(root: &'static TableDescriptor, events: &'a dyn EventSink) -> Self {
        Self {
            events,
            chain: vec![root.name],
        }
    }

    /// Compiles one join per requested relation of `table`.
    ///
    /// Unknown relations are reported to the event sink and skipped. A relation whose
    /// target is already on the chain is an [`DbError::IncludeCycle`].
    pub fn resolve(
        &mut self,
        table: &'static TableDescriptor,
        includes: Option<&Includes>,
    ) -> Result<Vec<Join>> {
        let mut joins = Vec::new();
        let Some(includes) = includes else {
            return Ok(joins);
        };

        let defaults = FindArgs::default();
        for (name, include) in includes.iter() {
            let nested = match include {
                Include::Flag(false) => continue,
                Include::Flag(true) => &defaults,
                Include::Nested(args) => args.as_ref(),
            };

            let Some(relation) = table.relation(name) else {
                debug!(table = table.name, relation = %name, "skipping unknown relation");
                self.events.emit(DbEvent::UnknownRelation {
                    table: table.name.to_string(),
                    relation: name.clone(),
                });
                continue;
            };

            let target = relation.target();
            if self.chain.contains(&target.name) {
                return Err(DbError::IncludeCycle {
                    path: format!("{} -> {}", self.chain.join(" -> "), target.name),
                });
            }

            self.chain.push(target.name);
            let plan = QueryPlan::build(target, nested, self);
            self.chain.pop();

            let mut plan = plan?;
            plan.expose(relation.referenced_field)?;
            joins.push(Join {
                relation,
                plan,
            });
        }

        Ok(joins)
    }
}
