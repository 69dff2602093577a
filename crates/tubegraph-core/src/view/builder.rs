//! Composable view builder.
//!
//! Calls may come in any order; [`ViewQuery::build`] always emits
//! filter → join → computed → sort → page.

use crate::types::Collection;
use crate::view::filter::Filter;
use crate::view::page::Page;
use crate::view::plan::{CountJoin, Lookup, QueryPlan, SortSpec, Stage};

/// Builder for a [`QueryPlan`]
#[derive(Debug, Clone)]
pub struct ViewQuery {
    source: Collection,
    filter: Filter,
    joins: Vec<Lookup>,
    computed: Vec<CountJoin>,
    sort: Option<SortSpec>,
    page: Option<Page>,
}

impl ViewQuery {
    /// Start a view over a collection
    pub fn from(source: Collection) -> Self {
        Self {
            source,
            filter: Filter::All,
            joins: Vec::new(),
            computed: Vec::new(),
            sort: None,
            page: None,
        }
    }

    /// Add a predicate; multiple calls are combined with AND
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::replace(&mut self.filter, Filter::All).and(filter);
        self
    }

    /// Attach related rows
    pub fn join(mut self, lookup: Lookup) -> Self {
        self.joins.push(lookup);
        self
    }

    /// Attach a computed count
    pub fn count(mut self, count: CountJoin) -> Self {
        self.computed.push(count);
        self
    }

    /// Override the default `createdAt` descending order
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Restrict to one page
    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Emit the plan in canonical stage order
    pub fn build(self) -> QueryPlan {
        let mut stages = Vec::with_capacity(self.joins.len() + self.computed.len() + 4);

        if self.filter != Filter::All {
            stages.push(Stage::Match(self.filter));
        }
        stages.extend(self.joins.into_iter().map(Stage::Lookup));
        stages.extend(self.computed.into_iter().map(Stage::Count));
        stages.push(Stage::Sort(self.sort.unwrap_or_default()));
        if let Some(page) = self.page {
            if page.skip() > 0 {
                stages.push(Stage::Skip(page.skip()));
            }
            stages.push(Stage::Limit(page.limit()));
        }

        QueryPlan { source: self.source, stages }
    }
}
