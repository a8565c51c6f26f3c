//! Statement constraint builder: turns a scoped access decision into the
//! row-level WHERE clause of the query it guards.
//!
//! `Full` leaves the statement untouched. `Denied` injects an always-false
//! predicate so the query still executes and returns the empty set, keeping
//! pagination and counting consistent. `Scoped` asks every configured module
//! for its predicates and applies the accumulated OR set as a single WHERE
//! clause; an accumulator nothing contributed to stays FALSE.
//!
//! Constraint application happens inside the same transaction as the data
//! fetch, so the filtering predicate and the read are consistent.

use sqlx::{Postgres, QueryBuilder};
use std::sync::Arc;

use crate::access::context::RequestContext;
use crate::access::decision::AccessDecision;
use crate::access::module::PermissionModule;
use crate::error::Result;
use crate::registry::entity::EntityDescriptor;

// ═══════════════════════════════════════════════════════════════════════════════
// Bind Values
// ═══════════════════════════════════════════════════════════════════════════════

/// A value bound into a predicate. Kept as an enum so predicates stay plain
/// data until they are pushed into a concrete query.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
    Int(i64),
    Bool(bool),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Predicate
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Sql(String),
    Bind(BindValue),
}

/// One boolean SQL fragment with its bound values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    parts: Vec<Part>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw SQL.
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.parts.push(Part::Sql(sql.into()));
        self
    }

    /// Append a bound value.
    pub fn bind(mut self, value: BindValue) -> Self {
        self.parts.push(Part::Bind(value));
        self
    }

    /// A predicate that matches every row.
    pub fn always_true() -> Self {
        Self::new().sql("TRUE")
    }

    /// `column = $n` over a text value.
    pub fn eq_text(column: &str, value: impl Into<String>) -> Self {
        Self::new()
            .sql(format!("{} = ", column))
            .bind(BindValue::Text(value.into()))
    }

    /// `column = ANY($n)` over a text array.
    pub fn any_text(column: &str, values: Vec<String>) -> Self {
        Self::new()
            .sql(format!("{} = ANY(", column))
            .bind(BindValue::TextArray(values))
            .sql(")")
    }

    /// Push this predicate into a query builder.
    pub fn push_to<'a>(&self, builder: &mut QueryBuilder<'a, Postgres>) {
        for part in &self.parts {
            match part {
                Part::Sql(sql) => {
                    builder.push(sql);
                }
                Part::Bind(BindValue::Text(v)) => {
                    builder.push_bind(v.clone());
                }
                Part::Bind(BindValue::TextArray(v)) => {
                    builder.push_bind(v.clone());
                }
                Part::Bind(BindValue::Int(v)) => {
                    builder.push_bind(*v);
                }
                Part::Bind(BindValue::Bool(v)) => {
                    builder.push_bind(*v);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Statement Filter
// ═══════════════════════════════════════════════════════════════════════════════

/// What one entity capability hook contributes to a guarded statement:
/// join clauses plus predicates to OR into the access condition.
#[derive(Debug, Clone, Default)]
pub struct StatementFilter {
    pub joins: Vec<String>,
    pub predicates: Vec<Predicate>,
}

impl StatementFilter {
    /// A filter contributing nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A filter with a single predicate and no joins.
    pub fn predicate(predicate: Predicate) -> Self {
        Self {
            joins: Vec::new(),
            predicates: vec![predicate],
        }
    }

    /// Add a join clause.
    pub fn join(mut self, join: impl Into<String>) -> Self {
        self.joins.push(join.into());
        self
    }

    /// Add a predicate.
    pub fn and_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.predicates.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constraint Set
// ═══════════════════════════════════════════════════════════════════════════════

/// The OR accumulator threaded through the module chain while constraining
/// one statement.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    joins: Vec<String>,
    or_predicates: Vec<Predicate>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an entity filter into the accumulator.
    pub fn extend(&mut self, filter: StatementFilter) {
        self.joins.extend(filter.joins);
        self.or_predicates.extend(filter.predicates);
    }

    /// OR in an always-true predicate (used by role-based access, which
    /// grants all rows once the webservice gate has passed).
    pub fn push_always_true(&mut self) {
        self.or_predicates.push(Predicate::always_true());
    }

    /// Whether any module contributed anything.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.or_predicates.is_empty()
    }

    /// Apply joins and the accumulated OR set as one WHERE clause. Starts
    /// from FALSE so an empty accumulator yields an empty result set rather
    /// than an unfiltered one.
    pub fn apply_to<'a>(&self, builder: &mut QueryBuilder<'a, Postgres>) {
        for join in &self.joins {
            builder.push(" ");
            builder.push(join);
        }
        builder.push(" WHERE (FALSE");
        for predicate in &self.or_predicates {
            builder.push(" OR (");
            predicate.push_to(builder);
            builder.push(")");
        }
        builder.push(")");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Statement Guard
// ═══════════════════════════════════════════════════════════════════════════════

/// Add access conditions to secure a statement, according to the decision
/// the chain wrote into the request context.
///
/// Module failures propagate here (unlike in the webservice check): an error
/// while assembling the WHERE clause aborts the query instead of widening
/// it. Misconfiguration errors raised by entity descriptors (tenant column
/// without filter override) surface through this path.
pub async fn apply_access_constraints<'a>(
    modules: &[Arc<dyn PermissionModule>],
    builder: &mut QueryBuilder<'a, Postgres>,
    context: &RequestContext,
    entity: Option<&EntityDescriptor>,
) -> Result<()> {
    match &context.access {
        AccessDecision::Full => Ok(()),
        AccessDecision::Denied => {
            builder.push(" WHERE FALSE");
            Ok(())
        }
        AccessDecision::Scoped(_) => {
            let mut constraints = ConstraintSet::new();
            for module in modules {
                module
                    .constrain_statement(&mut constraints, context, entity)
                    .await?;
            }
            constraints.apply_to(builder);
            Ok(())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
