//! Schema validation: structural findings over `(tables, relationships)`.
//!
//! Pure derivation, no mutation. Rules are independent and cumulative — a
//! single table or column may generate several findings. Results feed both
//! the issues panel and the text-editor diagnostics.

use crate::id::EntityId;
use crate::model::*;
use std::collections::HashMap;

// ─── Finding types ───────────────────────────────────────────────────────

/// Severity of a finding or a text diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single structural finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Stable id (rule + subject), so UI selection survives recomputes.
    pub id: String,
    pub table_id: Option<EntityId>,
    pub column_id: Option<EntityId>,
    pub severity: Severity,
    pub message: String,
    /// Short rule identifier (e.g. "duplicate-table-name").
    pub rule: &'static str,
}

impl Finding {
    fn table(rule: &'static str, table: &Table, severity: Severity, message: String) -> Self {
        Self {
            id: format!("{rule}:{}", table.id),
            table_id: Some(table.id),
            column_id: None,
            severity,
            message,
            rule,
        }
    }

    fn column(
        rule: &'static str,
        table: &Table,
        column: &Column,
        severity: Severity,
        message: String,
    ) -> Self {
        Self {
            id: format!("{rule}:{}:{}", table.id, column.id),
            table_id: Some(table.id),
            column_id: Some(column.id),
            severity,
            message,
            rule,
        }
    }
}

/// Reserved identifiers that shadow SQL keywords when used as table or
/// column names.
const RESERVED_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "table", "index", "where", "from", "join", "group",
    "order", "having", "union", "create", "drop", "alter", "grant", "column", "constraint",
    "primary", "foreign", "references", "check", "default", "user",
];

// ─── Public API ──────────────────────────────────────────────────────────

/// Run all validation rules and return the ordered finding list.
#[must_use]
pub fn validate_schema(tables: &[Table], relationships: &[Relationship]) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_duplicate_table_names(tables, &mut findings);
    check_empty_tables(tables, &mut findings);
    check_column_types(tables, &mut findings);
    check_duplicate_column_names(tables, &mut findings);
    check_missing_primary_keys(tables, &mut findings);
    check_relationship_type_mismatch(tables, relationships, &mut findings);
    check_dangling_relationships(tables, relationships, &mut findings);
    check_reserved_keywords(tables, &mut findings);
    check_isolated_tables(tables, relationships, &mut findings);
    findings
}

// ─── Rules ───────────────────────────────────────────────────────────────

/// Two or more tables share a case-insensitive name — one finding per
/// offending table.
fn check_duplicate_table_names(tables: &[Table], findings: &mut Vec<Finding>) {
    let mut by_name: HashMap<String, u32> = HashMap::new();
    for table in tables {
        *by_name.entry(table.name.to_ascii_lowercase()).or_default() += 1;
    }
    for table in tables {
        if by_name[&table.name.to_ascii_lowercase()] > 1 {
            findings.push(Finding::table(
                "duplicate-table-name",
                table,
                Severity::Error,
                format!("Table name `{}` is used more than once.", table.name),
            ));
        }
    }
}

fn check_empty_tables(tables: &[Table], findings: &mut Vec<Finding>) {
    for table in tables {
        if table.columns.is_empty() {
            findings.push(Finding::table(
                "empty-table",
                table,
                Severity::Warning,
                format!("Table `{}` has no columns.", table.name),
            ));
        }
    }
}

fn check_column_types(tables: &[Table], findings: &mut Vec<Finding>) {
    for table in tables {
        for column in &table.columns {
            if column.ty.trim().is_empty() {
                findings.push(Finding::column(
                    "missing-column-type",
                    table,
                    column,
                    Severity::Error,
                    format!("Column `{}.{}` has no type.", table.name, column.name),
                ));
            }
        }
    }
}

fn check_duplicate_column_names(tables: &[Table], findings: &mut Vec<Finding>) {
    for table in tables {
        let mut by_name: HashMap<&str, u32> = HashMap::new();
        for column in &table.columns {
            *by_name.entry(column.name.as_str()).or_default() += 1;
        }
        for column in &table.columns {
            if by_name[column.name.as_str()] > 1 {
                findings.push(Finding::column(
                    "duplicate-column-name",
                    table,
                    column,
                    Severity::Error,
                    format!(
                        "Column name `{}` is used more than once in table `{}`.",
                        column.name, table.name
                    ),
                ));
            }
        }
    }
}

/// Missing primary key — only fires for tables that have at least one column
/// (an empty table already gets the `empty-table` warning).
fn check_missing_primary_keys(tables: &[Table], findings: &mut Vec<Finding>) {
    for table in tables {
        if !table.columns.is_empty() && !table.columns.iter().any(|c| c.is_primary_key) {
            findings.push(Finding::table(
                "missing-primary-key",
                table,
                Severity::Warning,
                format!("Table `{}` has no primary key.", table.name),
            ));
        }
    }
}

fn check_relationship_type_mismatch(
    tables: &[Table],
    relationships: &[Relationship],
    findings: &mut Vec<Finding>,
) {
    for rel in relationships {
        let source = resolve(tables, rel.source_table, rel.source_column);
        let target = resolve(tables, rel.target_table, rel.target_column);
        if let (Some((src_table, src_col)), Some((_, dst_col))) = (source, target)
            && src_col.ty != dst_col.ty
        {
            findings.push(Finding {
                id: format!("relationship-type-mismatch:{}", rel.id),
                table_id: Some(src_table.id),
                column_id: Some(src_col.id),
                severity: Severity::Warning,
                message: format!(
                    "Relationship `{}` joins columns of different types ({} vs {}).",
                    rel.name, src_col.ty, dst_col.ty
                ),
                rule: "relationship-type-mismatch",
            });
        }
    }
}

/// A relationship whose endpoints no longer resolve. The model accepts these
/// at creation time; they surface here as data-quality errors.
fn check_dangling_relationships(
    tables: &[Table],
    relationships: &[Relationship],
    findings: &mut Vec<Finding>,
) {
    for rel in relationships {
        let source_ok = resolve(tables, rel.source_table, rel.source_column).is_some();
        let target_ok = resolve(tables, rel.target_table, rel.target_column).is_some();
        if !source_ok || !target_ok {
            findings.push(Finding {
                id: format!("dangling-relationship:{}", rel.id),
                table_id: None,
                column_id: None,
                severity: Severity::Error,
                message: format!(
                    "Relationship `{}` references a table or column that no longer exists.",
                    rel.name
                ),
                rule: "dangling-relationship",
            });
        }
    }
}

fn check_reserved_keywords(tables: &[Table], findings: &mut Vec<Finding>) {
    let reserved = |name: &str| {
        let lower = name.to_ascii_lowercase();
        RESERVED_KEYWORDS.contains(&lower.as_str())
    };
    for table in tables {
        if reserved(&table.name) {
            findings.push(Finding::table(
                "reserved-keyword",
                table,
                Severity::Warning,
                format!("Table name `{}` is a reserved SQL keyword.", table.name),
            ));
        }
        for column in &table.columns {
            if reserved(&column.name) {
                findings.push(Finding::column(
                    "reserved-keyword",
                    table,
                    column,
                    Severity::Warning,
                    format!(
                        "Column name `{}.{}` is a reserved SQL keyword.",
                        table.name, column.name
                    ),
                ));
            }
        }
    }
}

/// A table participating in zero relationships, when the diagram has at
/// least two tables overall.
fn check_isolated_tables(
    tables: &[Table],
    relationships: &[Relationship],
    findings: &mut Vec<Finding>,
) {
    if tables.len() < 2 {
        return;
    }
    for table in tables {
        let connected = relationships.iter().any(|r| r.touches_table(table.id));
        if !connected {
            findings.push(Finding::table(
                "isolated-table",
                table,
                Severity::Info,
                format!("Table `{}` has no relationships.", table.name),
            ));
        }
    }
}

fn resolve(
    tables: &[Table],
    table_id: EntityId,
    column_id: EntityId,
) -> Option<(&Table, &Column)> {
    let table = tables.iter().find(|t| t.id == table_id)?;
    let column = table.column(column_id)?;
    Some((table, column))
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn count(findings: &[Finding], rule: &str) -> usize {
        findings.iter().filter(|f| f.rule == rule).count()
    }

    #[test]
    fn duplicate_names_fire_once_per_table() {
        let tables = vec![
            Table::new("Users", 0.0, 0.0),
            Table::new("users", 0.0, 0.0),
        ];
        let findings = validate_schema(&tables, &[]);
        assert_eq!(count(&findings, "duplicate-table-name"), 2);
        assert!(
            findings
                .iter()
                .filter(|f| f.rule == "duplicate-table-name")
                .all(|f| f.severity == Severity::Error)
        );
    }

    #[test]
    fn empty_table_warns_without_missing_pk() {
        let tables = vec![Table::new("empty", 0.0, 0.0)];
        let findings = validate_schema(&tables, &[]);
        assert_eq!(count(&findings, "empty-table"), 1);
        // missing-primary-key requires at least one column
        assert_eq!(count(&findings, "missing-primary-key"), 0);
    }

    #[test]
    fn missing_pk_and_type_rules() {
        let mut t = Table::new("logs", 0.0, 0.0);
        t.columns.push(Column::new("message", ""));
        let findings = validate_schema(&[t], &[]);
        assert_eq!(count(&findings, "missing-primary-key"), 1);
        assert_eq!(count(&findings, "missing-column-type"), 1);
    }

    #[test]
    fn duplicate_columns_fire_per_column() {
        let mut t = Table::new("t", 0.0, 0.0);
        t.columns.push(Column::new("x", "INT"));
        t.columns.push(Column::new("x", "INT"));
        let findings = validate_schema(&[t], &[]);
        assert_eq!(count(&findings, "duplicate-column-name"), 2);
    }

    #[test]
    fn type_mismatch_warns() {
        let mut users = Table::new("users", 0.0, 0.0);
        let mut id = Column::new("id", "INT");
        id.is_primary_key = true;
        users.columns.push(id);

        let mut posts = Table::new("posts", 0.0, 0.0);
        posts.columns.push(Column::new("user_id", "VARCHAR"));

        let rel = Relationship::from_draft(RelationshipDraft {
            source_table: posts.id,
            source_column: posts.columns[0].id,
            target_table: users.id,
            target_column: users.columns[0].id,
            ..Default::default()
        });
        let findings = validate_schema(&[users, posts], &[rel]);
        assert_eq!(count(&findings, "relationship-type-mismatch"), 1);
    }

    #[test]
    fn dangling_relationship_is_an_error() {
        let rel = Relationship::from_draft(RelationshipDraft::default());
        let findings = validate_schema(&[], &[rel]);
        assert_eq!(count(&findings, "dangling-relationship"), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn reserved_keywords_warn_case_insensitively() {
        let mut t = Table::new("Order", 0.0, 0.0);
        t.columns.push(Column::new("SELECT", "INT"));
        let findings = validate_schema(&[t], &[]);
        assert_eq!(count(&findings, "reserved-keyword"), 2);
    }

    #[test]
    fn isolated_tables_need_at_least_two() {
        let one = vec![Table::new("solo", 0.0, 0.0)];
        assert_eq!(count(&validate_schema(&one, &[]), "isolated-table"), 0);

        let two = vec![Table::new("a", 0.0, 0.0), Table::new("b", 0.0, 0.0)];
        assert_eq!(count(&validate_schema(&two, &[]), "isolated-table"), 2);
    }

    #[test]
    fn rules_are_cumulative() {
        // One table can collect findings from several rules at once.
        let mut t = Table::new("user", 0.0, 0.0);
        t.columns.push(Column::new("x", ""));
        t.columns.push(Column::new("x", ""));
        let findings = validate_schema(&[t], &[]);
        assert!(count(&findings, "reserved-keyword") == 1);
        assert!(count(&findings, "missing-primary-key") == 1);
        assert!(count(&findings, "missing-column-type") == 2);
        assert!(count(&findings, "duplicate-column-name") == 2);
    }
}
