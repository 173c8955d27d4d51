//! SQL DDL emitter.
//!
//! Emits `CREATE TABLE` statements with inline column constraints and
//! `FOREIGN KEY` clauses on the many side. Tables are ordered so referenced
//! tables are created before the tables that reference them (topological
//! order over the FK graph); on a reference cycle the declaration order is
//! kept as-is.

use crate::id::EntityId;
use crate::model::*;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt::Write;

/// Emit the full DDL script for a document.
#[must_use]
pub fn emit_sql(doc: &SchemaDoc) -> String {
    let mut out = String::with_capacity(1024);

    for table_id in creation_order(doc) {
        let Some(table) = doc.table(table_id) else {
            continue;
        };
        emit_create_table(&mut out, doc, table);
        out.push('\n');
    }

    out
}

/// FK-holder side of a relationship: the "many" end, or the source for
/// one-to-one.
fn fk_holder(rel: &Relationship) -> (EntityId, EntityId) {
    match rel.cardinality {
        // source one → many target: the target holds the FK
        Cardinality::OneToMany => (rel.target_table, rel.source_table),
        Cardinality::ManyToOne | Cardinality::OneToOne => (rel.source_table, rel.target_table),
    }
}

/// Topological creation order: referenced tables first. Falls back to
/// declaration order when the FK graph has a cycle.
fn creation_order(doc: &SchemaDoc) -> Vec<EntityId> {
    let mut graph: DiGraph<EntityId, ()> = DiGraph::new();
    let mut index: HashMap<EntityId, NodeIndex> = HashMap::new();

    for table in &doc.tables {
        index.insert(table.id, graph.add_node(table.id));
    }
    for rel in &doc.relationships {
        let (holder, referenced) = fk_holder(rel);
        if let (Some(&from), Some(&to)) = (index.get(&referenced), index.get(&holder))
            && from != to
        {
            // edge: referenced table → FK holder, so toposort puts the
            // referenced table first
            graph.add_edge(from, to, ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|idx| graph[idx]).collect(),
        Err(_) => doc.tables.iter().map(|t| t.id).collect(),
    }
}

fn emit_create_table(out: &mut String, doc: &SchemaDoc, table: &Table) {
    if let Some(comment) = &table.comment {
        writeln!(out, "-- {comment}").unwrap();
    }
    writeln!(out, "CREATE TABLE {} (", quote(&table.name)).unwrap();

    let mut lines: Vec<String> = Vec::new();
    for column in &table.columns {
        let mut line = format!("  {} {}", quote(&column.name), column.ty);
        if column.is_primary_key {
            line.push_str(" PRIMARY KEY");
        } else if column.is_not_null {
            line.push_str(" NOT NULL");
        }
        if column.is_unique && !column.is_primary_key {
            line.push_str(" UNIQUE");
        }
        if column.is_auto_increment {
            line.push_str(" AUTO_INCREMENT");
        }
        lines.push(line);
    }

    for rel in &doc.relationships {
        let (holder, _) = fk_holder(rel);
        if holder != table.id {
            continue;
        }
        if let Some(clause) = fk_clause(doc, rel) {
            lines.push(clause);
        }
    }

    out.push_str(&lines.join(",\n"));
    out.push_str("\n);\n");
}

fn fk_clause(doc: &SchemaDoc, rel: &Relationship) -> Option<String> {
    let (holder_col, ref_table_id, ref_col_id) = match rel.cardinality {
        Cardinality::OneToMany => (rel.target_column, rel.source_table, rel.source_column),
        Cardinality::ManyToOne | Cardinality::OneToOne => {
            (rel.source_column, rel.target_table, rel.target_column)
        }
    };
    let (holder_table_id, _) = fk_holder(rel);
    let holder = doc.table(holder_table_id)?;
    let col = holder.column(holder_col)?;
    let referenced = doc.table(ref_table_id)?;
    let referenced_col = referenced.column(ref_col_id)?;

    let mut clause = format!(
        "  FOREIGN KEY ({}) REFERENCES {}({})",
        quote(&col.name),
        quote(&referenced.name),
        quote(&referenced_col.name)
    );
    if rel.on_update != RefAction::NoAction {
        write!(clause, " ON UPDATE {}", rel.on_update.as_sql()).unwrap();
    }
    if rel.on_delete != RefAction::NoAction {
        write!(clause, " ON DELETE {}", rel.on_delete.as_sql()).unwrap();
    }
    Some(clause)
}

fn quote(name: &str) -> String {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;

    #[test]
    fn referenced_tables_are_created_first() {
        // posts is declared before users but references it
        let doc = parse_schema(
            "Table posts { id int [pk]\n user_id int }\nTable users { id int [pk] }\nRef: posts.user_id > users.id\n",
        )
        .unwrap();
        let sql = emit_sql(&doc);
        let users_at = sql.find("CREATE TABLE users").unwrap();
        let posts_at = sql.find("CREATE TABLE posts").unwrap();
        assert!(users_at < posts_at, "users must be created before posts");
        assert!(sql.contains("FOREIGN KEY (user_id) REFERENCES users(id)"));
    }

    #[test]
    fn cycle_falls_back_to_declaration_order() {
        let doc = parse_schema(
            "Table a { id int [pk]\n b_id int }\nTable b { id int [pk]\n a_id int }\nRef: a.b_id > b.id\nRef: b.a_id > a.id\n",
        )
        .unwrap();
        let sql = emit_sql(&doc);
        let a_at = sql.find("CREATE TABLE a").unwrap();
        let b_at = sql.find("CREATE TABLE b").unwrap();
        assert!(a_at < b_at);
    }

    #[test]
    fn column_constraints_and_actions() {
        let doc = parse_schema(
            "Table users { id int [pk, increment]\n email varchar(255) [not null, unique] }\nTable posts { id int [pk]\n user_id int }\nRef: posts.user_id > users.id [delete: cascade]\n",
        )
        .unwrap();
        let sql = emit_sql(&doc);
        assert!(sql.contains("id INT PRIMARY KEY AUTO_INCREMENT"));
        assert!(sql.contains("email VARCHAR(255) NOT NULL UNIQUE"));
        assert!(sql.contains("ON DELETE CASCADE"));
        assert!(!sql.contains("ON UPDATE"));
    }
}
