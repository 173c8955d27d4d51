//! Emitter: [`SchemaDoc`] → canonical DBML-like text.
//!
//! Produces minimal output that round-trips through the parser. Layout data
//! (positions, colors) is deliberately absent from the notation — the sync
//! engine's identity merge carries it across re-parses.

use crate::model::*;
use std::fmt::Write;

/// Emit the schema text for a document.
#[must_use]
pub fn emit_schema(doc: &SchemaDoc) -> String {
    let mut out = String::with_capacity(1024);

    for table in &doc.tables {
        emit_table(&mut out, table);
        out.push('\n');
    }

    for rel in &doc.relationships {
        emit_ref(&mut out, doc, rel);
    }

    out
}

fn emit_table(out: &mut String, table: &Table) {
    writeln!(out, "Table {} {{", ident(&table.name)).unwrap();

    for column in &table.columns {
        out.push_str("  ");
        out.push_str(&ident(&column.name));
        out.push(' ');
        out.push_str(&column.ty);
        emit_column_settings(out, column);
        out.push('\n');
    }

    if let Some(comment) = &table.comment {
        writeln!(out, "\n  Note: '{comment}'").unwrap();
    }

    out.push_str("}\n");
}

fn emit_column_settings(out: &mut String, column: &Column) {
    let mut settings: Vec<&str> = Vec::new();
    if column.is_primary_key {
        settings.push("pk");
    }
    // pk implies not null; don't repeat it.
    if column.is_not_null && !column.is_primary_key {
        settings.push("not null");
    }
    if column.is_unique {
        settings.push("unique");
    }
    if column.is_auto_increment {
        settings.push("increment");
    }
    if !settings.is_empty() {
        write!(out, " [{}]", settings.join(", ")).unwrap();
    }
}

fn emit_ref(out: &mut String, doc: &SchemaDoc, rel: &Relationship) {
    // A relationship with dangling endpoints has no textual form; the
    // validation engine reports it instead.
    let Some(endpoints) = resolve_endpoints(doc, rel) else {
        log::warn!("skipping relationship {} with dangling endpoints", rel.id);
        return;
    };
    let (src_table, src_col, dst_table, dst_col) = endpoints;

    let symbol = match rel.cardinality {
        Cardinality::OneToOne => '-',
        Cardinality::OneToMany => '<',
        Cardinality::ManyToOne => '>',
    };

    write!(
        out,
        "Ref {}: {}.{} {} {}.{}",
        ident(&rel.name),
        ident(src_table),
        ident(src_col),
        symbol,
        ident(dst_table),
        ident(dst_col),
    )
    .unwrap();

    if rel.on_update != RefAction::NoAction || rel.on_delete != RefAction::NoAction {
        let mut actions: Vec<String> = Vec::new();
        if rel.on_update != RefAction::NoAction {
            actions.push(format!("update: {}", action_keyword(rel.on_update)));
        }
        if rel.on_delete != RefAction::NoAction {
            actions.push(format!("delete: {}", action_keyword(rel.on_delete)));
        }
        write!(out, " [{}]", actions.join(", ")).unwrap();
    }

    out.push('\n');
}

fn resolve_endpoints<'a>(
    doc: &'a SchemaDoc,
    rel: &Relationship,
) -> Option<(&'a str, &'a str, &'a str, &'a str)> {
    let src_table = doc.table(rel.source_table)?;
    let src_col = src_table.column(rel.source_column)?;
    let dst_table = doc.table(rel.target_table)?;
    let dst_col = dst_table.column(rel.target_column)?;
    Some((&src_table.name, &src_col.name, &dst_table.name, &dst_col.name))
}

fn action_keyword(action: RefAction) -> &'static str {
    match action {
        RefAction::NoAction => "no action",
        RefAction::Restrict => "restrict",
        RefAction::Cascade => "cascade",
        RefAction::SetNull => "set null",
        RefAction::SetDefault => "set default",
    }
}

/// Quote a name when it is not a plain identifier.
fn ident(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c: char| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}
