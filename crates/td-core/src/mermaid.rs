//! Mermaid `erDiagram` emitter.
//!
//! This notation is generated from the model only. There is deliberately no
//! parser in this module — the sync engine rejects any attempt to apply
//! edited Mermaid text with a distinguishable error.

use crate::model::*;
use std::fmt::Write;

/// Emit the document as a Mermaid ER diagram.
#[must_use]
pub fn emit_mermaid(doc: &SchemaDoc) -> String {
    let mut out = String::from("erDiagram\n");

    for table in &doc.tables {
        writeln!(out, "    {} {{", mermaid_name(&table.name)).unwrap();
        for column in &table.columns {
            write!(out, "        {} {}", mermaid_type(&column.ty), column.name).unwrap();
            if column.is_primary_key {
                out.push_str(" PK");
            } else if column.is_unique {
                out.push_str(" UK");
            }
            out.push('\n');
        }
        out.push_str("    }\n");
    }

    for rel in &doc.relationships {
        let (Some(src), Some(dst)) = (doc.table(rel.source_table), doc.table(rel.target_table))
        else {
            continue;
        };
        let glyph = match rel.cardinality {
            Cardinality::OneToOne => "||--||",
            Cardinality::OneToMany => "||--o{",
            Cardinality::ManyToOne => "}o--||",
        };
        writeln!(
            out,
            "    {} {} {} : \"{}\"",
            mermaid_name(&src.name),
            glyph,
            mermaid_name(&dst.name),
            rel.name
        )
        .unwrap();
    }

    out
}

/// Mermaid entity names cannot contain spaces.
fn mermaid_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Mermaid attribute types cannot contain parentheses: `VARCHAR(255)` →
/// `VARCHAR255`.
fn mermaid_type(ty: &str) -> String {
    ty.chars().filter(|c| *c != '(' && *c != ')').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;

    #[test]
    fn emits_entities_and_edges() {
        let doc = parse_schema(
            "Table users { id int [pk] }\nTable posts { id int [pk]\n user_id int }\nRef fk: posts.user_id > users.id\n",
        )
        .unwrap();
        let text = emit_mermaid(&doc);
        assert!(text.starts_with("erDiagram"));
        assert!(text.contains("users {"));
        assert!(text.contains("INT id PK"));
        assert!(text.contains("posts }o--|| users : \"fk\""));
    }

    #[test]
    fn sanitizes_names_and_types() {
        let doc = parse_schema("Table \"order items\" { sku varchar(64) [unique] }").unwrap();
        let text = emit_mermaid(&doc);
        assert!(text.contains("order_items {"));
        assert!(text.contains("VARCHAR64 sku UK"));
    }
}
