//! Parser for the TD schema text (DBML-like notation) → [`SchemaDoc`].
//!
//! Built on `winnow` 0.7 in the streaming `&mut &str` style. Handles `Table`
//! blocks with column settings, `Ref` statements, table `Note:` comments, and
//! `//` line comments.
//!
//! Errors never abort the whole parse: a failed statement produces one
//! byte-offset [`Diagnostic`] and parsing resumes at the next statement, so a
//! single pass can report several problems at once. The caller gets either a
//! complete document or the full diagnostic list — never a half-applied mix.

use crate::id::EntityId;
use crate::model::*;
use crate::validate::Severity;
use winnow::combinator::preceded;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// A text-range diagnostic surfaced to the editor gutter.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Byte offset of the range start.
    pub start: usize,
    /// Byte offset one past the range end. Always > `start`.
    pub end: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// An error diagnostic, clamped to at least one character wide.
    pub fn error(start: usize, end: usize, message: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start + 1),
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Parse a schema document. Returns the parsed model, or every diagnostic
/// found in one pass. Positions and colors are not part of the notation —
/// entities come back at the origin and the sync engine's identity merge
/// restores or assigns them.
pub fn parse_schema(input: &str) -> Result<SchemaDoc, Vec<Diagnostic>> {
    let mut doc = SchemaDoc::new();
    let mut diags: Vec<Diagnostic> = Vec::new();
    let mut refs: Vec<(usize, usize, RefStmt)> = Vec::new();
    let mut rest = input;

    skip_ws_and_comments(&mut rest);

    while !rest.is_empty() {
        let stmt_start = offset_in(input, rest);

        if starts_with_keyword(rest, "Table") {
            match parse_table_block.parse_next(&mut rest) {
                Ok(table) => {
                    doc.add_table(table);
                }
                Err(e) => {
                    let err_at = offset_in(input, rest);
                    recover_statement(&mut rest);
                    diags.push(Diagnostic::error(
                        stmt_start,
                        err_at,
                        format!("Table parse error: {e}"),
                    ));
                }
            }
        } else if starts_with_keyword(rest, "Ref") {
            match parse_ref_stmt.parse_next(&mut rest) {
                Ok(stmt) => {
                    let stmt_end = offset_in(input, rest);
                    refs.push((stmt_start, stmt_end, stmt));
                }
                Err(e) => {
                    let err_at = offset_in(input, rest);
                    recover_statement(&mut rest);
                    diags.push(Diagnostic::error(
                        stmt_start,
                        err_at,
                        format!("Ref parse error: {e}"),
                    ));
                }
            }
        } else {
            let line_end = rest.find('\n').map_or(rest.len(), |p| p);
            diags.push(Diagnostic::error(
                stmt_start,
                stmt_start + line_end,
                "expected a `Table` or `Ref` statement",
            ));
            rest = &rest[line_end..];
        }

        skip_ws_and_comments(&mut rest);
    }

    // Resolve Ref endpoints by name against the parsed tables. Unknown names
    // are semantic errors anchored to the Ref statement's range.
    for (start, end, stmt) in refs {
        match resolve_ref(&doc, &stmt) {
            Ok(draft) => {
                doc.add_relationship(draft);
            }
            Err(message) => diags.push(Diagnostic::error(start, end, message)),
        }
    }

    if diags.is_empty() { Ok(doc) } else { Err(diags) }
}

/// Byte offset of `rest` within `base`.
fn offset_in(base: &str, rest: &str) -> usize {
    base.len() - rest.len()
}

/// Case-insensitive keyword at the start of input, followed by whitespace,
/// `:`, or a quote (so `Tables` never matches `Table`).
fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    let Some(head) = s.get(..keyword.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(keyword) {
        return false;
    }
    s[keyword.len()..]
        .chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || c == ':' || c == '"')
}

/// Skip to the start of the next top-level statement after a parse failure.
fn recover_statement(input: &mut &str) {
    loop {
        match input.find('\n') {
            None => {
                *input = "";
                return;
            }
            Some(pos) => {
                *input = &input[pos + 1..];
                let peek = input.trim_start();
                if peek.is_empty()
                    || starts_with_keyword(peek, "Table")
                    || starts_with_keyword(peek, "Ref")
                {
                    return;
                }
            }
        }
    }
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn skip_ws_and_comments(input: &mut &str) {
    loop {
        let before = *input;
        *input = input.trim_start();
        if input.starts_with("//") {
            if let Some(pos) = input.find('\n') {
                *input = &input[pos + 1..];
            } else {
                *input = "";
            }
            continue;
        }
        if *input == before {
            break;
        }
    }
}

/// Consume optional inline whitespace (spaces/tabs, not newlines).
fn skip_space(input: &mut &str) {
    use winnow::ascii::space0;
    let _: Result<&str, winnow::error::ErrMode<ContextError>> = space0.parse_next(input);
}

fn parse_identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

/// An identifier or a double-quoted name (for names with spaces).
fn parse_name(input: &mut &str) -> ModalResult<String> {
    if input.starts_with('"') {
        parse_quoted.map(str::to_string).parse_next(input)
    } else {
        parse_identifier.map(str::to_string).parse_next(input)
    }
}

/// A string in single or double quotes.
fn parse_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let mut quote = if input.starts_with('\'') { '\'' } else { '"' };
    let _ = quote.parse_next(input)?;
    let body = take_till(0.., quote).parse_next(input)?;
    let _ = quote.parse_next(input)?;
    Ok(body)
}

/// A column type token: identifier plus optional parenthesized arguments,
/// normalized to upper case (`varchar(255)` → `VARCHAR(255)`).
fn parse_type(input: &mut &str) -> ModalResult<String> {
    let base = parse_identifier.parse_next(input)?;
    let mut ty = base.to_ascii_uppercase();
    if input.starts_with('(') {
        let _ = '('.parse_next(input)?;
        let args: &str = take_till(0.., ')').parse_next(input)?;
        let _ = ')'.parse_next(input)?;
        ty.push('(');
        ty.push_str(args.trim());
        ty.push(')');
    }
    Ok(ty)
}

// ─── Table blocks ───────────────────────────────────────────────────────

fn parse_table_block(input: &mut &str) -> ModalResult<Table> {
    let _ = take_while(1.., |c: char| c.is_alphabetic()).parse_next(input)?; // "Table"
    skip_space(input);
    let name = parse_name.parse_next(input)?;
    skip_space(input);
    let _ = '{'.parse_next(input)?;

    let mut table = Table::new(name, 0.0, 0.0);
    skip_ws_and_comments(input);

    while !input.starts_with('}') {
        if input.is_empty() {
            // Unclosed block — let the char parser below report it.
            break;
        }
        if starts_with_keyword(input, "Note") {
            let _ = take_while(1.., |c: char| c.is_alphabetic()).parse_next(input)?;
            skip_space(input);
            let _ = ':'.parse_next(input)?;
            skip_space(input);
            let comment = parse_quoted.parse_next(input)?;
            table.comment = Some(comment.to_string());
        } else {
            table.columns.push(parse_column_row.parse_next(input)?);
        }
        skip_ws_and_comments(input);
    }

    let _ = '}'.parse_next(input)?;
    Ok(table)
}

fn parse_column_row(input: &mut &str) -> ModalResult<Column> {
    let name = parse_name.parse_next(input)?;
    skip_space(input);
    let ty = parse_type.parse_next(input)?;
    let mut column = Column::new(name, ty);

    skip_space(input);
    if input.starts_with('[') {
        let _ = '['.parse_next(input)?;
        loop {
            skip_space(input);
            let setting: &str =
                take_till(0.., |c: char| c == ',' || c == ']' || c == '\n').parse_next(input)?;
            apply_column_setting(&mut column, setting.trim());
            skip_space(input);
            if input.starts_with(',') {
                let _ = ','.parse_next(input)?;
                continue;
            }
            break;
        }
        let _ = ']'.parse_next(input)?;
    }

    Ok(column)
}

/// Recognized inline modifiers; everything else (`default: …`, `note: …`) is
/// accepted and ignored, matching the flags' absent-means-false default.
fn apply_column_setting(column: &mut Column, setting: &str) {
    let lower = setting.to_ascii_lowercase();
    match lower.as_str() {
        "pk" | "primary key" => {
            column.is_primary_key = true;
            column.is_not_null = true;
        }
        "not null" => column.is_not_null = true,
        "null" => column.is_not_null = false,
        "unique" => column.is_unique = true,
        "increment" => column.is_auto_increment = true,
        _ => {}
    }
}

// ─── Ref statements ─────────────────────────────────────────────────────

/// A `Ref` statement before name resolution.
#[derive(Debug)]
struct RefStmt {
    name: Option<String>,
    source_table: String,
    source_column: String,
    target_table: String,
    target_column: String,
    cardinality: Cardinality,
    on_update: Option<RefAction>,
    on_delete: Option<RefAction>,
}

fn parse_ref_stmt(input: &mut &str) -> ModalResult<RefStmt> {
    let _ = take_while(1.., |c: char| c.is_alphabetic()).parse_next(input)?; // "Ref"
    skip_space(input);

    let name = if input.starts_with(':') {
        None
    } else {
        Some(parse_name.parse_next(input)?)
    };
    skip_space(input);
    let _ = ':'.parse_next(input)?;
    skip_space(input);

    let source_table = parse_name.parse_next(input)?;
    let source_column = preceded('.', parse_name).parse_next(input)?;
    skip_space(input);

    let symbol: char = winnow::token::one_of(['<', '>', '-']).parse_next(input)?;
    let cardinality = match symbol {
        '<' => Cardinality::OneToMany,
        '>' => Cardinality::ManyToOne,
        _ => Cardinality::OneToOne,
    };
    skip_space(input);

    let target_table = parse_name.parse_next(input)?;
    let target_column = preceded('.', parse_name).parse_next(input)?;
    skip_space(input);

    let mut on_update = None;
    let mut on_delete = None;
    if input.starts_with('[') {
        let _ = '['.parse_next(input)?;
        loop {
            skip_space(input);
            let key = parse_identifier.parse_next(input)?;
            skip_space(input);
            let _ = ':'.parse_next(input)?;
            skip_space(input);
            let value: &str = take_till(0.., |c: char| c == ',' || c == ']').parse_next(input)?;
            let action = parse_ref_action(value.trim());
            match key.to_ascii_lowercase().as_str() {
                "update" => on_update = action,
                "delete" => on_delete = action,
                _ => {}
            }
            skip_space(input);
            if input.starts_with(',') {
                let _ = ','.parse_next(input)?;
                continue;
            }
            break;
        }
        let _ = ']'.parse_next(input)?;
    }

    Ok(RefStmt {
        name,
        source_table,
        source_column,
        target_table,
        target_column,
        cardinality,
        on_update,
        on_delete,
    })
}

fn parse_ref_action(value: &str) -> Option<RefAction> {
    match value.to_ascii_lowercase().as_str() {
        "no action" => Some(RefAction::NoAction),
        "restrict" => Some(RefAction::Restrict),
        "cascade" => Some(RefAction::Cascade),
        "set null" => Some(RefAction::SetNull),
        "set default" => Some(RefAction::SetDefault),
        _ => None,
    }
}

fn resolve_ref(doc: &SchemaDoc, stmt: &RefStmt) -> Result<RelationshipDraft, String> {
    let lookup = |table: &str, column: &str| -> Result<(EntityId, EntityId), String> {
        let t = doc
            .table_by_name(table)
            .ok_or_else(|| format!("unknown table `{table}`"))?;
        let c = t
            .columns
            .iter()
            .find(|c| c.name == column)
            .ok_or_else(|| format!("unknown column `{table}.{column}`"))?;
        Ok((t.id, c.id))
    };

    let (source_table, source_column) = lookup(&stmt.source_table, &stmt.source_column)?;
    let (target_table, target_column) = lookup(&stmt.target_table, &stmt.target_column)?;

    Ok(RelationshipDraft {
        name: stmt.name.clone(),
        source_table,
        source_column,
        target_table,
        target_column,
        cardinality: Some(stmt.cardinality),
        on_update: stmt.on_update,
        on_delete: stmt.on_delete,
    })
}
