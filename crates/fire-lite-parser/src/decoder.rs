// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bulk decoder turning scanned records into session edits

use crate::scanner::{BlockScanner, Line, Record};
use crate::tokenizer::{
    parse_address, parse_assignment, parse_id, parse_occurrence, Address, AddressScope,
};
use fire_lite_model::{
    key_matches, CatalogEntry, CatalogKind, Category, EntityId, Error, GroupId, PropertySnapshot,
    Result, Scope, Session, ShapeType, TreeNode,
};

/// Decoder over the records of one properties file
///
/// Brace nesting is checked when the decoder is created, so a malformed
/// file is rejected before any edit is attempted.
pub struct PropertiesDecoder<'a> {
    records: Vec<Record<'a>>,
}

impl<'a> PropertiesDecoder<'a> {
    /// Scan the given content
    pub fn new(content: &'a str) -> Result<Self> {
        Ok(Self {
            records: BlockScanner::records(content)?,
        })
    }

    /// Scanned records
    pub fn records(&self) -> &[Record<'a>] {
        &self.records
    }

    /// Apply every record to `session` in file order
    ///
    /// Assignments run in bulk mode; catalog references are checked once
    /// all records are applied. The session is left half-edited on failure,
    /// callers decode into a scratch session.
    pub fn decode_into(&self, session: &mut Session) -> Result<()> {
        let mut blocks = 0usize;
        for record in &self.records {
            match record {
                Record::Header((line, text)) => {
                    let (selector, value) =
                        parse_assignment(text).map_err(|msg| Error::parse(*line, msg))?;
                    session
                        .apply_header(selector, value)
                        .map_err(at_line(*line))?;
                }
                Record::Block { address, body } => {
                    decode_block(session, *address, body)?;
                    blocks += 1;
                }
            }
        }
        session.finish_bulk()?;
        log::debug!("decoded {} blocks", blocks);
        Ok(())
    }
}

/// Prefix the line number to errors raised while interpreting a line
fn at_line(line: usize) -> impl Fn(Error) -> Error {
    move |err| match err {
        Error::Configuration(msg) => Error::Configuration(format!("line {}: {}", line, msg)),
        Error::Format(msg) => Error::Format(format!("line {}: {}", line, msg)),
        Error::Consistency(msg) => Error::Consistency(format!("line {}: {}", line, msg)),
        other => other,
    }
}

fn decode_block(session: &mut Session, (line, text): Line<'_>, body: &[Line<'_>]) -> Result<()> {
    let address = parse_address(text).map_err(|msg| Error::parse(line, msg))?;

    let (shape, scope) = match address.scope {
        AddressScope::Entity(shape) => (shape, Scope::Entity(EntityId(id(line, address.key)?))),
        AddressScope::Group(shape) => (shape, Scope::Group(GroupId(id(line, address.key)?))),
        AddressScope::Catalog(kind) => return decode_catalog(session, kind, line, &address, body),
    };
    let occurrence = parse_occurrence(address.label).map_err(|msg| Error::parse(line, msg))?;
    let category = Category::parse(address.category).ok_or_else(|| {
        Error::configuration(format!(
            "line {}: unknown category '{}'",
            line, address.category
        ))
    })?;

    let snapshot = {
        let tree = session.tree();
        let template = tree
            .leaf_template(shape, category, address.subtype)
            .map_err(at_line(line))?;
        let mut snapshot = tree
            .default_snapshot(shape, category, address.subtype)
            .map_err(at_line(line))?;
        if let Some(sub) = address.subcategory {
            let known = template
                .groups
                .first()
                .is_some_and(|group| group.position(sub).is_some());
            if !known {
                return Err(Error::configuration(format!(
                    "line {}: '{}' has no sub-category '{}'",
                    line, template.name, sub
                )));
            }
            snapshot.subcategory = Some(sub.to_string());
        }
        apply_body(template, &mut snapshot, body)?;
        snapshot
    };

    session
        .assign_bulk(category, shape, scope, occurrence, snapshot)
        .map_err(at_line(line))?;
    Ok(())
}

fn decode_catalog(
    session: &mut Session,
    kind: CatalogKind,
    line: usize,
    address: &Address<'_>,
    body: &[Line<'_>],
) -> Result<()> {
    if !key_matches(kind.name(), address.category) {
        return Err(Error::parse(
            line,
            format!("{} entries must use the '{}' category", kind, kind),
        ));
    }
    if address.subcategory.is_some() {
        return Err(Error::parse(line, "catalog entries have no sub-category"));
    }
    let shape = ShapeType::parse(address.label)
        .ok_or_else(|| Error::parse(line, format!("'{}' is not a shape", address.label)))?;
    let snapshot = {
        let tree = session.tree();
        let template = tree
            .catalog_template(kind, address.subtype)
            .map_err(at_line(line))?;
        let mut snapshot = tree
            .default_catalog_snapshot(kind, address.subtype)
            .map_err(at_line(line))?;
        apply_body(template, &mut snapshot, body)?;
        snapshot
    };
    session
        .append_catalog_entry(kind, CatalogEntry::new(address.key, shape, snapshot))
        .map_err(at_line(line))
}

fn id(line: usize, key: &str) -> Result<u32> {
    parse_id(key).ok_or_else(|| Error::parse(line, format!("'{}' is not an id", key)))
}

fn apply_body(
    template: &TreeNode,
    snapshot: &mut PropertySnapshot,
    body: &[Line<'_>],
) -> Result<()> {
    for &(line, text) in body {
        let (name, raw) = parse_assignment(text).map_err(|msg| Error::parse(line, msg))?;
        let def = template.property(name).ok_or_else(|| {
            Error::configuration(format!(
                "line {}: '{}' is not a property of '{}'",
                line, name, template.name
            ))
        })?;
        let value = def.parse_value(raw).map_err(at_line(line))?;
        snapshot.set(&def.key, value);
    }
    Ok(())
}
