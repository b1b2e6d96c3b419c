// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Properties file line grammar using nom combinators
//!
//! Parses block addresses (`Curve 3(1) - Load/Trapezoidal`) and
//! `name: value` lines into borrowed tokens.

use fire_lite_model::{CatalogKind, ShapeType};
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, space1},
    error::{Error as NomError, ErrorKind as NomErrorKind},
    sequence::delimited,
    IResult, Parser,
};

/// Owner addressed by a block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressScope {
    /// `Point`, `Curve`, `Surface` or `Volume`
    Entity(ShapeType),
    /// `Group <Shape>`
    Group(ShapeType),
    /// `Material` or `LocalAxis`
    Catalog(CatalogKind),
}

/// Parsed block address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address<'a> {
    /// Owner kind
    pub scope: AddressScope,
    /// Entity/group id, or catalog entry name
    pub key: &'a str,
    /// Occurrence number, or shape name for catalog entries
    pub label: &'a str,
    /// Category (catalog kind name for catalog entries)
    pub category: &'a str,
    /// Optional sub-type
    pub subtype: Option<&'a str>,
    /// Optional sub-category
    pub subcategory: Option<&'a str>,
}

// ============================================================================
// Parsing Primitives
// ============================================================================

fn fail(input: &str) -> nom::Err<NomError<&str>> {
    nom::Err::Error(NomError::new(input, NomErrorKind::Verify))
}

/// Parse an identifier word
fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Parse the owner part of an address
fn scope(input: &str) -> IResult<&str, AddressScope> {
    let (rest, first) = word(input)?;
    if first.eq_ignore_ascii_case("Group") {
        let (rest, _) = space1(rest)?;
        let (rest, shape) = word(rest)?;
        let shape = ShapeType::parse(shape).ok_or_else(|| fail(input))?;
        return Ok((rest, AddressScope::Group(shape)));
    }
    if let Some(shape) = ShapeType::parse(first) {
        return Ok((rest, AddressScope::Entity(shape)));
    }
    CatalogKind::parse(first)
        .map(|kind| (rest, AddressScope::Catalog(kind)))
        .ok_or_else(|| fail(input))
}

/// Parse the key, everything up to the label
fn key(input: &str) -> IResult<&str, &str> {
    let (rest, key) = take_while1(|c: char| c != '(')(input)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(fail(input));
    }
    Ok((rest, key))
}

/// Parse a parenthesized label, possibly empty
fn label(input: &str) -> IResult<&str, &str> {
    let (rest, label) =
        delimited(char('('), take_while(|c: char| c != ')'), char(')')).parse(input)?;
    Ok((rest, label.trim()))
}

/// Parse a block address line
///
/// Format: `<Scope> <key>(<label>) - Category[/SubType[/SubCategory]]`
pub fn parse_address(line: &str) -> Result<Address<'_>, String> {
    let input = line.trim();
    let (input, scope) = scope(input).map_err(|_| format!("unknown owner in '{}'", line))?;
    let (input, _) = space1::<&str, NomError<&str>>(input)
        .map_err(|_| format!("expected a space after the owner in '{}'", line))?;
    let (input, key) = key(input).map_err(|_| format!("missing key in '{}'", line))?;
    let (input, label) = label(input).map_err(|_| format!("missing '(label)' in '{}'", line))?;
    let (input, _) = (multispace0, char('-'), multispace0)
        .parse(input)
        .map_err(|_: nom::Err<NomError<&str>>| format!("expected ' - ' in '{}'", line))?;

    let mut parts = input.split('/').map(str::trim);
    let category = parts
        .next()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| format!("missing category in '{}'", line))?;
    let subtype = parts.next().filter(|s| !s.is_empty());
    let subcategory = parts.next().filter(|s| !s.is_empty());
    if parts.next().is_some() {
        return Err(format!("too many path levels in '{}'", line));
    }

    Ok(Address {
        scope,
        key,
        label,
        category,
        subtype,
        subcategory,
    })
}

/// Parse a `name: value` line
///
/// The value is everything after the first colon and may be empty.
pub fn parse_assignment(line: &str) -> Result<(&str, &str), String> {
    let (value, name) = take_while1::<_, &str, NomError<&str>>(|c: char| c != ':')(line)
        .map_err(|_| format!("expected 'name: value', got '{}'", line))?;
    let (value, _) = char::<&str, NomError<&str>>(':')(value)
        .map_err(|_| format!("expected 'name: value', got '{}'", line))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{}'", line));
    }
    Ok((name, value.trim()))
}

/// Parse an unsigned id with lexical-core
pub fn parse_id(text: &str) -> Option<u32> {
    lexical_core::parse::<u32>(text.trim().as_bytes()).ok()
}

/// Parse an occurrence label, empty meaning none
pub fn parse_occurrence(label: &str) -> Result<Option<u32>, String> {
    if label.trim().is_empty() {
        return Ok(None);
    }
    parse_id(label)
        .map(Some)
        .ok_or_else(|| format!("'{}' is not an occurrence number", label))
}
