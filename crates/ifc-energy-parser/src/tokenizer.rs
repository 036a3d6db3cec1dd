// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP file tokenizer using nom combinators
//!
//! Parses STEP/IFC entity definitions and header records into tokens.

use ifc_energy_model::{AttributeValue, DecodedEntity, EntityId, IfcType, ParseError, Result};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};

/// Raw token from STEP file (before conversion to AttributeValue)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String value ('text'), still STEP-escaped
    String(&'a str),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    /// List of tokens
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl<'a> Token<'a> {
    /// Convert token to owned AttributeValue
    ///
    /// Strings are unescaped on the way out.
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(decode_step_string(s)),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(|t| t.to_attribute_value()).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                (*name).to_string(),
                args.iter().map(|t| t.to_attribute_value()).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Parse whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, _) = char('#')(input)?;
    let (rest, digits) = take_while1(|c: char| c.is_ascii_digit())(rest)?;
    let id = digits
        .parse::<u32>()
        .map_err(|_| nom::Err::Error(Error::new(input, ErrorKind::Digit)))?;
    Ok((rest, Token::EntityRef(id)))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
///
/// An unterminated string is an error rather than running off the end of
/// the entity.
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (body, _) = char('\'')(input)?;

    let bytes = body.as_bytes();
    let mut end = 0;
    loop {
        if end >= bytes.len() {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
        }
        if bytes[end] == b'\'' {
            if bytes.get(end + 1) == Some(&b'\'') {
                end += 2;
                continue;
            }
            break;
        }
        end += 1;
    }

    Ok((&body[end + 1..], Token::String(&body[..end])))
}

/// Parse a number (integer or float)
///
/// STEP reals always carry a decimal point and may omit the fraction
/// (`40.`, `1.E-3`).
fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let invalid = || nom::Err::Error(Error::new(input, ErrorKind::Float));

    if num_str.contains(['.', 'e', 'E']) {
        let f = lexical_core::parse::<f64>(num_str.as_bytes())
            .ok()
            .or_else(|| num_str.parse::<f64>().ok())
            .ok_or_else(invalid)?;
        Ok((rest, Token::Float(f)))
    } else {
        let i = lexical_core::parse::<i64>(num_str.as_bytes()).map_err(|_| invalid())?;
        Ok((rest, Token::Integer(i)))
    }
}

/// Parse an enumeration (.VALUE.)
fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('.')(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, Token::Enum(name)))
}

/// Parse null ($)
fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

/// Parse derived (*)
fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

/// Parse a parenthesised, comma-separated token list
fn token_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

/// Parse a list of tokens
fn list(input: &str) -> IResult<&str, Token<'_>> {
    let (input, items) = token_list(input)?;
    Ok((input, Token::List(items)))
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, type_name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = token_list(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

/// Parse any token
fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

/// Parse the argument list of a header record such as `FILE_NAME(...)`
///
/// `input` must start at the opening parenthesis.
pub(crate) fn parse_record_arguments(input: &str) -> Option<Vec<AttributeValue>> {
    let (_, tokens) = token_list(input.trim_start()).ok()?;
    Some(tokens.iter().map(|t| t.to_attribute_value()).collect())
}

// ============================================================================
// String decoding
// ============================================================================

/// Decode a raw STEP string body
///
/// Handles doubled quotes, `\X2\...\X0\` (UTF-16 hex), `\X\hh` (ISO 8859-1
/// byte) and `\\`. Unrecognised escapes are kept verbatim.
pub fn decode_step_string(raw: &str) -> String {
    if !raw.contains(['\'', '\\']) {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(['\'', '\\']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("''") {
            out.push('\'');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\X2\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            let units: Vec<u16> = tail[..end]
                .as_bytes()
                .chunks(4)
                .filter_map(|chunk| std::str::from_utf8(chunk).ok())
                .filter_map(|hex| u16::from_str_radix(hex, 16).ok())
                .collect();
            out.extend(char::decode_utf16(units).map(|c| c.unwrap_or('\u{FFFD}')));
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(byte) = rest
            .strip_prefix("\\X\\")
            .and_then(|tail| tail.get(..2))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            out.push(char::from(byte));
            rest = &rest[5..];
        } else {
            out.push_str(&rest[..1]);
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Parse a complete entity definition
///
/// Format: `#123=IFCSPACE(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity> {
    let input = input.trim_start();

    let (input, _) = char::<&str, Error<&str>>('#')
        .parse(input)
        .map_err(|_| ParseError::format("expected # at start of entity"))?;

    let (input, id_str) = take_while1::<_, &str, Error<&str>>(|c: char| c.is_ascii_digit())
        .parse(input)
        .map_err(|_| ParseError::format("expected entity ID"))?;

    let id = id_str
        .parse::<u32>()
        .map(EntityId)
        .map_err(|_| ParseError::format(format!("invalid entity ID #{}", id_str)))?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<Error<&str>>| ParseError::entity_parse(id, "expected = after ID"))?;

    let (input, type_name) =
        take_while1::<_, &str, Error<&str>>(|c: char| c.is_alphanumeric() || c == '_')
            .parse(input)
            .map_err(|_| ParseError::entity_parse(id, "expected type name"))?;

    let (input, _) = ws(input).unwrap_or((input, ()));

    let (_, tokens) = token_list(input)
        .map_err(|e| ParseError::entity_parse(id, format!("bad attribute list: {:?}", e)))?;

    Ok(DecodedEntity {
        id,
        ifc_type: IfcType::parse(type_name),
        attributes: tokens.iter().map(|t| t.to_attribute_value()).collect(),
    })
}

/// Parse entity from content at given byte range
pub fn parse_entity_at(content: &str, start: usize, end: usize) -> Result<DecodedEntity> {
    let slice = content.get(start..end).ok_or_else(|| {
        ParseError::format(format!("entity range {}..{} out of bounds", start, end))
    })?;
    parse_entity(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_ref() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_parse_string_with_escaped_quote() {
        let (remaining, token) = step_string("'Manager''s Office'").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::String("Manager''s Office"));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(step_string("'Office").is_err());
        assert!(matches!(
            parse_entity("#1=IFCSPACE('guid',$,'Office);"),
            Err(ParseError::EntityParse(EntityId(1), _))
        ));
        assert!(matches!(
            parse_entity("IFCSPACE('guid');"),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(parse_entity_at("#1=IFCSPACE();", 0, 99).is_err());
    }

    #[test]
    fn test_parse_step_reals() {
        let (_, token) = number("40.").unwrap();
        assert_eq!(token, Token::Float(40.0));

        let (_, token) = number("1.5E-3").unwrap();
        match token {
            Token::Float(f) => assert!((f - 0.0015).abs() < 1e-12),
            other => panic!("Expected float, got {:?}", other),
        }

        let (_, token) = number("-12").unwrap();
        assert_eq!(token, Token::Integer(-12));
    }

    #[test]
    fn test_parse_typed_measure() {
        let (remaining, token) = token("IFCAREAMEASURE(25.5)").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(
            token,
            Token::TypedValue("IFCAREAMEASURE", vec![Token::Float(25.5)])
        );
    }

    #[test]
    fn test_parse_enum() {
        let (remaining, token) = enumeration(".ELEMENT.").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::Enum("ELEMENT"));
    }

    #[test]
    fn test_decode_step_string() {
        assert_eq!(decode_step_string("Manager''s Office"), "Manager's Office");
        assert_eq!(decode_step_string("m\\X2\\00B2\\X0\\"), "m²");
        assert_eq!(decode_step_string("Caf\\X\\E9"), "Café");
        assert_eq!(decode_step_string("PARKING-1"), "PARKING-1");
    }

    #[test]
    fn test_parse_space_entity() {
        let entity = parse_entity(
            "#20=IFCSPACE('2Qx',#2,'PARKING-1','Level 1',$,#21,$,'P1',.ELEMENT.,.INTERNAL.,$);",
        )
        .unwrap();
        assert_eq!(entity.id, EntityId(20));
        assert_eq!(entity.ifc_type, IfcType::IfcSpace);
        assert_eq!(entity.get_string(2), Some("PARKING-1"));
        assert!(entity.get(4).unwrap().is_null());
        assert_eq!(entity.get_enum(8), Some("ELEMENT"));
    }

    #[test]
    fn test_parse_record_arguments() {
        let args = parse_record_arguments("(('IFC4'))").unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].as_list().unwrap()[0].as_string(), Some("IFC4"));
    }
}
