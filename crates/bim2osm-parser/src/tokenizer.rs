// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP tokenizer using nom combinators
//!
//! Parses entity instances (`#1=IFCWALL(...);`) and header statements
//! (`FILE_SCHEMA(('IFC4'));`) into tokens.

use bim2osm_model::{AttributeValue, DecodedEntity, EntityId, IfcType};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{eof, map_res, opt, recognize},
    multi::{many1, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
    IResult, Parser,
};

/// Type name reported for complex (multi-type) entity instances
pub const COMPLEX_INSTANCE: &str = "COMPLEX";

/// Raw token from STEP file (before conversion to AttributeValue)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String value ('text'), escapes still in place
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
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(s.replace("''", "'")),
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

fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn entity_id(input: &str) -> IResult<&str, u32> {
    preceded(
        char('#'),
        map_res(take_while1(|c: char| c.is_ascii_digit()), str::parse::<u32>),
    )
    .parse(input)
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token> {
    let (input, id) = entity_id(input)?;
    Ok((input, Token::EntityRef(id)))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('\'')(input)?;

    let bytes = input.as_bytes();
    let mut end = 0;
    loop {
        match memchr::memchr(b'\'', &bytes[end..]) {
            Some(offset) => {
                end += offset;
                if bytes.get(end + 1) == Some(&b'\'') {
                    end += 2;
                    continue;
                }
                break;
            }
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )))
            }
        }
    }

    Ok((&input[end + 1..], Token::String(&input[..end])))
}

/// Parse a number (integer or real)
fn number(input: &str) -> IResult<&str, Token> {
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

    let is_real = num_str.contains(['.', 'e', 'E']);
    let token = if is_real {
        lexical_core::parse::<f64>(num_str.as_bytes())
            .ok()
            .or_else(|| num_str.parse::<f64>().ok())
            .map(Token::Float)
    } else {
        lexical_core::parse::<i64>(num_str.as_bytes())
            .ok()
            .map(Token::Integer)
    };

    match token {
        Some(token) => Ok((rest, token)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// Parse an enumeration (.VALUE.)
fn enumeration(input: &str) -> IResult<&str, Token> {
    let (input, name) = delimited(char('.'), identifier, char('.')).parse(input)?;
    Ok((input, Token::Enum(name)))
}

fn null_value(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

fn derived_value(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

/// Parenthesised, comma separated token list
fn token_list(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Token> {
    let (input, items) = token_list(input)?;
    Ok((input, Token::List(items)))
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token> {
    let (input, type_name) = identifier(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = token_list(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

/// Parse any token
fn token(input: &str) -> IResult<&str, Token> {
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

/// `NAME(args)` followed by `;` and nothing else
fn statement(input: &str) -> IResult<&str, (&str, Vec<Token>)> {
    terminated(
        pair(terminated(identifier, ws), token_list),
        (ws, char(';'), ws, eof),
    )
    .parse(input)
}

/// `(IFCA(...) IFCB(...))` followed by `;`
fn complex_instance(input: &str) -> IResult<&str, Vec<Token>> {
    terminated(
        delimited(
            pair(char('('), ws),
            many1(terminated(typed_value, ws)),
            char(')'),
        ),
        (ws, char(';'), ws, eof),
    )
    .parse(input)
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Parse a complete entity instance
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`. Anything but whitespace after
/// the closing `;` is rejected. Complex instances are decoded with type
/// [`COMPLEX_INSTANCE`] and one typed value per partial entity.
pub fn parse_entity(input: &str) -> Result<DecodedEntity, String> {
    let input = input.trim_start();

    let (input, id) = entity_id(input).map_err(|_| "Expected #id at start of entity")?;
    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| "Expected = after entity ID")?;

    if input.starts_with('(') {
        let (_, parts) = complex_instance(input)
            .map_err(|e| format!("Failed to parse complex instance: {:?}", e))?;
        return Ok(DecodedEntity {
            id: EntityId(id),
            ifc_type: IfcType::Unknown(COMPLEX_INSTANCE.to_string()),
            attributes: parts.iter().map(|t| t.to_attribute_value()).collect(),
        });
    }

    let (_, (type_name, tokens)) =
        statement(input).map_err(|e| format!("Failed to parse attributes: {:?}", e))?;

    Ok(DecodedEntity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes: tokens.iter().map(|t| t.to_attribute_value()).collect(),
    })
}

/// Parse a header statement such as `FILE_SCHEMA(('IFC4'));`
pub fn parse_statement(input: &str) -> Result<(String, Vec<AttributeValue>), String> {
    let (_, (name, tokens)) = statement(input.trim_start())
        .map_err(|e| format!("Failed to parse statement: {:?}", e))?;
    Ok((
        name.to_ascii_uppercase(),
        tokens.iter().map(|t| t.to_attribute_value()).collect(),
    ))
}
