use tracing::{debug, warn};
use winnow::prelude::*;
use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{alt, delimited, not, opt, peek, preceded, repeat, separated, terminated};
use winnow::token::{one_of, take_till, take_until, take_while};

use crate::ast::*;
use crate::error::ParseError;

pub fn parse_dtd(input: &str) -> Result<Vec<TopLevelDecl>, ParseError> {
    let mut rest = input;
    let mut decls = Vec::new();
    loop {
        if trivia(&mut rest).is_err() {
            return Err(error_at(input, rest));
        }
        if rest.is_empty() {
            break;
        }
        match markup_decl(&mut rest) {
            Ok(found) => decls.extend(found),
            Err(_) => return Err(error_at(input, rest)),
        }
    }
    Ok(decls)
}

fn error_at(source: &str, rest: &str) -> ParseError {
    let consumed = source.get(..source.len() - rest.len()).unwrap_or("");
    let line = consumed.matches('\n').count() + 1;
    let column = consumed.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;

    let context = rest.lines().next().unwrap_or("").trim();
    let context = if context.chars().count() > 40 {
        format!("{}...", context.chars().take(40).collect::<String>())
    } else if context.is_empty() {
        "end of input".to_string()
    } else {
        context.to_string()
    };

    ParseError {
        line,
        column,
        context,
    }
}

// --- between declarations ---

fn trivia(input: &mut &str) -> winnow::Result<()> {
    let () = repeat(
        0..,
        alt((
            multispace1.void(),
            comment_decl,
            processing_instruction,
            marked_section_start,
            "]]>".void(),
            (']', multispace0, '>').void(),
            pe_ref.map(|entity| debug!(entity = %entity, "skipping top-level entity reference")),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

fn comment_decl(input: &mut &str) -> winnow::Result<()> {
    ("<!--", take_until(0.., "-->"), "-->").void().parse_next(input)
}

fn processing_instruction(input: &mut &str) -> winnow::Result<()> {
    ("<?", take_until(0.., "?>"), "?>").void().parse_next(input)
}

fn marked_section_start(input: &mut &str) -> winnow::Result<()> {
    ("<![", ws, alt((pe_ref.void(), name.void())), ws, '[')
        .void()
        .parse_next(input)
}

/// Whitespace plus SGML `-- ... --` comments inside a declaration.
fn ws(input: &mut &str) -> winnow::Result<()> {
    let () = repeat(0.., alt((multispace1.void(), sgml_comment))).parse_next(input)?;
    Ok(())
}

fn sgml_comment(input: &mut &str) -> winnow::Result<()> {
    ("--", take_until(0.., "--"), "--").void().parse_next(input)
}

// --- declarations ---

fn markup_decl(input: &mut &str) -> winnow::Result<Vec<TopLevelDecl>> {
    let keyword = peek(preceded("<!", name)).parse_next(input)?;
    match keyword {
        "ELEMENT" => element_decl(input),
        "ATTLIST" => attlist_decl(input),
        "ENTITY" => entity_decl(input).map(|decl| vec![decl]),
        "DOCTYPE" => doctype_decl(input),
        _ => other_decl(input),
    }
}

fn element_decl(input: &mut &str) -> winnow::Result<Vec<TopLevelDecl>> {
    ("<!ELEMENT", ws).parse_next(input)?;
    let names = name_or_group.parse_next(input)?;
    ws.parse_next(input)?;
    opt(minimization).parse_next(input)?;
    let content = content_spec.parse_next(input)?;
    let exceptions: Vec<ContentNode> = repeat(0.., preceded(ws, exception)).parse_next(input)?;
    (ws, '>').parse_next(input)?;

    let content = if exceptions.is_empty() {
        content
    } else {
        let mut children = vec![content];
        children.extend(exceptions);
        ContentNode::Group(GroupKind::Sequence, children)
    };

    Ok(names
        .into_iter()
        .map(|name| {
            TopLevelDecl::Element(ElementDecl {
                name,
                content: content.clone(),
            })
        })
        .collect())
}

/// SGML tag omission flags, e.g. `- O`.
fn minimization(input: &mut &str) -> winnow::Result<()> {
    (
        one_of(['-', 'O', 'o']),
        multispace1,
        one_of(['-', 'O', 'o']),
        multispace1,
    )
        .void()
        .parse_next(input)
}

fn content_spec(input: &mut &str) -> winnow::Result<ContentNode> {
    alt((declared_content, item)).parse_next(input)
}

fn declared_content(input: &mut &str) -> winnow::Result<ContentNode> {
    name.verify_map(|word| match word {
        "EMPTY" => Some(PrimitiveKind::Empty),
        "ANY" => Some(PrimitiveKind::Any),
        "CDATA" | "RCDATA" => Some(PrimitiveKind::Cdata),
        "NUMBER" => Some(PrimitiveKind::Number),
        "ID" => Some(PrimitiveKind::Id),
        _ => None,
    })
    .map(ContentNode::Primitive)
    .parse_next(input)
}

fn exception(input: &mut &str) -> winnow::Result<ContentNode> {
    alt((
        preceded('+', group).map(|g| ContentNode::repeated(RepeatKind::MustInclude, g)),
        preceded('-', group).map(|g| ContentNode::repeated(RepeatKind::MustExclude, g)),
    ))
    .parse_next(input)
}

fn attlist_decl(input: &mut &str) -> winnow::Result<Vec<TopLevelDecl>> {
    ("<!ATTLIST", ws).parse_next(input)?;
    let names = name_or_group.parse_next(input)?;

    let mut attributes = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt('>').parse_next(input)?.is_some() {
            break;
        }
        if let Some(entity) = opt(pe_ref).parse_next(input)? {
            warn!(entity = %entity, "skipping entity reference in attribute list");
            continue;
        }
        attributes.push(attribute_def.parse_next(input)?);
    }

    Ok(names
        .into_iter()
        .map(|element_name| {
            TopLevelDecl::Attributes(ElementAttributes {
                element_name,
                attributes: attributes.clone(),
            })
        })
        .collect())
}

fn attribute_def(input: &mut &str) -> winnow::Result<AttributeDecl> {
    let attr_name = name.parse_next(input)?;
    ws.parse_next(input)?;
    let attr_type = attr_type.parse_next(input)?;
    ws.parse_next(input)?;
    let pattern = default_value.parse_next(input)?;

    Ok(AttributeDecl {
        attr_name: attr_name.to_string(),
        attr_type,
        pattern,
    })
}

fn attr_type(input: &mut &str) -> winnow::Result<AttrType> {
    alt((
        enumeration.map(AttrType::Enumerated),
        preceded(("NOTATION", ws), enumeration).map(AttrType::Enumerated),
        name.map(|keyword: &str| match PrimitiveKind::from_keyword(keyword) {
            Some(kind) => AttrType::Constant(kind),
            None => AttrType::Reference(keyword.to_string()),
        }),
    ))
    .parse_next(input)
}

fn enumeration(input: &mut &str) -> winnow::Result<Vec<String>> {
    delimited(
        ('(', ws),
        separated(1.., name_token, (ws, one_of([',', '|', '&']), ws)),
        (ws, ')'),
    )
    .parse_next(input)
}

fn default_value(input: &mut &str) -> winnow::Result<AttrPattern> {
    alt((
        "#IMPLIED".value(AttrPattern::Implied),
        "#REQUIRED".value(AttrPattern::Required),
        alt(("#CURRENT", "#CONREF")).value(AttrPattern::Implied),
        preceded(("#FIXED", ws), attr_value).map(AttrPattern::Fixed),
        attr_value.map(AttrPattern::EnumeratedValue),
    ))
    .parse_next(input)
}

fn attr_value(input: &mut &str) -> winnow::Result<String> {
    alt((quoted.map(|v: &str| v.to_string()), name_token)).parse_next(input)
}

enum EntityText<'s> {
    External(Vec<String>),
    Data(&'s str),
    Value(&'s str),
}

fn entity_decl(input: &mut &str) -> winnow::Result<TopLevelDecl> {
    ("<!ENTITY", ws).parse_next(input)?;
    opt(terminated('%', multispace1)).parse_next(input)?;
    let entity_name = name.parse_next(input)?.to_string();
    ws.parse_next(input)?;

    let text = alt((
        external_id.map(EntityText::External),
        preceded((data_keyword, ws), quoted).map(EntityText::Data),
        quoted.map(EntityText::Value),
    ))
    .parse_next(input)?;
    opt((ws, "NDATA", ws, name)).parse_next(input)?;
    (ws, '>').parse_next(input)?;

    Ok(match text {
        EntityText::External(ids) => TopLevelDecl::Entity(EntityDecl {
            entity_name,
            body: EntityBody::External(ids),
        }),
        EntityText::Data(text) => TopLevelDecl::Entity(EntityDecl {
            entity_name,
            body: EntityBody::Literal(text.to_string()),
        }),
        EntityText::Value(text) => entity_value(entity_name, text),
    })
}

fn entity_value(entity_name: String, text: &str) -> TopLevelDecl {
    let state = match text.trim() {
        "INCLUDE" => Some(Availability::Include),
        "IGNORE" => Some(Availability::Ignore),
        _ => None,
    };
    if let Some(state) = state {
        return TopLevelDecl::Availability(EntityAvailability { entity_name, state });
    }

    let body = match content_fragment.parse(text) {
        Ok(node) => EntityBody::Content(node),
        Err(_) => EntityBody::Literal(text.to_string()),
    };
    TopLevelDecl::Entity(EntityDecl { entity_name, body })
}

fn content_fragment(input: &mut &str) -> winnow::Result<ContentNode> {
    delimited(ws, alt((declared_content, group_body)), ws).parse_next(input)
}

fn data_keyword<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    alt(("CDATA", "SDATA", "NDATA", "PI", "STARTTAG", "ENDTAG", "MS", "MD")).parse_next(input)
}

fn external_id(input: &mut &str) -> winnow::Result<Vec<String>> {
    alt((
        preceded(("PUBLIC", ws), (quoted, opt(preceded(ws, quoted)))).map(
            |(public, system): (&str, Option<&str>)| {
                std::iter::once(public)
                    .chain(system)
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
            },
        ),
        preceded("SYSTEM", opt(preceded(ws, quoted)))
            .map(|system: Option<&str>| {
                system.into_iter().map(|id| id.to_string()).collect::<Vec<_>>()
            }),
    ))
    .parse_next(input)
}

fn doctype_decl(input: &mut &str) -> winnow::Result<Vec<TopLevelDecl>> {
    ("<!DOCTYPE", ws, name, ws).parse_next(input)?;
    opt(terminated(external_id, ws)).parse_next(input)?;
    // An internal subset stays open; its `]>` is consumed as trivia.
    alt(('['.void(), '>'.void())).parse_next(input)?;
    Ok(Vec::new())
}

fn other_decl(input: &mut &str) -> winnow::Result<Vec<TopLevelDecl>> {
    let keyword = preceded("<!", name).parse_next(input)?;
    let () = repeat(
        0..,
        alt((quoted.void(), take_till(1.., ['"', '\'', '>']).void())),
    )
    .parse_next(input)?;
    '>'.parse_next(input)?;
    warn!(keyword, "skipping unsupported declaration");
    Ok(Vec::new())
}

// --- content models ---

fn item(input: &mut &str) -> winnow::Result<ContentNode> {
    let node = alt((
        "#PCDATA".value(ContentNode::Primitive(PrimitiveKind::Pcdata)),
        group,
        pe_ref.map(ContentNode::EntityRef),
        name.map(|n: &str| ContentNode::element(n)),
    ))
    .parse_next(input)?;

    Ok(match opt(occurrence).parse_next(input)? {
        Some(kind) => ContentNode::repeated(kind, node),
        None => node,
    })
}

fn occurrence(input: &mut &str) -> winnow::Result<RepeatKind> {
    alt((
        '*'.value(RepeatKind::ZeroOrMore),
        terminated('+', not('(')).value(RepeatKind::OneOrMore),
        '?'.value(RepeatKind::ZeroOrOne),
    ))
    .parse_next(input)
}

fn group(input: &mut &str) -> winnow::Result<ContentNode> {
    delimited(('(', ws), group_body, (ws, ')')).parse_next(input)
}

/// Items joined by one connector kind; a lone item is returned as is.
fn group_body(input: &mut &str) -> winnow::Result<ContentNode> {
    let first = item.parse_next(input)?;
    let Some(kind) = opt(preceded(ws, connector)).parse_next(input)? else {
        return Ok(first);
    };

    let mut children = vec![first];
    loop {
        ws.parse_next(input)?;
        children.push(item.parse_next(input)?);
        match opt(preceded(ws, connector)).parse_next(input)? {
            None => break,
            Some(next) if next == kind => {}
            Some(_) => return Err(winnow::error::ParserError::from_input(input)),
        }
    }
    Ok(ContentNode::Group(kind, children))
}

fn connector(input: &mut &str) -> winnow::Result<GroupKind> {
    alt((
        ','.value(GroupKind::Sequence),
        '&'.value(GroupKind::And),
        '|'.value(GroupKind::Or),
    ))
    .parse_next(input)
}

// --- lexical ---

fn name_or_group(input: &mut &str) -> winnow::Result<Vec<String>> {
    alt((name.map(|n: &str| vec![n.to_string()]), name_group)).parse_next(input)
}

fn name_group(input: &mut &str) -> winnow::Result<Vec<String>> {
    delimited(
        ('(', ws),
        separated(
            1..,
            name.map(|n: &str| n.to_string()),
            (ws, one_of([',', '|', '&']), ws),
        ),
        (ws, ')'),
    )
    .parse_next(input)
}

fn pe_ref(input: &mut &str) -> winnow::Result<String> {
    delimited('%', name, opt(';'))
        .map(|n: &str| n.to_string())
        .parse_next(input)
}

fn quoted<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn name<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == ':'),
        take_while(0.., is_name_char),
    )
        .take()
        .parse_next(input)
}

fn name_token(input: &mut &str) -> winnow::Result<String> {
    take_while(1.., is_name_char)
        .map(|t: &str| t.to_string())
        .parse_next(input)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}
