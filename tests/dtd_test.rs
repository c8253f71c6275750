use pretty_assertions::assert_eq;

use dtd2bq::ast::RepeatKind;
use dtd2bq::error::RefKind;
use dtd2bq::{Cardinality, ColumnType, Error, ResolveError, ResolveOptions, convert};

const CATALOG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- A small book catalog -->
<!ENTITY % inline "#PCDATA | em | code">
<!ENTITY % draft "IGNORE">

<!ELEMENT catalog (book+)>
<!ELEMENT book (title, author+, price?, (summary | abstract)?, note*)>
<!ATTLIST book
    isbn  ID     #REQUIRED
    lang  CDATA  #IMPLIED>
<!ELEMENT title (#PCDATA)>
<!ELEMENT author (name, email?)>
<!ELEMENT name (#PCDATA)>
<!ELEMENT email (#PCDATA)>
<!ELEMENT price (#PCDATA)>
<!ATTLIST price currency (USD | EUR) "USD">
<!ELEMENT summary (%inline;)*>
<!ELEMENT abstract EMPTY>
<!ATTLIST abstract href CDATA #REQUIRED>
<!-- figure is never declared -->
<!ELEMENT note (para | figure)*>
<!ELEMENT para (#PCDATA)>
"##;

fn field_modes(column: &dtd2bq::Column) -> Vec<(&str, ColumnType, Cardinality)> {
    column
        .fields()
        .unwrap_or_default()
        .iter()
        .map(|f| (f.name(), f.value_type(), f.cardinality()))
        .collect()
}

#[test]
fn dtd_catalog_shape() {
    let resolution = convert(CATALOG, "catalog", &ResolveOptions::default()).unwrap();
    let catalog = resolution.column.unwrap();
    assert_eq!(catalog.cardinality(), Cardinality::Nullable);
    assert_eq!(
        field_modes(&catalog),
        vec![("book", ColumnType::Record, Cardinality::Repeated)]
    );

    let book = &catalog.fields().unwrap()[0];
    assert_eq!(
        field_modes(book),
        vec![
            ("isbn", ColumnType::String, Cardinality::Required),
            ("lang", ColumnType::String, Cardinality::Nullable),
            ("title", ColumnType::String, Cardinality::Required),
            ("author", ColumnType::Record, Cardinality::Repeated),
            ("price", ColumnType::Record, Cardinality::Nullable),
            ("summary", ColumnType::String, Cardinality::Repeated),
            ("abstract", ColumnType::Record, Cardinality::Nullable),
            ("note", ColumnType::Record, Cardinality::Repeated),
        ]
    );
}

#[test]
fn dtd_catalog_reports_undeclared_elements() {
    let resolution = convert(CATALOG, "catalog", &ResolveOptions::default()).unwrap();
    assert_eq!(
        resolution.unresolved.iter().collect::<Vec<_>>(),
        vec!["figure"]
    );
}

#[test]
fn dtd_nested_root_can_be_chosen() {
    let resolution = convert(CATALOG, "author", &ResolveOptions::default()).unwrap();
    let author = resolution.column.unwrap();
    assert_eq!(
        field_modes(&author),
        vec![
            ("name", ColumnType::String, Cardinality::Required),
            ("email", ColumnType::String, Cardinality::Nullable),
        ]
    );
    assert!(resolution.unresolved.is_empty());
}

#[test]
fn dtd_number_attribute_is_integer() {
    let input = "<!ELEMENT page EMPTY>\n<!ATTLIST page number NUMBER #REQUIRED>\n";
    let page = convert(input, "page", &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap();
    assert_eq!(
        field_modes(&page),
        vec![("number", ColumnType::Integer, Cardinality::Required)]
    );
    assert_eq!(page.cardinality(), Cardinality::Required);
}

#[test]
fn dtd_later_declaration_wins() {
    let input = "<!ELEMENT a (#PCDATA)>\n<!ELEMENT a (b*)>\n<!ELEMENT b (#PCDATA)>\n";
    let a = convert(input, "a", &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap();
    assert_eq!(
        field_modes(&a),
        vec![("b", ColumnType::String, Cardinality::Repeated)]
    );
}

#[test]
fn dtd_element_without_content_is_dropped() {
    let input = "<!ELEMENT a (b, c)>\n<!ELEMENT b (%missing;)>\n<!ELEMENT c (#PCDATA)>\n";
    let a = convert(input, "a", &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap();
    assert_eq!(
        field_modes(&a),
        vec![("c", ColumnType::String, Cardinality::Required)]
    );
}

#[test]
fn dtd_sgml_inclusion_is_unsupported() {
    let input = "<!ELEMENT memo - - (to, body) +(note)>\n<!ELEMENT (to|body|note) - O (#PCDATA)>\n";
    let err = convert(input, "memo", &ResolveOptions::default()).unwrap_err();
    assert!(
        matches!(
            err,
            Error::Resolve(ResolveError::UnsupportedOperator(RepeatKind::MustInclude))
        ),
        "got: {err}"
    );
}

#[test]
fn dtd_recursive_element_is_an_error() {
    let input = "<!ELEMENT section (title, section*)>\n<!ELEMENT title (#PCDATA)>\n";
    let err = convert(input, "section", &ResolveOptions::default()).unwrap_err();
    match err {
        Error::Resolve(ResolveError::CyclicReference { kind, path }) => {
            assert_eq!(kind, RefKind::Element);
            assert_eq!(path, vec!["section".to_string(), "section".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dtd_mixed_content_does_not_recurse() {
    let input = "<!ELEMENT list (item*)>\n<!ELEMENT item (#PCDATA | list)*>\n";
    let list = convert(input, "list", &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap();
    assert_eq!(
        field_modes(&list),
        vec![("item", ColumnType::String, Cardinality::Repeated)]
    );
}

#[test]
fn dtd_syntax_error_has_position() {
    let input = "<!ELEMENT a (b)>\n<!ELEMENT c (d | e, f)>\n";
    let err = convert(input, "a", &ResolveOptions::default()).unwrap_err();
    match err {
        Error::Parse(parse) => assert_eq!(parse.line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dtd_attributes_do_not_keep_an_element_without_content() {
    let input = r#"
<!ELEMENT doc (img, p)>
<!ELEMENT img (%missing;)>
<!ATTLIST img src CDATA #IMPLIED>
<!ELEMENT p (#PCDATA)>
"#;
    let doc = convert(input, "doc", &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap();
    assert_eq!(
        field_modes(&doc),
        vec![("p", ColumnType::String, Cardinality::Required)]
    );
}

#[test]
fn dtd_bare_number_and_id_content_are_scalars() {
    let input = "<!ELEMENT stats (count, key)>\n<!ELEMENT count NUMBER>\n<!ELEMENT key ID>\n";
    let resolution = convert(input, "stats", &ResolveOptions::default()).unwrap();
    assert!(resolution.unresolved.is_empty());
    assert_eq!(
        field_modes(&resolution.column.unwrap()),
        vec![
            ("count", ColumnType::Integer, Cardinality::Required),
            ("key", ColumnType::String, Cardinality::Required),
        ]
    );
}
