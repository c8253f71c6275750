use pretty_assertions::assert_eq;

use dtd2bq::{ResolveOptions, SchemaField, convert};

fn to_json(input: &str, root: &str) -> String {
    convert(input, root, &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap()
        .to_json()
        .unwrap()
}

#[test]
fn snapshot_child_element() {
    let input = "<!ELEMENT root (child)>\n<!ELEMENT child (#PCDATA)>\n";
    assert_eq!(
        to_json(input, "root"),
        r#"{"name":"root","type":"RECORD","mode":"NULLABLE","fields":[{"name":"child","type":"STRING","mode":"REQUIRED"}]}"#
    );
}

#[test]
fn snapshot_repeated_child() {
    let input = "<!ELEMENT root (child+)>\n<!ELEMENT child (#PCDATA)>\n";
    assert_eq!(
        to_json(input, "root"),
        r#"{"name":"root","type":"RECORD","mode":"NULLABLE","fields":[{"name":"child","type":"STRING","mode":"REPEATED"}]}"#
    );
}

#[test]
fn snapshot_pretty_attributes_and_detail() {
    let input = "<!ELEMENT root (#PCDATA)>\n<!ATTLIST root id ID #REQUIRED>\n";
    let output = convert(input, "root", &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap()
        .to_json_pretty()
        .unwrap();
    let expected = r#"{
  "name": "root",
  "type": "RECORD",
  "mode": "REQUIRED",
  "fields": [
    {
      "name": "id",
      "type": "STRING",
      "mode": "REQUIRED"
    },
    {
      "name": "detail",
      "type": "STRING",
      "mode": "REQUIRED"
    }
  ]
}"#;
    assert_eq!(output, expected);
}

#[test]
fn snapshot_custom_detail_field() {
    let input = "<!ELEMENT price (#PCDATA)>\n<!ATTLIST price currency CDATA #IMPLIED>\n";
    let options = ResolveOptions {
        detail_field: "value".to_string(),
    };
    let output = convert(input, "price", &options)
        .unwrap()
        .column
        .unwrap()
        .to_json()
        .unwrap();
    assert_eq!(
        output,
        r#"{"name":"price","type":"RECORD","mode":"REQUIRED","fields":[{"name":"currency","type":"STRING","mode":"NULLABLE"},{"name":"value","type":"STRING","mode":"REQUIRED"}]}"#
    );
}

#[test]
fn snapshot_entity_substitution() {
    let input = r#"
<!ENTITY % people "author | editor">
<!ELEMENT credits ((%people;)+, year?)>
<!ELEMENT author (#PCDATA)>
<!ELEMENT editor (#PCDATA)>
<!ELEMENT year (#PCDATA)>
<!ATTLIST year calendar (gregorian | julian) #IMPLIED>
"#;
    assert_eq!(
        to_json(input, "credits"),
        r#"{"name":"credits","type":"RECORD","mode":"NULLABLE","fields":[{"name":"author","type":"STRING","mode":"REPEATED"},{"name":"editor","type":"STRING","mode":"REPEATED"},{"name":"year","type":"RECORD","mode":"NULLABLE","fields":[{"name":"calendar","type":"STRING","mode":"NULLABLE"},{"name":"detail","type":"STRING","mode":"REQUIRED"}]}]}"#
    );
}

#[test]
fn snapshot_output_tree_round_trips_through_serde() {
    let input = "<!ELEMENT root (a, b*)>\n<!ELEMENT a (#PCDATA)>\n<!ELEMENT b EMPTY>\n";
    let column = convert(input, "root", &ResolveOptions::default())
        .unwrap()
        .column
        .unwrap();
    let parsed: SchemaField = serde_json::from_str(&column.to_json().unwrap()).unwrap();
    assert_eq!(parsed, column.to_output_tree());
    assert_eq!(parsed.fields.map(|f| f.len()), Some(2));
}
