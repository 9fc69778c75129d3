//! Mapping between THYME-ML XML elements and typed annotation records.

use serde::Serialize;

use crate::annotation::{
    AlinkType, Annotation, AnnotationId, CoreferenceChain, Entity, EntityKind, LinkType,
    OtherRelation, OtherRelationKind, Span, TemporalLink, TlinkType,
};
use crate::errors::{FormatError, FormatResult};
use crate::store::AnnotationStore;
use crate::xml::reader::{parse_document, Element};

/// A duplicate identifier that was renamed while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disambiguation {
    pub original: AnnotationId,
    pub stored_as: AnnotationId,
}

/// The outcome of loading one annotation file.
#[derive(Debug)]
pub struct LoadedAnnotations {
    pub store: AnnotationStore,
    pub renamed: Vec<Disambiguation>,
}

/// Parse a THYME-ML document into a fresh store named `document_name`.
///
/// Elements of `<data>` other than `<annotations>` (`<info>`, `<schema>`) are
/// ignored. A document without `<annotations>` yields an empty store.
pub fn load_annotations(xml: &str, document_name: &str) -> FormatResult<LoadedAnnotations> {
    let root = parse_document(xml)?;
    if root.tag != "data" {
        return Err(FormatError::UnexpectedElement {
            tag: root.tag,
            context: "document root",
        });
    }

    let mut store = AnnotationStore::new(document_name);
    let mut renamed = Vec::new();

    if let Some(annotations) = root.child("annotations") {
        for element in &annotations.children {
            let annotation = match element.tag.as_str() {
                "entity" => Annotation::Entity(parse_entity(element)?),
                "relation" => parse_relation(element)?,
                _ => {
                    return Err(FormatError::UnexpectedElement {
                        tag: element.tag.clone(),
                        context: "<annotations>",
                    })
                }
            };
            let original = annotation.id().clone();
            let stored_as = store.insert_disambiguated(annotation);
            if stored_as != original {
                renamed.push(Disambiguation {
                    original,
                    stored_as,
                });
            }
        }
    }

    log::debug!(
        "{}: loaded {} annotations ({} renamed)",
        document_name,
        store.len(),
        renamed.len()
    );

    Ok(LoadedAnnotations { store, renamed })
}

fn required_text<'a>(element: &'a Element, tag: &str, id: &str) -> FormatResult<&'a str> {
    element
        .child_text(tag)
        .ok_or_else(|| FormatError::MissingProperty {
            id: id.to_string(),
            property: tag.to_string(),
        })
}

fn parse_entity(element: &Element) -> FormatResult<Entity> {
    let id = element
        .child_text("id")
        .ok_or_else(|| FormatError::MissingProperty {
            id: format!("<entity> at line {}", element.line),
            property: "id".to_string(),
        })?;
    let kind: EntityKind = required_text(element, "type", id)?.parse()?;
    let spans = match element.child_text("span") {
        Some(text) => Span::parse_list(text)?,
        None => Vec::new(),
    };

    Ok(Entity {
        id: id.into(),
        kind,
        spans,
        parents_type: element.child_text("parentsType").map(str::to_string),
        properties: property_list(element),
    })
}

fn parse_relation(element: &Element) -> FormatResult<Annotation> {
    let id = element
        .child_text("id")
        .ok_or_else(|| FormatError::MissingProperty {
            id: format!("<relation> at line {}", element.line),
            property: "id".to_string(),
        })?;
    let kind = required_text(element, "type", id)?;
    let properties = element.child("properties");
    let property = |name: &str| -> FormatResult<AnnotationId> {
        properties
            .and_then(|p| p.child_text(name))
            .map(AnnotationId::from)
            .ok_or_else(|| FormatError::MissingProperty {
                id: id.to_string(),
                property: name.to_string(),
            })
    };
    let optional = |name: &str| properties.and_then(|p| p.child_text(name)).map(AnnotationId::from);

    match kind {
        "TLINK" | "ALINK" => {
            let ty = property("Type")?;
            let link_type = if kind == "TLINK" {
                LinkType::Tlink(ty.as_str().parse::<TlinkType>()?)
            } else {
                LinkType::Alink(ty.as_str().parse::<AlinkType>()?)
            };
            Ok(Annotation::TemporalLink(TemporalLink {
                id: id.into(),
                source: property("Source")?,
                target: property("Target")?,
                link_type,
                original_source: optional("OriginalSource"),
                original_target: optional("OriginalTarget"),
                derived_from: None,
            }))
        }
        "Identical" => {
            let coreferring = properties
                .map(|p| {
                    p.children_named("Coreferring_String")
                        .map(|e| e.text.trim())
                        .filter(|text| !text.is_empty())
                        .map(AnnotationId::from)
                        .collect()
                })
                .unwrap_or_default();
            Ok(Annotation::CoreferenceChain(CoreferenceChain::new(
                id,
                property("FirstInstance")?,
                coreferring,
            )))
        }
        other => match OtherRelationKind::from_label(other) {
            Some(kind) => Ok(Annotation::OtherRelation(OtherRelation {
                id: id.into(),
                kind,
                parents_type: element.child_text("parentsType").map(str::to_string),
                properties: property_list(element),
            })),
            None => Err(FormatError::UnknownRelationKind {
                kind: other.to_string(),
            }),
        },
    }
}

fn property_list(element: &Element) -> Vec<(String, String)> {
    element
        .child("properties")
        .map(|p| {
            p.children
                .iter()
                .map(|child| (child.tag.clone(), child.text.trim().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<data>
<info><savetime>10:00:00 01-01-2015</savetime></info>
<schema path="./" protocol="file">temporal.schema.xml</schema>
<annotations>
  <entity>
    <id>1@e@doc@gold</id>
    <span>0,10</span>
    <type>DOCTIME</type>
    <parentsType>TemporalEntities</parentsType>
    <properties/>
  </entity>
  <entity>
    <id>2@e@doc@gold</id>
    <span>20,27;30,34</span>
    <type>EVENT</type>
    <parentsType>TemporalEntities</parentsType>
    <properties><DocTimeRel>BEFORE</DocTimeRel></properties>
  </entity>
  <entity>
    <id>3@e@doc@gold</id>
    <span>40,47</span>
    <type>EVENT</type>
  </entity>
  <relation>
    <id>1@r@doc@gold</id>
    <type>TLINK</type>
    <parentsType>TemporalRelations</parentsType>
    <properties>
      <Source>2@e@doc@gold</Source>
      <Type>BEFORE</Type>
      <Target>3@e@doc@gold</Target>
    </properties>
  </relation>
  <relation>
    <id>2@r@doc@gold</id>
    <type>Identical</type>
    <parentsType>CorefChains</parentsType>
    <properties>
      <FirstInstance>2@e@doc@gold</FirstInstance>
      <Coreferring_String>3@e@doc@gold</Coreferring_String>
    </properties>
  </relation>
  <relation>
    <id>3@r@doc@gold</id>
    <type>Whole/Part</type>
    <parentsType>CorefChains</parentsType>
    <properties>
      <Whole>2@e@doc@gold</Whole>
      <Part>3@e@doc@gold</Part>
    </properties>
  </relation>
</annotations>
</data>
"#;

    #[test]
    fn test_load_sample() {
        let loaded = load_annotations(SAMPLE, "doc").unwrap();
        let store = loaded.store;
        assert_eq!(store.len(), 6);
        assert!(loaded.renamed.is_empty());

        let event = store.resolve(&"2@e@doc@gold".into()).unwrap().as_entity().unwrap();
        assert_eq!(event.kind, EntityKind::Event);
        assert_eq!(event.spans, vec![Span::new(20, 27), Span::new(30, 34)]);
        assert_eq!(
            event.properties,
            vec![("DocTimeRel".to_string(), "BEFORE".to_string())]
        );

        let link = store.link(&"1@r@doc@gold".into()).unwrap();
        assert_eq!(link.tlink_type(), Some(TlinkType::Before));

        let chain = store.chains().next().unwrap();
        assert_eq!(chain.members().count(), 2);

        assert_eq!(
            store
                .iter_kind(AnnotationKind::Other(OtherRelationKind::WholePart))
                .count(),
            1
        );
    }

    #[test]
    fn test_duplicate_ids_are_renamed() {
        let xml = "<data><annotations>\
            <entity><id>e1</id><span>0,1</span><type>EVENT</type></entity>\
            <entity><id>e1</id><span>2,3</span><type>EVENT</type></entity>\
            </annotations></data>";
        let loaded = load_annotations(xml, "doc").unwrap();
        assert_eq!(loaded.store.len(), 2);
        assert_eq!(
            loaded.renamed,
            vec![Disambiguation {
                original: "e1".into(),
                stored_as: "e1(d)".into(),
            }]
        );
    }

    #[test]
    fn test_unknown_entity_kind_is_format_error() {
        let xml = "<data><annotations>\
            <entity><id>e1</id><span>0,1</span><type>WIDGET</type></entity>\
            </annotations></data>";
        assert!(matches!(
            load_annotations(xml, "doc"),
            Err(FormatError::UnknownEntityKind { .. })
        ));
    }

    #[test]
    fn test_unknown_relation_kind_is_format_error() {
        let xml = "<data><annotations>\
            <relation><id>r1</id><type>CAUSES</type><properties/></relation>\
            </annotations></data>";
        assert!(matches!(
            load_annotations(xml, "doc"),
            Err(FormatError::UnknownRelationKind { .. })
        ));
    }

    #[test]
    fn test_unknown_tlink_type_is_format_error() {
        let xml = "<data><annotations>\
            <relation><id>r1</id><type>TLINK</type><properties>\
            <Source>a</Source><Type>AFTER</Type><Target>b</Target>\
            </properties></relation></annotations></data>";
        assert!(matches!(
            load_annotations(xml, "doc"),
            Err(FormatError::UnknownLinkType { .. })
        ));
    }

    #[test]
    fn test_missing_target_is_format_error() {
        let xml = "<data><annotations>\
            <relation><id>r1</id><type>TLINK</type><properties>\
            <Source>a</Source><Type>BEFORE</Type>\
            </properties></relation></annotations></data>";
        match load_annotations(xml, "doc") {
            Err(FormatError::MissingProperty { id, property }) => {
                assert_eq!(id, "r1");
                assert_eq!(property, "Target");
            }
            other => panic!("unexpected result: {:?}", other.map(|l| l.store.len())),
        }
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        assert!(matches!(
            load_annotations("<annotations/>", "doc"),
            Err(FormatError::UnexpectedElement { .. })
        ));
    }

    #[test]
    fn test_document_without_annotations_is_empty() {
        let loaded = load_annotations("<data><info/></data>", "doc").unwrap();
        assert!(loaded.store.is_empty());
    }
}
