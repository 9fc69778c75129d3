//! Serialises an [`AnnotationStore`] back to THYME-ML.
//!
//! The output re-loads with [`load_annotations`](super::load_annotations):
//! entities and other relations are written as found, temporal links carry
//! their current endpoints plus `OriginalSource`/`OriginalTarget` when a
//! chain substitution took place.

use crate::annotation::{Annotation, CoreferenceChain, Entity, OtherRelation, Span, TemporalLink};
use crate::store::AnnotationStore;

const TEMPORAL_RELATIONS: &str = "TemporalRelations";
const COREF_CHAINS: &str = "CorefChains";
const TEMPORAL_ENTITIES: &str = "TemporalEntities";

/// Render every annotation of `store` as a THYME-ML document.
pub fn write_annotations(store: &AnnotationStore) -> String {
    let mut out = XmlOut::default();
    out.raw("<?xml version='1.0' encoding='UTF-8'?>");
    out.open("data");
    out.open("annotations");
    for annotation in store.iter() {
        match annotation {
            Annotation::Entity(entity) => write_entity(&mut out, entity),
            Annotation::CoreferenceChain(chain) => write_chain(&mut out, chain),
            Annotation::TemporalLink(link) => write_link(&mut out, link),
            Annotation::OtherRelation(relation) => write_other(&mut out, relation),
        }
    }
    out.close("annotations");
    out.close("data");
    out.finish()
}

fn write_entity(out: &mut XmlOut, entity: &Entity) {
    out.open("entity");
    out.leaf("id", entity.id.as_str());
    out.leaf("span", &Span::format_list(&entity.spans));
    out.leaf("type", entity.kind.label());
    out.leaf(
        "parentsType",
        entity.parents_type.as_deref().unwrap_or(TEMPORAL_ENTITIES),
    );
    out.properties(entity.properties.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    out.close("entity");
}

fn write_chain(out: &mut XmlOut, chain: &CoreferenceChain) {
    out.open("relation");
    out.leaf("id", chain.id.as_str());
    out.leaf("type", "Identical");
    out.leaf("parentsType", COREF_CHAINS);
    let mut properties = vec![("FirstInstance", chain.first_instance.as_str())];
    properties.extend(
        chain
            .coreferring
            .iter()
            .map(|id| ("Coreferring_String", id.as_str())),
    );
    out.properties(properties.into_iter());
    out.close("relation");
}

fn write_link(out: &mut XmlOut, link: &TemporalLink) {
    out.open("relation");
    out.leaf("id", link.id.as_str());
    out.leaf("type", link.link_type.kind_label());
    out.leaf("parentsType", TEMPORAL_RELATIONS);
    let mut properties = vec![
        ("Source", link.source.as_str()),
        ("Type", link.link_type.label()),
        ("Target", link.target.as_str()),
    ];
    if let Some(original) = &link.original_source {
        properties.push(("OriginalSource", original.as_str()));
    }
    if let Some(original) = &link.original_target {
        properties.push(("OriginalTarget", original.as_str()));
    }
    out.properties(properties.into_iter());
    out.close("relation");
}

fn write_other(out: &mut XmlOut, relation: &OtherRelation) {
    out.open("relation");
    out.leaf("id", relation.id.as_str());
    out.leaf("type", relation.kind.label());
    if let Some(parents_type) = &relation.parents_type {
        out.leaf("parentsType", parents_type);
    }
    out.properties(
        relation
            .properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );
    out.close("relation");
}

/// Tab-indented element writer.
#[derive(Default)]
struct XmlOut {
    buf: String,
    depth: usize,
}

impl XmlOut {
    fn raw(&mut self, line: &str) {
        for _ in 0..self.depth {
            self.buf.push('\t');
        }
        self.buf.push_str(line);
        self.buf.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.raw(&format!("<{}>", tag));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.raw(&format!("</{}>", tag));
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        self.raw(&format!("<{0}>{1}</{0}>", tag, escape(text)));
    }

    fn properties<'a>(&mut self, mut properties: impl Iterator<Item = (&'a str, &'a str)>) {
        match properties.next() {
            None => self.raw("<properties/>"),
            Some(first) => {
                self.open("properties");
                for (name, value) in std::iter::once(first).chain(properties) {
                    self.leaf(name, value);
                }
                self.close("properties");
            }
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{EntityKind, TlinkType};
    use crate::xml::load_annotations;

    fn sample_store() -> AnnotationStore {
        let mut store = AnnotationStore::new("doc");
        store
            .append(Annotation::Entity(Entity::new(
                "e1",
                EntityKind::Event,
                vec![Span::new(0, 7)],
            )))
            .unwrap();
        store
            .append(Annotation::Entity(Entity::new(
                "e2",
                EntityKind::Timex3,
                vec![Span::new(10, 12), Span::new(14, 20)],
            )))
            .unwrap();
        store
            .append(Annotation::CoreferenceChain(CoreferenceChain::new(
                "c1",
                "e1",
                vec!["e2".into()],
            )))
            .unwrap();
        let mut link = TemporalLink::tlink("r1", "c1", TlinkType::Before, "e2");
        link.original_source = Some("e1".into());
        store.append(Annotation::TemporalLink(link)).unwrap();
        store
    }

    #[test]
    fn test_write_annotations_layout() {
        let xml = write_annotations(&sample_store());
        insta::assert_snapshot!(xml, @r###"
        <?xml version='1.0' encoding='UTF-8'?>
        <data>
        	<annotations>
        		<entity>
        			<id>e1</id>
        			<span>0,7</span>
        			<type>EVENT</type>
        			<parentsType>TemporalEntities</parentsType>
        			<properties/>
        		</entity>
        		<entity>
        			<id>e2</id>
        			<span>10,12;14,20</span>
        			<type>TIMEX3</type>
        			<parentsType>TemporalEntities</parentsType>
        			<properties/>
        		</entity>
        		<relation>
        			<id>c1</id>
        			<type>Identical</type>
        			<parentsType>CorefChains</parentsType>
        			<properties>
        				<FirstInstance>e1</FirstInstance>
        				<Coreferring_String>e2</Coreferring_String>
        			</properties>
        		</relation>
        		<relation>
        			<id>r1</id>
        			<type>TLINK</type>
        			<parentsType>TemporalRelations</parentsType>
        			<properties>
        				<Source>c1</Source>
        				<Type>BEFORE</Type>
        				<Target>e2</Target>
        				<OriginalSource>e1</OriginalSource>
        			</properties>
        		</relation>
        	</annotations>
        </data>
        "###);
    }

    #[test]
    fn test_written_document_reloads() {
        let store = sample_store();
        let reloaded = load_annotations(&write_annotations(&store), "doc")
            .unwrap()
            .store;
        assert_eq!(reloaded.len(), store.len());
        let link = reloaded.link(&"r1".into()).unwrap();
        assert_eq!(link, store.link(&"r1".into()).unwrap());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn test_leaf_is_indented_and_escaped() {
        let mut out = XmlOut::default();
        out.open("properties");
        out.leaf("Type", "A&B");
        out.close("properties");
        assert_eq!(out.finish(), "<properties>\n\t<Type>A&amp;B</Type>\n</properties>\n");
    }
}
