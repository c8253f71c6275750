use std::collections::HashMap;

use tracing::debug;

use crate::ast::{
    ElementAttributes, ElementDecl, EntityAvailability, EntityDecl, TopLevelDecl,
};

/// Declarations keyed by name. A later declaration of the same kind and name
/// replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    elements: HashMap<String, ElementDecl>,
    attributes: HashMap<String, ElementAttributes>,
    entities: HashMap<String, EntityDecl>,
    availabilities: HashMap<String, EntityAvailability>,
}

pub fn build_index(declarations: Vec<TopLevelDecl>) -> DeclarationIndex {
    let mut index = DeclarationIndex::default();
    for decl in declarations {
        index.insert(decl);
    }
    debug!(
        elements = index.elements.len(),
        attribute_lists = index.attributes.len(),
        entities = index.entities.len(),
        availabilities = index.availabilities.len(),
        "built declaration index"
    );
    index
}

impl DeclarationIndex {
    pub fn insert(&mut self, decl: TopLevelDecl) {
        match decl {
            TopLevelDecl::Element(e) => {
                self.elements.insert(e.name.clone(), e);
            }
            TopLevelDecl::Attributes(a) => {
                self.attributes.insert(a.element_name.clone(), a);
            }
            TopLevelDecl::Entity(e) => {
                self.entities.insert(e.entity_name.clone(), e);
            }
            TopLevelDecl::Availability(a) => {
                self.availabilities.insert(a.entity_name.clone(), a);
            }
        }
    }

    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    pub fn attributes(&self, element_name: &str) -> Option<&ElementAttributes> {
        self.attributes.get(element_name)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDecl> {
        self.entities.get(name)
    }

    pub fn availability(&self, name: &str) -> Option<&EntityAvailability> {
        self.availabilities.get(name)
    }
}
