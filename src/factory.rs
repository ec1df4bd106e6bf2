//! Find-or-create front end for populating a graph version.
//!
//! Repeated calls with the same parent chain, name and type return the
//! same item. The factory also owns the memoized sentinel types: the
//! wildcard `?`, the primitives, packages without a project and array
//! wrappers (memoized on the element type through `usedByArrayClass`).

use std::collections::HashMap;

use crate::error::GraphError;
use crate::index::ItemGraph;
use crate::types::{Flag, GraphItem, ItemId, ItemType, Relation, WILDCARD_TYPE_NAME};

/// Names accepted by [`ItemFactory::primitive`].
pub const PRIMITIVE_TYPES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Find-or-create access to a graph version.
pub struct ItemFactory<'g, G: ItemGraph> {
    graph: &'g mut G,
    wildcard: Option<ItemId>,
    primitives: HashMap<&'static str, ItemId>,
    orphan_packages: HashMap<String, ItemId>,
}

impl<'g, G: ItemGraph> ItemFactory<'g, G> {
    /// Wrap a version.
    pub fn new(graph: &'g mut G) -> Self {
        Self {
            graph,
            wildcard: None,
            primitives: HashMap::new(),
            orphan_packages: HashMap::new(),
        }
    }

    /// The wrapped version.
    pub fn graph(&self) -> &G {
        &*self.graph
    }

    /// The wrapped version, for edits the factory does not cover.
    pub fn graph_mut(&mut self) -> &mut G {
        &mut *self.graph
    }

    /// Memoized ID, if it still names a live item of the given name and type.
    fn live(&self, cached: Option<ItemId>, name: &str, item_type: ItemType) -> Option<ItemId> {
        cached.filter(|id| {
            self.graph
                .get(*id)
                .is_some_and(|node| node.item_type() == item_type && node.name() == name)
        })
    }

    /// Project named `name`.
    pub fn create_project(&mut self, name: &str) -> Result<ItemId, GraphError> {
        self.graph.create_item(None, name, ItemType::Project, true)
    }

    /// Package named `name`, under `project` when given.
    pub fn create_package(&mut self, project: Option<ItemId>, name: &str) -> Result<ItemId, GraphError> {
        if project.is_some() {
            return self.graph.create_item(project, name, ItemType::Package, true);
        }
        let cached = self.orphan_packages.get(name).copied();
        if let Some(id) = self.live(cached, name, ItemType::Package) {
            return Ok(id);
        }
        let id = self.graph.create_item(None, name, ItemType::Package, true)?;
        self.orphan_packages.insert(name.to_string(), id);
        Ok(id)
    }

    /// Class named `name` under a package, an enclosing class, or nothing.
    ///
    /// A class parent is also linked as the outer class.
    pub fn create_class(&mut self, parent: Option<ItemId>, name: &str) -> Result<ItemId, GraphError> {
        let id = self.graph.create_item(parent, name, ItemType::Class, true)?;
        if let Some(outer) = parent {
            let is_class = self
                .graph
                .get(outer)
                .is_some_and(|node| node.item_type() == ItemType::Class);
            if is_class {
                self.graph.link(id, Relation::OuterClass, outer)?;
            }
        }
        Ok(id)
    }

    /// Method of `class` with the given parameter types.
    ///
    /// Identity includes the exact parameter type IDs, so overloads stay
    /// distinct even when one of them takes the wildcard.
    pub fn create_method(&mut self, class: ItemId, name: &str, param_types: &[ItemId]) -> Result<ItemId, GraphError> {
        if let Some(existing) = self.graph.find_method_exact(Some(class), name, param_types) {
            return Ok(existing);
        }
        let id = self.graph.create_item(Some(class), name, ItemType::Method, false)?;
        for param in param_types {
            self.graph.link(id, Relation::ParamTypes, *param)?;
        }
        Ok(id)
    }

    /// Field of `class`.
    pub fn create_field(&mut self, class: ItemId, name: &str) -> Result<ItemId, GraphError> {
        self.graph.create_item(Some(class), name, ItemType::Field, true)
    }

    /// The wildcard type, matching any type in signature comparison.
    pub fn wildcard(&mut self) -> Result<ItemId, GraphError> {
        if let Some(id) = self.live(self.wildcard, WILDCARD_TYPE_NAME, ItemType::Class) {
            return Ok(id);
        }
        let id = self.binary_type(WILDCARD_TYPE_NAME)?;
        self.wildcard = Some(id);
        Ok(id)
    }

    /// Primitive type by name.
    pub fn primitive(&mut self, name: &str) -> Result<ItemId, GraphError> {
        let key = PRIMITIVE_TYPES
            .iter()
            .copied()
            .find(|p| *p == name)
            .ok_or_else(|| GraphError::UnknownPrimitive(name.to_string()))?;
        let cached = self.primitives.get(key).copied();
        if let Some(id) = self.live(cached, key, ItemType::Class) {
            return Ok(id);
        }
        let id = self.binary_type(key)?;
        self.primitives.insert(key, id);
        Ok(id)
    }

    fn binary_type(&mut self, name: &str) -> Result<ItemId, GraphError> {
        let id = self.graph.create_item(None, name, ItemType::Class, true)?;
        if let Some(links) = self.graph.links_mut(id) {
            links.set_flag(Flag::Binary, true);
        }
        Ok(id)
    }

    /// Array type of `dimensions` over `element`; the element itself for zero.
    pub fn array_of(&mut self, element: ItemId, dimensions: usize) -> Result<ItemId, GraphError> {
        let mut current = element;
        for _ in 0..dimensions {
            current = self.array_wrapper(current)?;
        }
        Ok(current)
    }

    fn array_wrapper(&mut self, element: ItemId) -> Result<ItemId, GraphError> {
        let node = self.graph.get(element).ok_or(GraphError::ItemNotFound(element))?;
        if let Some(existing) = node.links().used_by_array_class() {
            if self.graph.contains(existing) {
                return Ok(existing);
            }
        }
        let name = format!("{}[]", node.name());
        let parent = node.parent();
        let binary = node.flag(Flag::Binary);
        let third_party = node.flag(Flag::ThirdParty);

        let id = self.graph.create_item(parent, &name, ItemType::Class, false)?;
        self.graph.link(id, Relation::ArrayBaseClass, element)?;
        if let Some(links) = self.graph.links_mut(id) {
            links.set_flag(Flag::Binary, binary);
            links.set_flag(Flag::ThirdParty, third_party);
        }
        tracing::trace!(element = %element, array = %id, name = %name, "Created array type");
        Ok(id)
    }

    /// Resolve a class reference, falling back to the wildcard on a miss.
    pub fn resolve_class(&mut self, package: Option<ItemId>, name: &str) -> Result<ItemId, GraphError> {
        if let Some(id) = self.graph.find_class(package, name) {
            return Ok(id);
        }
        tracing::warn!(
            version = %self.graph.version(),
            package = ?package,
            class = %name,
            "Unresolved class reference, using wildcard"
        );
        self.wildcard()
    }
}
