//! Relation inference over a set of schema descriptors.
//!
//! Resolution is two-phase so that mutually referencing and self referencing
//! types need no forward declarations:
//!
//! 1. Every descriptor gets a slot in an arena, addressed by [`SchemaId`].
//! 2. Reference attributes are rewritten to point at arena slots, then each
//!    type's outgoing relations (with inferred reciprocals) are computed once
//!    and cached.
//!
//! The result is an immutable [`ResolvedSchemaSet`] that is passed explicitly
//! to every component needing schema knowledge.

use std::collections::HashMap;
use std::sync::Arc;

use normstore_foundation::{EntityId, Error, ErrorContext, Record, Result, Value};
use tracing::{debug, warn};

use crate::descriptor::{AttributeSpec, SchemaDescriptor, SchemaOptions};

/// Index of a resolved schema inside its [`ResolvedSchemaSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// An outgoing relation of a resolved schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    /// Target type name.
    pub to: String,
    /// Attribute on the source type holding the reference.
    pub through: String,
    /// Reciprocal attribute on the target type, if one points back.
    pub foreign: Option<String>,
    /// Whether the source holds a sequence of ids.
    pub is_many: bool,
}

/// A reference attribute linked to its target slot.
#[derive(Clone, Debug)]
struct Reference {
    through: String,
    target: SchemaId,
    is_many: bool,
    inverse: Option<String>,
}

#[derive(Debug)]
struct SchemaNode {
    name: String,
    options: SchemaOptions,
    attributes: Vec<(String, AttributeSpec)>,
    references: Vec<Reference>,
    relations: Vec<Relation>,
}

#[derive(Debug)]
struct Arena {
    nodes: Vec<SchemaNode>,
    by_name: HashMap<String, SchemaId>,
}

/// Immutable graph of resolved schemas.
///
/// Clone is O(1); all clones share one arena.
#[derive(Clone, Debug)]
pub struct ResolvedSchemaSet {
    arena: Arc<Arena>,
}

/// Resolves a set of descriptors into a schema graph.
///
/// # Errors
///
/// - [`InvalidSchemas`](normstore_foundation::ErrorKind::InvalidSchemas) if
///   the set is empty.
/// - [`InvalidSchema`](normstore_foundation::ErrorKind::InvalidSchema) if a
///   descriptor has no name, a name is declared twice, an attribute name is
///   empty, a reference targets an undeclared type, an explicit inverse
///   does not reference back to its source, or two explicit inverses pair
///   one attribute with different partners.
///
/// An explicit inverse pairs both ends: the named attribute gets the
/// declaring attribute as its reciprocal even if it declares nothing itself.
pub fn resolve<I>(descriptors: I) -> Result<ResolvedSchemaSet>
where
    I: IntoIterator<Item = SchemaDescriptor>,
{
    let descriptors: Vec<SchemaDescriptor> = descriptors.into_iter().collect();
    if descriptors.is_empty() {
        return Err(Error::invalid_schemas("schema set is empty"));
    }

    // Phase 1: allocate a slot per name.
    let mut by_name = HashMap::with_capacity(descriptors.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        if descriptor.name.is_empty() {
            return Err(Error::invalid_schema(format!(
                "schema #{index} is missing a name"
            )));
        }
        if by_name
            .insert(descriptor.name.clone(), SchemaId(index))
            .is_some()
        {
            return Err(Error::invalid_schema("schema declared more than once")
                .with_context(ErrorContext::new().with_schema(&descriptor.name)));
        }
    }

    // Phase 2: link reference attributes to slots.
    let mut nodes = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let references = link_references(&descriptor, &by_name)?;
        nodes.push(SchemaNode {
            name: descriptor.name,
            options: descriptor.options,
            attributes: descriptor.attributes,
            references,
            relations: Vec::new(),
        });
    }

    // Phase 3: pair explicit inverses, infer the rest, and cache relations.
    let all_relations: Vec<Vec<Relation>> = {
        let pairs = explicit_pairs(&nodes)?;
        nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                node.references
                    .iter()
                    .map(|reference| build_relation(&nodes, &pairs, SchemaId(index), reference))
                    .collect()
            })
            .collect()
    };
    for (node, relations) in nodes.iter_mut().zip(all_relations) {
        node.relations = relations;
    }

    debug!(schemas = nodes.len(), "resolved schema set");

    Ok(ResolvedSchemaSet {
        arena: Arc::new(Arena { nodes, by_name }),
    })
}

fn link_references(
    descriptor: &SchemaDescriptor,
    by_name: &HashMap<String, SchemaId>,
) -> Result<Vec<Reference>> {
    let mut references = Vec::new();
    for (attribute, spec) in &descriptor.attributes {
        if attribute.is_empty() {
            return Err(Error::invalid_schema("attribute name is empty")
                .with_context(ErrorContext::new().with_schema(&descriptor.name)));
        }
        let Some(target_name) = spec.target() else {
            continue;
        };
        let target = by_name.get(target_name).copied().ok_or_else(|| {
            Error::invalid_schema(format!("unknown relation target: {target_name}")).with_context(
                ErrorContext::new()
                    .with_schema(&descriptor.name)
                    .with_attribute(attribute),
            )
        })?;
        references.push(Reference {
            through: attribute.clone(),
            target,
            is_many: spec.is_many(),
            inverse: spec.explicit_inverse().map(str::to_string),
        });
    }
    Ok(references)
}

/// Reference slots `(schema, attribute)` paired by an explicit inverse,
/// recorded in both directions.
type Pairs<'a> = HashMap<(SchemaId, &'a str), (SchemaId, &'a str)>;

fn explicit_pairs(nodes: &[SchemaNode]) -> Result<Pairs<'_>> {
    let mut pairs = Pairs::new();
    for (index, node) in nodes.iter().enumerate() {
        let source = SchemaId(index);
        for reference in &node.references {
            let Some(inverse) = reference.inverse.as_deref() else {
                continue;
            };
            let at = || {
                ErrorContext::new()
                    .with_schema(&node.name)
                    .with_attribute(&reference.through)
            };
            let target_node = &nodes[reference.target.0];
            let points_back = target_node
                .references
                .iter()
                .any(|r| r.through == inverse && r.target == source);
            if !points_back {
                return Err(Error::invalid_schema(format!(
                    "inverse {}.{inverse} does not reference {}",
                    target_node.name, node.name
                ))
                .with_context(at()));
            }

            let here = (source, reference.through.as_str());
            let there = (reference.target, inverse);
            for (from, to) in [(here, there), (there, here)] {
                match pairs.insert(from, to) {
                    Some(previous) if previous != to => {
                        return Err(Error::invalid_schema(format!(
                            "{}.{} is declared the inverse of both {}.{} and {}.{}",
                            nodes[from.0.0].name,
                            from.1,
                            nodes[previous.0.0].name,
                            previous.1,
                            nodes[to.0.0].name,
                            to.1
                        ))
                        .with_context(at()));
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(pairs)
}

fn build_relation(
    nodes: &[SchemaNode],
    pairs: &Pairs<'_>,
    source: SchemaId,
    reference: &Reference,
) -> Relation {
    let source_node = &nodes[source.0];
    let target_node = &nodes[reference.target.0];

    let foreign = if let Some((_, paired)) = pairs.get(&(source, reference.through.as_str())) {
        Some((*paired).to_string())
    } else {
        // Slots already paired with another attribute are not candidates.
        let mut candidates = target_node.references.iter().filter(|r| {
            r.target == source && !pairs.contains_key(&(reference.target, r.through.as_str()))
        });
        let first = candidates.next().map(|r| r.through.clone());
        if first.is_some() && candidates.next().is_some() {
            warn!(
                schema = %source_node.name,
                attribute = %reference.through,
                target = %target_node.name,
                chosen = ?first,
                "ambiguous reciprocal relation, taking first match"
            );
        }
        first
    };

    Relation {
        to: target_node.name.clone(),
        through: reference.through.clone(),
        foreign,
        is_many: reference.is_many,
    }
}

impl ResolvedSchemaSet {
    /// Returns the schema with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ResolvedSchema<'_>> {
        self.arena
            .by_name
            .get(name)
            .map(|&id| ResolvedSchema { set: self, id })
    }

    /// Returns the schema with the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidInput`](normstore_foundation::ErrorKind::InvalidInput)
    /// error if no schema has that name.
    pub fn require(&self, name: &str) -> Result<ResolvedSchema<'_>> {
        self.get(name)
            .ok_or_else(|| Error::invalid_input(format!("unknown schema: {name}")))
    }

    /// Returns the schema stored at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was produced by a different set.
    #[must_use]
    pub fn by_id(&self, id: SchemaId) -> ResolvedSchema<'_> {
        assert!(id.0 < self.arena.nodes.len(), "schema id out of range");
        ResolvedSchema { set: self, id }
    }

    /// Returns the number of schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.nodes.len()
    }

    /// Returns true if the set has no schemas. Never true for a resolved set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.nodes.is_empty()
    }

    /// Returns true if a schema with that name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.arena.by_name.contains_key(name)
    }

    /// Iterates schemas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = ResolvedSchema<'_>> {
        (0..self.arena.nodes.len()).map(|i| ResolvedSchema {
            set: self,
            id: SchemaId(i),
        })
    }

    /// Iterates schema names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arena.nodes.iter().map(|n| n.name.as_str())
    }

    fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.arena.nodes[id.0]
    }
}

/// Borrowed view of one resolved schema.
#[derive(Clone, Copy)]
pub struct ResolvedSchema<'a> {
    set: &'a ResolvedSchemaSet,
    id: SchemaId,
}

impl<'a> ResolvedSchema<'a> {
    fn node(&self) -> &'a SchemaNode {
        self.set.node(self.id)
    }

    /// Returns the arena id.
    #[must_use]
    pub fn id(&self) -> SchemaId {
        self.id
    }

    /// Returns the set this schema belongs to.
    #[must_use]
    pub fn set(&self) -> &'a ResolvedSchemaSet {
        self.set
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    /// Returns the key under which this type's slice is stored.
    #[must_use]
    pub fn key(&self) -> &'a str {
        self.name()
    }

    /// Returns the per-type options.
    #[must_use]
    pub fn options(&self) -> &'a SchemaOptions {
        &self.node().options
    }

    /// Returns the attribute holding the primary key in raw documents.
    #[must_use]
    pub fn id_attribute(&self) -> &'a str {
        &self.node().options.id_attribute
    }

    /// Returns the attribute declarations in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &'a [(String, AttributeSpec)] {
        &self.node().attributes
    }

    /// Returns an attribute declaration by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&'a AttributeSpec> {
        self.attributes()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    /// Returns the outgoing relations, one per reference attribute.
    #[must_use]
    pub fn relations(&self) -> &'a [Relation] {
        &self.node().relations
    }

    /// Returns the relation held by `attribute`.
    #[must_use]
    pub fn relation(&self, attribute: &str) -> Option<&'a Relation> {
        self.relations().iter().find(|r| r.through == attribute)
    }

    /// Returns the target schema and multiplicity of a reference attribute.
    #[must_use]
    pub fn reference(&self, attribute: &str) -> Option<(ResolvedSchema<'a>, bool)> {
        self.node()
            .references
            .iter()
            .find(|r| r.through == attribute)
            .map(|r| (self.set.by_id(r.target), r.is_many))
    }

    /// Returns the declared default values of plain attributes.
    pub fn defaults(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.attributes().iter().filter_map(|(name, spec)| match spec {
            AttributeSpec::Plain {
                default: Some(value),
            } => Some((name.as_str(), value)),
            _ => None,
        })
    }

    /// Returns a record holding only the declared defaults.
    #[must_use]
    pub fn default_record(&self, id: impl Into<EntityId>) -> Record {
        Record::from_attributes(
            id,
            self.defaults().map(|(k, v)| (k.to_string(), v.clone())),
        )
    }

    /// Returns the names of computed attributes.
    pub fn computed_attributes(&self) -> impl Iterator<Item = &'a str> {
        self.attributes()
            .iter()
            .filter(|(_, spec)| spec.is_computed())
            .map(|(name, _)| name.as_str())
    }

    /// Evaluates a computed attribute against a record.
    ///
    /// Returns `None` if `attribute` is not a computed attribute.
    #[must_use]
    pub fn compute(&self, attribute: &str, record: &Record) -> Option<Value> {
        match self.attribute(attribute)? {
            AttributeSpec::Computed(f) => Some(f(record)),
            _ => None,
        }
    }
}

impl PartialEq for ResolvedSchema<'_> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.set.arena, &other.set.arena) && self.id == other.id
    }
}

impl Eq for ResolvedSchema<'_> {}

impl std::fmt::Debug for ResolvedSchema<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSchema")
            .field("name", &self.name())
            .field("relations", &self.relations())
            .finish()
    }
}
