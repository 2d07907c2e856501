//! Visibility layers
//!
//! A [`VisibilityTemplate`] is the compiled per-class layout of instance state:
//! one public layer, one protected layer and one private layer per class in the
//! chain. Each property name maps to exactly one slot, so a subtype method that
//! sees a property as public and a supertype method that sees it as protected
//! read and write the same storage. Which slots a caller may reach is decided by
//! its [`Scope`].
//!
//! With layering disabled every property lands in the public layer and all
//! access checks pass.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::member::{Accessor, MemberDescriptor, MemberKind, MemberTable, MemberValue, Visibility};
use crate::value::Value;
use crate::wrap::WrappedMethod;

/// Where an access originates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Outside any member of the class (public view)
    External,
    /// Inside a member declared by the class at this chain depth
    Member(usize),
    /// A trait object calling back into the instance it is mixed into
    Mixin,
}

impl Scope {
    /// Whether a member with this visibility, declared at `owner_depth`,
    /// is reachable from this scope
    pub fn permits(self, visibility: Visibility, owner_depth: usize) -> bool {
        match (visibility, self) {
            (Visibility::Public, _) => true,
            (Visibility::Protected, Scope::External) => false,
            (Visibility::Protected, Scope::Member(_) | Scope::Mixin) => true,
            (Visibility::Private, Scope::Member(depth)) => depth == owner_depth,
            (Visibility::Private, Scope::External | Scope::Mixin) => false,
        }
    }
}

/// Storage layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerId {
    /// Public layer
    Public,
    /// Protected layer
    Protected,
    /// Private layer of the class at this depth
    Private(usize),
}

/// Property names and defaults of one layer
#[derive(Debug, Clone, Default)]
pub struct LayerTemplate {
    names: Vec<String>,
    defaults: Vec<Value>,
}

impl LayerTemplate {
    fn push(&mut self, name: &str, default: Value) -> usize {
        self.names.push(name.to_string());
        self.defaults.push(default);
        self.names.len() - 1
    }

    /// Property names in slot order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the layer holds no slots
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn instantiate(&self) -> RefCell<Vec<Value>> {
        RefCell::new(self.defaults.iter().map(Value::fresh_copy).collect())
    }
}

/// Getter/setter pair bound to the class that declared it
#[derive(Debug)]
pub struct AccessorSlot {
    pub(crate) accessor: Accessor,
    pub(crate) owner_depth: usize,
}

/// How a property is stored
#[derive(Debug, Clone)]
pub enum SlotAccess {
    /// Plain field
    Field {
        /// Layer holding the value
        layer: LayerId,
        /// Index inside the layer
        index: usize,
    },
    /// Getter/setter
    Accessor(Rc<AccessorSlot>),
}

/// One instance property
#[derive(Debug, Clone)]
pub struct PropertySlot {
    /// Effective visibility (the most derived declaration's)
    pub visibility: Visibility,
    /// Depth of the most derived declaring class
    pub owner_depth: usize,
    /// Storage
    pub access: SlotAccess,
}

/// Compiled instance layout of one class
#[derive(Debug)]
pub struct VisibilityTemplate {
    layered: bool,
    public: LayerTemplate,
    protected: LayerTemplate,
    private: Vec<LayerTemplate>,
    properties: FxHashMap<String, PropertySlot>,
    methods: FxHashMap<String, Rc<WrappedMethod>>,
}

impl VisibilityTemplate {
    /// Lay out the instance properties of `table`'s whole chain
    ///
    /// For each property name the most derived declaration decides visibility
    /// and default value. `methods` is the finished instance method table.
    pub fn build(table: &MemberTable, methods: FxHashMap<String, Rc<WrappedMethod>>, layered: bool) -> Self {
        let mut order: Vec<(Rc<MemberDescriptor>, usize)> = Vec::new();
        let mut position: FxHashMap<&str, usize> = FxHashMap::default();

        for t in table.lineage() {
            for desc in t.members() {
                if !desc.is_instance() || desc.kind == MemberKind::Method {
                    continue;
                }
                match position.get(desc.name.as_str()) {
                    Some(&i) => order[i] = (Rc::clone(desc), t.depth()),
                    None => {
                        position.insert(desc.name.as_str(), order.len());
                        order.push((Rc::clone(desc), t.depth()));
                    }
                }
            }
        }

        let private_layers = if layered { table.depth() + 1 } else { 0 };
        let mut template = VisibilityTemplate {
            layered,
            public: LayerTemplate::default(),
            protected: LayerTemplate::default(),
            private: vec![LayerTemplate::default(); private_layers],
            properties: FxHashMap::default(),
            methods,
        };

        for (desc, depth) in order {
            let access = match &desc.value {
                MemberValue::Property(default) => {
                    let layer = match (layered, desc.visibility) {
                        (false, _) | (true, Visibility::Public) => LayerId::Public,
                        (true, Visibility::Protected) => LayerId::Protected,
                        (true, Visibility::Private) => LayerId::Private(depth),
                    };
                    let index = match template.layer_mut(layer) {
                        Some(target) => target.push(&desc.name, default.clone()),
                        None => continue,
                    };
                    SlotAccess::Field { layer, index }
                }
                MemberValue::Accessor(accessor) => SlotAccess::Accessor(Rc::new(AccessorSlot {
                    accessor: accessor.clone(),
                    owner_depth: depth,
                })),
                _ => continue,
            };

            template.properties.insert(
                desc.name.clone(),
                PropertySlot { visibility: desc.visibility, owner_depth: depth, access },
            );
        }

        template
    }

    /// Whether layers are enforced
    pub fn is_layered(&self) -> bool {
        self.layered
    }

    /// Access check honoring the layering flag
    pub fn permits(&self, scope: Scope, visibility: Visibility, owner_depth: usize) -> bool {
        !self.layered || scope.permits(visibility, owner_depth)
    }

    /// Property slot by name
    pub fn property(&self, name: &str) -> Option<&PropertySlot> {
        self.properties.get(name)
    }

    /// Instance method by name
    pub fn method(&self, name: &str) -> Option<&Rc<WrappedMethod>> {
        self.methods.get(name)
    }

    /// All instance methods
    pub fn methods(&self) -> impl Iterator<Item = (&str, &Rc<WrappedMethod>)> {
        self.methods.iter().map(|(name, method)| (name.as_str(), method))
    }

    /// Template of one layer
    pub fn layer(&self, layer: LayerId) -> Option<&LayerTemplate> {
        match layer {
            LayerId::Public => Some(&self.public),
            LayerId::Protected => Some(&self.protected),
            LayerId::Private(depth) => self.private.get(depth),
        }
    }

    fn layer_mut(&mut self, layer: LayerId) -> Option<&mut LayerTemplate> {
        match layer {
            LayerId::Public => Some(&mut self.public),
            LayerId::Protected => Some(&mut self.protected),
            LayerId::Private(depth) => self.private.get_mut(depth),
        }
    }

    /// Fresh per-instance state with defaults copied in
    pub fn instantiate(&self) -> InstanceState {
        InstanceState {
            public: self.public.instantiate(),
            protected: self.protected.instantiate(),
            private: self.private.iter().map(LayerTemplate::instantiate).collect(),
        }
    }
}

/// Per-instance property storage
#[derive(Debug)]
pub struct InstanceState {
    public: RefCell<Vec<Value>>,
    protected: RefCell<Vec<Value>>,
    private: Vec<RefCell<Vec<Value>>>,
}

impl InstanceState {
    fn layer(&self, layer: LayerId) -> Option<&RefCell<Vec<Value>>> {
        match layer {
            LayerId::Public => Some(&self.public),
            LayerId::Protected => Some(&self.protected),
            LayerId::Private(depth) => self.private.get(depth),
        }
    }

    /// Read a slot; missing slots read as undefined
    pub fn read(&self, layer: LayerId, index: usize) -> Value {
        self.layer(layer)
            .and_then(|values| values.borrow().get(index).cloned())
            .unwrap_or_default()
    }

    /// Write a slot; returns false if the slot does not exist
    pub fn write(&self, layer: LayerId, index: usize, value: Value) -> bool {
        let Some(values) = self.layer(layer) else {
            return false;
        };
        match values.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
