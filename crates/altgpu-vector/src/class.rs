//! Registration of the vector classes with the host environment.
//!
//! Each element kind is exposed to the host as a distinct named class,
//! registered once at load time. The class name is derived from the kind
//! (`altvec_integer`, `altvec_real`) and namespaced by [`PACKAGE_NAME`].

use std::error::Error;
use std::fmt;

use altgpu_core::{debug_trace, ElementKind};
use indexmap::IndexMap;

/// Package identifier the classes are registered under.
pub const PACKAGE_NAME: &str = "altgpu";

/// Tag shared by every virtual vector class name.
const CLASS_TAG: &str = "altvec";

/// Host class name for an element kind.
pub fn class_name(kind: ElementKind) -> String {
    format!("{CLASS_TAG}_{}", kind.name())
}

/// Whether a host class name belongs to a virtual vector class.
pub fn is_virtual_vector_class(name: &str) -> bool {
    name.contains(CLASS_TAG)
}

/// Protocol methods a registered class answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolMethod {
    /// Logical length.
    Length,
    /// Diagnostic inspection.
    Inspect,
    /// Read-only materialization that may yield null.
    DataptrOrNull,
    /// Full materialization.
    Dataptr,
    /// Single-element read.
    Elt,
    /// Bulk region read.
    GetRegion,
}

impl ProtocolMethod {
    /// Every method, in the order they are wired up.
    pub const ALL: [ProtocolMethod; 6] = [
        ProtocolMethod::Length,
        ProtocolMethod::Inspect,
        ProtocolMethod::DataptrOrNull,
        ProtocolMethod::Dataptr,
        ProtocolMethod::Elt,
        ProtocolMethod::GetRegion,
    ];
}

/// Everything the host needs to register one vector class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDescriptor {
    /// Class name, e.g. `altvec_real`.
    pub name: String,
    /// Package the class belongs to.
    pub package: &'static str,
    /// Element kind of instances.
    pub kind: ElementKind,
    /// Protocol methods the class implements.
    pub methods: &'static [ProtocolMethod],
}

impl ClassDescriptor {
    /// Descriptor for an element kind.
    pub fn for_kind(kind: ElementKind) -> Self {
        Self {
            name: class_name(kind),
            package: PACKAGE_NAME,
            kind,
            methods: &ProtocolMethod::ALL,
        }
    }
}

/// Opaque identifier the host assigns to a registered class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// Registration failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    /// A class with this name is already registered.
    Duplicate {
        /// The conflicting class name.
        name: String,
    },
    /// The host refused the class.
    Rejected {
        /// Host-provided description.
        reason: String,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { name } => write!(f, "class '{name}' is already registered"),
            Self::Rejected { reason } => write!(f, "class registration rejected: {reason}"),
        }
    }
}

impl Error for RegistrationError {}

/// The host environment's class registration mechanism.
pub trait ClassRegistrar {
    /// Register one class and return its host identifier.
    fn register_class(&mut self, descriptor: &ClassDescriptor)
        -> Result<ClassId, RegistrationError>;
}

/// Register the class for every element kind, in [`ElementKind::ALL`] order.
pub fn register_classes(
    registrar: &mut dyn ClassRegistrar,
) -> Result<Vec<ClassId>, RegistrationError> {
    ElementKind::ALL
        .iter()
        .map(|&kind| {
            let descriptor = ClassDescriptor::for_kind(kind);
            debug_trace!(
                "[register_classes] creating class '{}' in package '{}'",
                descriptor.name,
                descriptor.package
            );
            let id = registrar.register_class(&descriptor)?;
            debug_trace!("[register_classes] '{}' registered as {id:?}", descriptor.name);
            Ok(id)
        })
        .collect()
}

/// In-process class table, keyed by class name in registration order.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassDescriptor>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a class by name.
    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    /// Look up a class by identifier.
    pub fn get_by_id(&self, id: ClassId) -> Option<&ClassDescriptor> {
        self.classes.get_index(id.0 as usize).map(|(_, d)| d)
    }

    /// Identifier of the class registered for `kind`, if any.
    pub fn id_for_kind(&self, kind: ElementKind) -> Option<ClassId> {
        self.classes
            .get_index_of(&class_name(kind))
            .map(|i| ClassId(i as u32))
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassRegistrar for ClassRegistry {
    fn register_class(
        &mut self,
        descriptor: &ClassDescriptor,
    ) -> Result<ClassId, RegistrationError> {
        if self.classes.contains_key(&descriptor.name) {
            return Err(RegistrationError::Duplicate {
                name: descriptor.name.clone(),
            });
        }
        let (index, _) = self
            .classes
            .insert_full(descriptor.name.clone(), descriptor.clone());
        Ok(ClassId(index as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_follow_kind() {
        assert_eq!(class_name(ElementKind::Integer), "altvec_integer");
        assert_eq!(class_name(ElementKind::Real), "altvec_real");
    }

    #[test]
    fn tag_detection() {
        assert!(is_virtual_vector_class("altvec_real"));
        assert!(!is_virtual_vector_class("compact_intseq"));
    }

    #[test]
    fn registers_both_kinds_in_order() {
        let mut registry = ClassRegistry::new();
        let ids = register_classes(&mut registry).unwrap();
        assert_eq!(ids, vec![ClassId(0), ClassId(1)]);
        assert_eq!(registry.len(), 2);

        let real = registry.get("altvec_real").unwrap();
        assert_eq!(real.kind, ElementKind::Real);
        assert_eq!(real.package, PACKAGE_NAME);
        assert_eq!(real.methods.len(), 6);
        assert_eq!(registry.id_for_kind(ElementKind::Real), Some(ClassId(1)));
        assert_eq!(
            registry.get_by_id(ClassId(0)).map(|d| d.kind),
            Some(ElementKind::Integer)
        );
    }

    #[test]
    fn second_registration_is_rejected() {
        let mut registry = ClassRegistry::new();
        register_classes(&mut registry).unwrap();
        let err = register_classes(&mut registry).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::Duplicate {
                name: "altvec_integer".into()
            }
        );
        assert_eq!(registry.len(), 2);
    }
}
