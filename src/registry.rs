//! Signature registry and module library.
//!
//! [`SignatureRegistry`] enforces that every module type name has exactly one
//! shape within a circuit. [`ModuleLibrary`] maps type names to module
//! definitions, enabling configuration-driven simulator setup.
//!
//! # Example
//!
//! ```
//! use kairo::registry::{create_default_library, ModuleLibrary};
//!
//! let library = create_default_library().unwrap();
//! assert!(library.contains("and"));
//!
//! let adder = library.get("adder8").unwrap();
//! assert_eq!(adder.signature().outputs.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{CircuitError, CircuitResult};
use crate::module::ModuleDef;
use crate::signature::Signature;

/// Registry of module signatures, keyed by type name.
#[derive(Clone, Debug, Default)]
pub struct SignatureRegistry {
    signatures: BTreeMap<String, Arc<Signature>>,
}

impl SignatureRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signature.
    ///
    /// Fails with `DuplicateModuleName` if the name is already taken, even by
    /// an identical signature.
    pub fn register(&mut self, signature: Arc<Signature>) -> CircuitResult<()> {
        if self.signatures.contains_key(&signature.name) {
            return Err(CircuitError::DuplicateModuleName(signature.name.clone()));
        }
        tracing::debug!(module = %signature.name, "registered signature");
        self.signatures.insert(signature.name.clone(), signature);
        Ok(())
    }

    /// Registers a signature unless an identical one is already registered.
    ///
    /// This is what instantiation uses: instantiating the same module twice
    /// is fine, but two different shapes under one name are not.
    pub fn ensure(&mut self, signature: &Arc<Signature>) -> CircuitResult<()> {
        match self.signatures.get(&signature.name) {
            Some(existing) if existing.as_ref() == signature.as_ref() => Ok(()),
            Some(_) => Err(CircuitError::DuplicateModuleName(signature.name.clone())),
            None => self.register(Arc::clone(signature)),
        }
    }

    /// Returns a signature by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Signature>> {
        self.signatures.get(name)
    }

    /// Returns true if a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    /// Returns the number of registered signatures.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Iterates registered signatures in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Signature>> {
        self.signatures.values()
    }
}

/// A library of module definitions, keyed by type name.
#[derive(Clone, Default)]
pub struct ModuleLibrary {
    modules: BTreeMap<String, ModuleDef>,
}

impl ModuleLibrary {
    /// Creates a new empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition under its own name, replacing any previous entry.
    pub fn insert(&mut self, def: ModuleDef) {
        self.modules.insert(def.name().to_string(), def);
    }

    /// Returns a definition by type name.
    pub fn get(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.get(name)
    }

    /// Returns true if a type name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the library is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterates type names in order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.modules.keys()
    }

    /// Removes a definition.
    pub fn remove(&mut self, name: &str) -> bool {
        self.modules.remove(name).is_some()
    }
}

impl std::fmt::Debug for ModuleLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLibrary")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Creates a library with the built-in modules.
///
/// Includes:
/// - gates: `and`, `or`, `not`, `nand`, `nor`, `xor`, `xnor`, `buffer`
/// - arithmetic: `half_adder`, `full_adder`, `adder4`, `adder8`
/// - selection: `mux2`, `mux4x2`, `mux4x8`
/// - storage: `register8`, `sr_latch`
pub fn create_default_library() -> CircuitResult<ModuleLibrary> {
    use crate::library::{arith, gates, latch, mux, register};

    let mut library = ModuleLibrary::new();

    for op in gates::GateOp::ALL {
        library.insert(gates::gate(op)?);
    }

    library.insert(arith::half_adder()?);
    library.insert(arith::full_adder()?);
    library.insert(arith::ripple_adder(4)?);
    library.insert(arith::ripple_adder(8)?);

    library.insert(mux::mux2()?);
    library.insert(mux::mux4(2)?);
    library.insert(mux::mux4(8)?);

    library.insert(register::register(8)?);
    library.insert(latch::sr_latch()?);

    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str, width: usize) -> Arc<Signature> {
        Arc::new(
            Signature::builder(name)
                .input("a", width)
                .output("q", width)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_registry_basic() {
        let mut registry = SignatureRegistry::new();
        assert!(registry.is_empty());

        registry.register(sig("buf", 1)).unwrap();
        assert!(registry.contains("buf"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("buf").unwrap().inputs.len(), 1);
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = SignatureRegistry::new();
        registry.register(sig("buf", 1)).unwrap();

        let err = registry.register(sig("buf", 1)).unwrap_err();
        assert_eq!(err, CircuitError::DuplicateModuleName("buf".to_string()));
    }

    #[test]
    fn test_ensure_accepts_same_shape_only() {
        let mut registry = SignatureRegistry::new();
        registry.ensure(&sig("buf", 1)).unwrap();
        registry.ensure(&sig("buf", 1)).unwrap();
        assert_eq!(registry.len(), 1);

        let err = registry.ensure(&sig("buf", 2)).unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateModuleName(_)));
    }

    #[test]
    fn test_default_library() {
        let library = create_default_library().unwrap();

        for name in ["and", "or", "not", "nand", "nor", "xor", "xnor", "buffer"] {
            assert!(library.contains(name), "missing {name}");
        }
        assert!(library.contains("adder8"));
        assert!(library.contains("mux4x2"));
        assert!(library.contains("register8"));
        assert!(library.contains("sr_latch"));
        assert_eq!(library.len(), 17);
    }

    #[test]
    fn test_library_remove() {
        let mut library = create_default_library().unwrap();
        assert!(library.remove("xnor"));
        assert!(!library.contains("xnor"));
        assert!(!library.remove("xnor"));
    }
}
