use crate::ast::Variables;
use crate::error::{Error, Result};

/// Maps the free variables of a compiled expression to argument slots.
///
/// Slot `i` is read from `args[i]`, i.e. at byte offset `i * 8` of the
/// argument buffer handed to the generated code.
#[derive(Debug, Clone)]
pub struct RuntimeEnvironment {
    names: Vec<String>,
}

impl RuntimeEnvironment {
    pub fn new(names: &[String]) -> Self {
        Self {
            names: names.to_vec(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Fills an argument buffer by looking every slot's name up in `variables`.
    pub fn bind<V: Variables + ?Sized>(&self, variables: &V) -> Result<Vec<f64>> {
        self.names
            .iter()
            .map(|name| {
                variables
                    .get(name)
                    .ok_or_else(|| Error::VariableNotFound(name.clone()))
            })
            .collect()
    }
}
