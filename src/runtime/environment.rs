use std::collections::HashMap;
use std::fmt;

use crate::ast::{DeclId, Variable};
use crate::error::{Error, Result};
use crate::runtime::Value;

/// Host function callable from assertion trees
pub type HostFunction = Box<dyn FnMut(&[Value]) -> Value>;

/// First fake address handed out for `&variable`
const ADDRESS_BASE: u64 = 0x7ff0_0000;

/// Variable bindings and host functions for one program state
pub struct Environment {
    /// Values by declaration
    variables: HashMap<DeclId, Value>,
    /// Callable functions by name
    functions: HashMap<String, HostFunction>,
    /// Stable addresses of declarations whose address was taken
    addresses: HashMap<DeclId, u64>,
}

impl Environment {
    /// Creates an empty environment
    pub fn new() -> Self {
        Environment {
            variables: HashMap::new(),
            functions: HashMap::new(),
            addresses: HashMap::new(),
        }
    }

    /// Binds a declaration to a value
    pub fn define(&mut self, decl: DeclId, value: Value) {
        self.variables.insert(decl, value);
    }

    /// Builder form of [`Environment::define`]
    pub fn with_variable(mut self, decl: u32, value: Value) -> Self {
        self.define(DeclId(decl), value);
        self
    }

    /// Registers a host function
    pub fn define_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: FnMut(&[Value]) -> Value + 'static,
    {
        self.functions.insert(name.into(), Box::new(function));
    }

    /// Builder form of [`Environment::define_function`]
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: FnMut(&[Value]) -> Value + 'static,
    {
        self.define_function(name, function);
        self
    }

    /// Reads a variable
    pub fn get(&self, var: &Variable) -> Result<Value> {
        self.variables
            .get(&var.decl)
            .cloned()
            .ok_or_else(|| Error::UndefinedVariable {
                name: var.name.clone(),
            })
    }

    /// Calls a host function
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let function = self
            .functions
            .get_mut(name)
            .ok_or_else(|| Error::UndefinedFunction {
                name: name.to_string(),
            })?;
        Ok(function(args))
    }

    /// Address of a declaration, stable for the environment's lifetime
    pub fn address_of(&mut self, decl: DeclId) -> u64 {
        let next = ADDRESS_BASE + 8 * self.addresses.len() as u64;
        *self.addresses.entry(decl).or_insert(next)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("Environment")
            .field("variables", &self.variables)
            .field("functions", &functions)
            .field("addresses", &self.addresses)
            .finish()
    }
}
