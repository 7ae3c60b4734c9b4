use std::collections::HashMap;

use crate::scope::Scope;
use crate::transform::OperationKind;

pub const LAST_OPERATION_KEY: &str = "last-operation";
pub const LAST_SCOPE_KEY: &str = "last-scope";

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);

    fn last_scope(&self) -> Option<Scope> {
        self.get(LAST_SCOPE_KEY).and_then(|v| v.parse().ok())
    }

    fn last_operation(&self) -> Option<OperationKind> {
        self.get(LAST_OPERATION_KEY).and_then(|v| OperationKind::parse(&v))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}
