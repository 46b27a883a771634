/// Per-declaration metadata, indexed by `DeclId`.
///
/// Filled by the declaration pre-pass before any statement is lowered, so calls and
/// `new` expressions can find parameter and return slots of callees declared later
/// in the unit.

use framec_language::ast::DeclId;

/// One parameter of a callable and the register the caller copies its argument into.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSlot {
    /// `None` for destructured parameters.
    pub name: Option<String>,
    pub slot: String,
}

/// A function, method or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    /// Script name inside the unit (`add`, `C_m`, `C_INIT`).
    pub script: String,
    /// Qualified path used by `invoke`.
    pub path: String,
    pub params: Vec<ParamSlot>,
    /// Register receiving the returned value, if the body returns one.
    pub return_slot: Option<String>,
}

impl Callable {
    pub fn param_slot(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
            .map(|p| p.slot.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub path: String,
    pub constructor: Option<DeclId>,
    /// `(field name, slot)` in declaration order.
    pub fields: Vec<(String, String)>,
}

impl ClassInfo {
    pub fn field_slot(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, slot)| slot.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclInfo {
    Callable(Callable),
    Class(ClassInfo),
}

#[derive(Debug, Default)]
pub struct DeclTable {
    entries: Vec<Option<DeclInfo>>,
}

impl DeclTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries and size the table for a unit with `count` declarations.
    pub fn reset(&mut self, count: u32) {
        self.entries.clear();
        self.entries.resize(count as usize, None);
    }

    pub fn insert(&mut self, id: DeclId, info: DeclInfo) {
        if id.index() >= self.entries.len() {
            self.entries.resize(id.index() + 1, None);
        }
        self.entries[id.index()] = Some(info);
    }

    pub fn get(&self, id: DeclId) -> Option<&DeclInfo> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: DeclId) -> bool {
        self.get(id).is_some()
    }

    pub fn callable(&self, id: DeclId) -> Option<&Callable> {
        match self.get(id) {
            Some(DeclInfo::Callable(callable)) => Some(callable),
            _ => None,
        }
    }

    pub fn class(&self, id: DeclId) -> Option<&ClassInfo> {
        match self.get(id) {
            Some(DeclInfo::Class(class)) => Some(class),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add() -> Callable {
        Callable {
            script: "add".to_string(),
            path: "main/add".to_string(),
            params: vec![
                ParamSlot { name: Some("a".to_string()), slot: "a_1".to_string() },
                ParamSlot { name: None, slot: "TS_2".to_string() },
            ],
            return_slot: Some("add_return_3".to_string()),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = DeclTable::new();
        table.reset(2);
        assert!(!table.contains(DeclId(0)));
        table.insert(DeclId(1), DeclInfo::Callable(add()));
        assert_eq!(table.callable(DeclId(1)).map(|c| c.path.as_str()), Some("main/add"));
        assert!(table.class(DeclId(1)).is_none());
        assert!(table.get(DeclId(7)).is_none());
    }

    #[test]
    fn test_insert_grows_table() {
        let mut table = DeclTable::new();
        table.insert(DeclId(5), DeclInfo::Callable(add()));
        assert!(table.contains(DeclId(5)));
        table.reset(0);
        assert!(!table.contains(DeclId(5)));
    }

    #[test]
    fn test_param_and_field_slots() {
        let callable = add();
        assert_eq!(callable.param_slot("a"), Some("a_1"));
        assert_eq!(callable.param_slot("b"), None);

        let class = ClassInfo {
            name: "C".to_string(),
            path: "main/C".to_string(),
            constructor: None,
            fields: vec![("value".to_string(), "C_value_4".to_string())],
        };
        assert_eq!(class.field_slot("value"), Some("C_value_4"));
        assert_eq!(class.field_slot("other"), None);
    }
}
