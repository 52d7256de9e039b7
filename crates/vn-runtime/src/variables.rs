use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;
use vn_core::{VarKind, VarValue, VariableRecord, VnError};

pub const DEFAULT_BANK: &str = "Default";

pub type VarGetter = Rc<dyn Fn() -> VarValue>;
pub type VarSetter = Rc<dyn Fn(&VarValue)>;

/// Whether a variable currently holding `current` may take an `incoming`
/// value. Strings always win, ints widen to floats, everything else must
/// keep its kind.
pub fn accepts_kind(current: VarKind, incoming: VarKind) -> bool {
    current == incoming
        || incoming == VarKind::String
        || (current == VarKind::Int && incoming == VarKind::Float)
}

/// Splits `bank.name` on the first dot. Unqualified names live in the
/// default bank.
pub fn split_qualified(qualified: &str) -> (String, String) {
    match qualified.split_once('.') {
        Some((bank, name)) => (bank.trim().to_string(), name.trim().to_string()),
        None => (DEFAULT_BANK.to_string(), qualified.trim().to_string()),
    }
}

#[derive(Clone)]
pub struct Variable {
    name: String,
    kind: VarKind,
    value: VarValue,
    getter: Option<VarGetter>,
    setter: Option<VarSetter>,
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("external", &self.is_external())
            .finish()
    }
}

impl Variable {
    pub fn new(name: impl Into<String>, value: VarValue) -> Self {
        Self {
            name: name.into(),
            kind: value.kind(),
            value,
            getter: None,
            setter: None,
        }
    }

    fn external(
        name: impl Into<String>,
        value: VarValue,
        getter: VarGetter,
        setter: Option<VarSetter>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: value.kind(),
            value,
            getter: Some(getter),
            setter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind the variable holds now. Bound variables report what the
    /// host returns, which may differ from the kind they were bound with.
    pub fn kind(&self) -> VarKind {
        match &self.getter {
            Some(getter) => getter().kind(),
            None => self.kind,
        }
    }

    pub fn is_external(&self) -> bool {
        self.getter.is_some()
    }

    pub fn value(&self) -> VarValue {
        match &self.getter {
            Some(getter) => getter(),
            None => self.value.clone(),
        }
    }

    pub fn assign(&mut self, value: VarValue) -> Result<(), VnError> {
        let incoming = value.kind();
        let current = self.kind();
        if !accepts_kind(current, incoming) {
            return Err(VnError::new(
                "VARIABLE_TYPE_CONFLICT",
                format!(
                    "Variable \"{}\" holds {} and cannot take {} value \"{}\".",
                    self.name, current, incoming, value
                ),
            ));
        }
        if let Some(setter) = &self.setter {
            setter(&value);
        }
        self.kind = incoming;
        self.value = value;
        Ok(())
    }

    fn record(&self, bank: &str) -> VariableRecord {
        let value = self.value();
        VariableRecord {
            bank: bank.to_string(),
            name: self.name.clone(),
            data_type: value.kind(),
            value: value.to_text(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableBank {
    name: String,
    variables: BTreeMap<String, Variable>,
}

impl VariableBank {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(&name.to_ascii_lowercase())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(&name.to_ascii_lowercase())
    }

    pub fn insert(&mut self, variable: Variable) {
        self.variables
            .insert(variable.name.to_ascii_lowercase(), variable);
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[derive(Clone)]
struct ExternalBinding {
    bank: String,
    name: String,
    getter: VarGetter,
    setter: Option<VarSetter>,
}

impl ExternalBinding {
    fn matches(&self, bank: &str, name: &str) -> bool {
        self.bank.eq_ignore_ascii_case(bank) && self.name.eq_ignore_ascii_case(name)
    }
}

/// Named banks of typed variables. Bank and variable names are
/// case-insensitive; the default bank always exists.
#[derive(Clone)]
pub struct VariableManager {
    banks: BTreeMap<String, VariableBank>,
    external: Vec<ExternalBinding>,
}

impl fmt::Debug for VariableManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableManager")
            .field("banks", &self.banks)
            .field("external", &self.external.len())
            .finish()
    }
}

impl Default for VariableManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableManager {
    pub fn new() -> Self {
        let mut manager = Self {
            banks: BTreeMap::new(),
            external: Vec::new(),
        };
        manager.create_bank(DEFAULT_BANK);
        manager
    }

    pub fn create_bank(&mut self, name: &str) -> &mut VariableBank {
        self.banks
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| VariableBank::new(name))
    }

    pub fn bank(&self, name: &str) -> Option<&VariableBank> {
        self.banks.get(&name.to_ascii_lowercase())
    }

    pub fn banks(&self) -> impl Iterator<Item = &VariableBank> {
        self.banks.values()
    }

    pub fn variable(&self, qualified: &str) -> Option<&Variable> {
        let (bank, name) = split_qualified(qualified);
        self.bank(&bank)?.get(&name)
    }

    pub fn get(&self, qualified: &str) -> Option<VarValue> {
        self.variable(qualified).map(Variable::value)
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.variable(qualified).is_some()
    }

    /// Creates the bank and variable on first use. Assignments that would
    /// change the kind against the widening rules fail with
    /// `VARIABLE_TYPE_CONFLICT` and leave the old value in place.
    pub fn set(&mut self, qualified: &str, value: VarValue) -> Result<(), VnError> {
        let (bank_name, name) = split_qualified(qualified);
        if name.is_empty() || bank_name.is_empty() {
            return Err(VnError::new(
                "VARIABLE_NAME_INVALID",
                format!("\"{}\" is not a valid variable name.", qualified),
            ));
        }
        let bank = self.create_bank(&bank_name);
        match bank.get_mut(&name) {
            Some(variable) => variable.assign(value),
            None => {
                bank.insert(Variable::new(name, value));
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, qualified: &str) -> bool {
        let (bank, name) = split_qualified(qualified);
        self.banks
            .get_mut(&bank.to_ascii_lowercase())
            .and_then(|bank| bank.remove(&name))
            .is_some()
    }

    /// Backs a variable with host-owned storage. The binding survives
    /// `load_records`, which pushes restored values through the setter.
    pub fn bind_external(
        &mut self,
        qualified: &str,
        getter: VarGetter,
        setter: Option<VarSetter>,
    ) -> Result<(), VnError> {
        let (bank, name) = split_qualified(qualified);
        if name.is_empty() || bank.is_empty() {
            return Err(VnError::new(
                "VARIABLE_NAME_INVALID",
                format!("\"{}\" is not a valid variable name.", qualified),
            ));
        }
        let value = getter();
        self.create_bank(&bank).insert(Variable::external(
            name.clone(),
            value,
            Rc::clone(&getter),
            setter.clone(),
        ));
        self.external
            .retain(|binding| !binding.matches(&bank, &name));
        self.external.push(ExternalBinding {
            bank,
            name,
            getter,
            setter,
        });
        Ok(())
    }

    pub fn records(&self) -> Vec<VariableRecord> {
        self.banks
            .values()
            .flat_map(|bank| bank.iter().map(|variable| variable.record(bank.name())))
            .collect()
    }

    /// Replaces every bank with the given records. Variables absent from
    /// the records are gone afterwards.
    pub fn load_records(&mut self, records: &[VariableRecord]) {
        self.banks.clear();
        self.create_bank(DEFAULT_BANK);

        for record in records {
            let value = VarValue::parse_as(record.data_type, &record.value).unwrap_or_else(|| {
                debug!(
                    bank = %record.bank,
                    name = %record.name,
                    kind = %record.data_type,
                    "variable record does not parse as its kind, keeping text"
                );
                VarValue::String(record.value.clone())
            });
            self.create_bank(&record.bank)
                .insert(Variable::new(record.name.clone(), value));
        }

        for binding in self.external.clone() {
            let bank = self.create_bank(&binding.bank);
            let value = match bank.get(&binding.name) {
                Some(restored) => {
                    let value = restored.value();
                    if let Some(setter) = &binding.setter {
                        setter(&value);
                    }
                    value
                }
                None => (binding.getter)(),
            };
            bank.insert(Variable::external(
                binding.name,
                value,
                binding.getter,
                binding.setter,
            ));
        }
    }
}

#[cfg(test)]
mod variables_tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn names_and_banks_are_case_insensitive() {
        let mut variables = VariableManager::new();
        variables
            .set("Player.Name", VarValue::String("Sam".to_string()))
            .expect("set");
        assert_eq!(
            variables.get("player.name"),
            Some(VarValue::String("Sam".to_string()))
        );
        assert_eq!(
            variables.bank("PLAYER").map(VariableBank::name),
            Some("Player")
        );
    }

    #[test]
    fn unqualified_names_use_default_bank() {
        let mut variables = VariableManager::new();
        variables.set("score", VarValue::Int(3)).expect("set");
        assert_eq!(variables.get("Default.score"), Some(VarValue::Int(3)));
        assert_eq!(split_qualified("a.b.c"), ("a".to_string(), "b.c".to_string()));
    }

    #[test]
    fn int_widens_to_float() {
        let mut variables = VariableManager::new();
        variables.set("x", VarValue::Int(1)).expect("set");
        variables.set("x", VarValue::Float(1.5)).expect("widen");
        assert_eq!(variables.variable("x").map(Variable::kind), Some(VarKind::Float));
    }

    #[test]
    fn float_rejects_int_and_keeps_value() {
        let mut variables = VariableManager::new();
        variables.set("x", VarValue::Float(1.5)).expect("set");
        let error = variables.set("x", VarValue::Int(2)).expect_err("narrowing");
        assert_eq!(error.code, "VARIABLE_TYPE_CONFLICT");
        assert_eq!(variables.get("x"), Some(VarValue::Float(1.5)));
        assert_eq!(variables.variable("x").map(Variable::kind), Some(VarKind::Float));
    }

    #[test]
    fn string_overrides_any_kind_but_bool_rejects_int() {
        let mut variables = VariableManager::new();
        variables.set("flag", VarValue::Bool(true)).expect("set");
        assert!(variables.set("flag", VarValue::Int(1)).is_err());
        variables
            .set("flag", VarValue::String("maybe".to_string()))
            .expect("string");
        assert_eq!(
            variables.variable("flag").map(Variable::kind),
            Some(VarKind::String)
        );
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut variables = VariableManager::new();
        assert!(variables.set("Bank.", VarValue::Int(1)).is_err());
        assert!(variables.set("  ", VarValue::Int(1)).is_err());
    }

    #[test]
    fn load_records_replaces_every_bank() {
        let mut variables = VariableManager::new();
        variables.set("keep", VarValue::Int(1)).expect("set");
        let records = variables.records();
        variables.set("Extra.later", VarValue::Bool(true)).expect("set");
        variables.set("keep", VarValue::Int(9)).expect("set");

        variables.load_records(&records);
        assert_eq!(variables.get("keep"), Some(VarValue::Int(1)));
        assert!(!variables.contains("Extra.later"));
        assert!(variables.bank("Extra").is_none());
        assert!(variables.bank(DEFAULT_BANK).is_some());
    }

    #[test]
    fn records_round_trip_kinds() {
        let mut variables = VariableManager::new();
        variables.set("f", VarValue::Float(2.0)).expect("set");
        variables
            .set("s", VarValue::String("42".to_string()))
            .expect("set");
        let records = variables.records();
        let mut restored = VariableManager::new();
        restored.load_records(&records);
        assert_eq!(restored.get("f"), Some(VarValue::Float(2.0)));
        assert_eq!(restored.get("s"), Some(VarValue::String("42".to_string())));
    }

    #[test]
    fn external_binding_reads_host_and_survives_reload() {
        let host = Rc::new(RefCell::new(VarValue::Int(10)));
        let reader = Rc::clone(&host);
        let writer = Rc::clone(&host);
        let mut variables = VariableManager::new();
        variables
            .bind_external(
                "Game.gold",
                Rc::new(move || reader.borrow().clone()),
                Some(Rc::new(move |value: &VarValue| {
                    *writer.borrow_mut() = value.clone();
                })),
            )
            .expect("bind");

        *host.borrow_mut() = VarValue::Int(25);
        assert_eq!(variables.get("game.gold"), Some(VarValue::Int(25)));
        let records = variables.records();

        variables.set("Game.gold", VarValue::Int(40)).expect("set");
        assert_eq!(*host.borrow(), VarValue::Int(40));

        variables.load_records(&records);
        assert_eq!(*host.borrow(), VarValue::Int(25));
        assert!(variables
            .variable("Game.gold")
            .is_some_and(Variable::is_external));
    }

    #[test]
    fn bound_variables_check_against_the_host_kind() {
        let host = Rc::new(RefCell::new(VarValue::Int(10)));
        let reader = Rc::clone(&host);
        let writer = Rc::clone(&host);
        let mut variables = VariableManager::new();
        variables
            .bind_external(
                "Game.rate",
                Rc::new(move || reader.borrow().clone()),
                Some(Rc::new(move |value: &VarValue| {
                    *writer.borrow_mut() = value.clone();
                })),
            )
            .expect("bind");

        *host.borrow_mut() = VarValue::Float(2.5);
        assert_eq!(
            variables.variable("Game.rate").map(Variable::kind),
            Some(VarKind::Float)
        );
        let error = variables
            .set("Game.rate", VarValue::Int(3))
            .expect_err("host now holds a float");
        assert_eq!(error.code, "VARIABLE_TYPE_CONFLICT");
        assert_eq!(*host.borrow(), VarValue::Float(2.5));

        variables.set("Game.rate", VarValue::Float(0.5)).expect("float");
        assert_eq!(*host.borrow(), VarValue::Float(0.5));
    }
}
