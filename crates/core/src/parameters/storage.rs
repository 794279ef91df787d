//! Parameter store
//!
//! Named scalar values keyed by short ASCII names. Every write marks the
//! owning group (by name prefix) as changed so the firmware only pushes the
//! groups that actually moved.

use super::error::ParameterError;
use bitflags::bitflags;
use heapless::index_map::FnvIndexMap;
use heapless::String;

/// Maximum parameter name length
pub const PARAM_NAME_LEN: usize = 16;

/// Maximum number of parameters
pub const MAX_PARAMS: usize = 32;

bitflags! {
    /// Parameter groups, keyed by name prefix
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamGroup: u8 {
        /// `PPM_*`
        const PPM = 0b001;
        /// `TO_*`
        const TIMEOUT = 0b010;
        /// `TX_*`
        const TRANSMISSION = 0b100;
    }
}

impl ParamGroup {
    /// Group owning `name`; empty for names outside every group
    pub fn of(name: &str) -> Self {
        if name.starts_with("PPM_") {
            ParamGroup::PPM
        } else if name.starts_with("TO_") {
            ParamGroup::TIMEOUT
        } else if name.starts_with("TX_") {
            ParamGroup::TRANSMISSION
        } else {
            ParamGroup::empty()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl ParamValue {
    pub fn as_f32(&self) -> f32 {
        match self {
            ParamValue::Bool(v) => *v as u8 as f32,
            ParamValue::Int(v) => *v as f32,
            ParamValue::Float(v) => *v,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            ParamValue::Bool(v) => *v as i32,
            ParamValue::Int(v) => *v,
            ParamValue::Float(v) => *v as i32,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            ParamValue::Bool(v) => *v,
            ParamValue::Int(v) => *v != 0,
            ParamValue::Float(v) => *v != 0.0,
        }
    }
}

/// Fixed-capacity parameter store
pub struct ParameterStore {
    values: FnvIndexMap<String<PARAM_NAME_LEN>, ParamValue, MAX_PARAMS>,
    changed: ParamGroup,
}

fn key(name: &str) -> Result<String<PARAM_NAME_LEN>, ParameterError> {
    let mut key = String::new();
    key.push_str(name).map_err(|_| ParameterError::InvalidConfig)?;
    Ok(key)
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: FnvIndexMap::new(),
            changed: ParamGroup::empty(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(&key(name).ok()?)
    }

    pub fn get_f32_or(&self, name: &str, default: f32) -> f32 {
        self.get(name).map_or(default, ParamValue::as_f32)
    }

    pub fn get_i32_or(&self, name: &str, default: i32) -> i32 {
        self.get(name).map_or(default, ParamValue::as_i32)
    }

    pub fn get_bool_or(&self, name: &str, default: bool) -> bool {
        self.get(name).map_or(default, ParamValue::as_bool)
    }

    /// Overwrite a registered parameter
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a name that was never registered.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let key = key(name)?;
        let slot = self
            .values
            .get_mut(&key)
            .ok_or(ParameterError::InvalidConfig)?;
        if *slot != value {
            *slot = value;
            self.changed |= ParamGroup::of(name);
        }
        Ok(())
    }

    /// Add a parameter with its default; re-registering keeps the stored value
    pub fn register(&mut self, name: &str, default: ParamValue) -> Result<(), ParameterError> {
        let key = key(name)?;
        if self.values.contains_key(&key) {
            return Ok(());
        }
        self.values
            .insert(key, default)
            .map_err(|_| ParameterError::StoreFull)?;
        self.changed |= ParamGroup::of(name);
        Ok(())
    }

    /// Groups written since the last [`Self::take_changed`]
    pub fn changed(&self) -> ParamGroup {
        self.changed
    }

    /// Return and clear the changed groups
    pub fn take_changed(&mut self) -> ParamGroup {
        core::mem::replace(&mut self.changed, ParamGroup::empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
