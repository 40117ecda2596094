//! Activation condition record.

use crate::error::{LefError, LefResult};
use crate::io_ext::{
    read_f32, read_fixed_str, read_u16, read_u32, read_u8, write_f32, write_fixed_str, write_u16,
    write_u32, write_u8,
};
use std::io::{Read, Write};

pub const CONDITION_VALUE_LEN: usize = 128;

pub const ACTIVATION_RULE_SIZE: usize = 4 + 1 + 1 + CONDITION_VALUE_LEN + 4 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConditionType {
    Text = 0,
    Speaker = 1,
    Language = 2,
    Time = 3,
    Custom = 4,
}

impl ConditionType {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => ConditionType::Text,
            1 => ConditionType::Speaker,
            2 => ConditionType::Language,
            3 => ConditionType::Time,
            4 => ConditionType::Custom,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized condition type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConditionOperator {
    Eq = 0,
    Contains = 1,
    Range = 2,
    Regex = 3,
}

impl ConditionOperator {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => ConditionOperator::Eq,
            1 => ConditionOperator::Contains,
            2 => ConditionOperator::Range,
            3 => ConditionOperator::Regex,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized condition operator {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRule {
    pub rule_id: u32,
    pub condition_type: ConditionType,
    pub operator: ConditionOperator,
    pub condition_value: String,
    pub activation_weight: f32,
    pub priority: u16,
}

impl ActivationRule {
    pub fn validate(&self) -> LefResult<()> {
        if !(0.0..=1.0).contains(&self.activation_weight) {
            return Err(LefError::InvalidFormat(format!(
                "activation_weight must be within [0.0, 1.0], got {}",
                self.activation_weight
            )));
        }
        if self.condition_value.is_empty() {
            return Err(LefError::InvalidFormat(
                "condition_value is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        let rule_id = read_u32(r)?;
        let condition_type = ConditionType::from_u8(read_u8(r)?)?;
        let operator = ConditionOperator::from_u8(read_u8(r)?)?;
        let condition_value = read_fixed_str(r, CONDITION_VALUE_LEN)?;
        let activation_weight = read_f32(r)?;
        let priority = read_u16(r)?;

        let rule = ActivationRule {
            rule_id,
            condition_type,
            operator,
            condition_value,
            activation_weight,
            priority,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_u32(w, self.rule_id)?;
        write_u8(w, self.condition_type as u8)?;
        write_u8(w, self.operator as u8)?;
        write_fixed_str(w, &self.condition_value, CONDITION_VALUE_LEN)?;
        write_f32(w, self.activation_weight)?;
        write_u16(w, self.priority)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> ActivationRule {
        ActivationRule {
            rule_id: 1,
            condition_type: ConditionType::Language,
            operator: ConditionOperator::Eq,
            condition_value: "fr".to_string(),
            activation_weight: 1.0,
            priority: 5,
        }
    }

    #[test]
    fn roundtrip() {
        let rule = sample();
        let mut buf = Vec::new();
        rule.write(&mut buf).unwrap();
        assert_eq!(buf.len(), ACTIVATION_RULE_SIZE);
        let mut cursor = Cursor::new(buf);
        assert_eq!(ActivationRule::read(&mut cursor).unwrap(), rule);
    }

    #[test]
    fn rejects_weight_out_of_range() {
        let mut rule = sample();
        rule.activation_weight = 2.0;
        assert!(rule.validate().is_err());
    }

    #[test]
    fn rejects_empty_condition_value() {
        let mut rule = sample();
        rule.condition_value = String::new();
        assert!(rule.validate().is_err());
    }
}
