//! Inter-extension dependency record.

use crate::error::{LefError, LefResult};
use crate::io_ext::{read_fixed_str, read_u32, read_u8, write_fixed_str, write_u32, write_u8};
use std::io::{Read, Write};

pub const DEP_NAME_LEN: usize = 64;
pub const DEP_VERSION_LEN: usize = 16;

pub const DEPENDENCY_SIZE: usize = 4 + DEP_NAME_LEN + DEP_VERSION_LEN + DEP_VERSION_LEN + 1 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DependencyType {
    Required = 0,
    Optional = 1,
    Conflict = 2,
}

impl DependencyType {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => DependencyType::Required,
            1 => DependencyType::Optional,
            2 => DependencyType::Conflict,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized dependency type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoadOrder {
    Before = 0,
    After = 1,
    DontCare = 2,
}

impl LoadOrder {
    pub fn from_u8(v: u8) -> LefResult<Self> {
        Ok(match v {
            0 => LoadOrder::Before,
            1 => LoadOrder::After,
            2 => LoadOrder::DontCare,
            other => {
                return Err(LefError::InvalidFormat(format!(
                    "unrecognized load order {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub dependency_id: u32,
    pub name: String,
    pub min_version: String,
    pub max_version: String,
    pub dependency_type: DependencyType,
    pub load_order: LoadOrder,
}

impl Dependency {
    pub fn validate(&self) -> LefResult<()> {
        if self.name.is_empty() {
            return Err(LefError::InvalidFormat(
                "dependency name is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        let dependency_id = read_u32(r)?;
        let name = read_fixed_str(r, DEP_NAME_LEN)?;
        let min_version = read_fixed_str(r, DEP_VERSION_LEN)?;
        let max_version = read_fixed_str(r, DEP_VERSION_LEN)?;
        let dependency_type = DependencyType::from_u8(read_u8(r)?)?;
        let load_order = LoadOrder::from_u8(read_u8(r)?)?;

        let dep = Dependency {
            dependency_id,
            name,
            min_version,
            max_version,
            dependency_type,
            load_order,
        };
        dep.validate()?;
        Ok(dep)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_u32(w, self.dependency_id)?;
        write_fixed_str(w, &self.name, DEP_NAME_LEN)?;
        write_fixed_str(w, &self.min_version, DEP_VERSION_LEN)?;
        write_fixed_str(w, &self.max_version, DEP_VERSION_LEN)?;
        write_u8(w, self.dependency_type as u8)?;
        write_u8(w, self.load_order as u8)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Dependency {
        Dependency {
            dependency_id: 1,
            name: "base-phonemizer".to_string(),
            min_version: "1.0".to_string(),
            max_version: "1.9".to_string(),
            dependency_type: DependencyType::Required,
            load_order: LoadOrder::Before,
        }
    }

    #[test]
    fn roundtrip() {
        let dep = sample();
        let mut buf = Vec::new();
        dep.write(&mut buf).unwrap();
        assert_eq!(buf.len(), DEPENDENCY_SIZE);
        let mut cursor = Cursor::new(buf);
        assert_eq!(Dependency::read(&mut cursor).unwrap(), dep);
    }

    #[test]
    fn rejects_empty_name() {
        let mut dep = sample();
        dep.name = String::new();
        assert!(dep.validate().is_err());
    }
}
