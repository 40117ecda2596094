//! Extension metadata record.

use crate::error::{LefError, LefResult};
use crate::io_ext::{
    read_f32, read_fixed_str, read_u16, read_u32, read_u8, write_f32, write_fixed_str, write_u16,
    write_u32, write_u8,
};
use std::io::{Read, Write};

pub const LANGUAGE_CODE_LEN: usize = 8;
pub const ACCENT_CODE_LEN: usize = 8;

/// Sentinel for an unset byte-valued hint.
pub const HINT_UNSET: u8 = 255;

/// `capability_flags` bit the activation engine reads: set means
/// the extension only activates when its `activation_rules` match; unset
/// means the extension is unconditional (always active at weight 1).
pub const CONDITIONAL: u32 = 0x0000_0001;

pub const EXTENSION_META_SIZE: usize =
    2 + 2 + 2 + 2 + 4 + 2 + 1 + 1 + LANGUAGE_CODE_LEN + ACCENT_CODE_LEN + 4 + 4 + 4 + 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionMeta {
    /// Compatibility window against the base model version: the base must
    /// fall within `[min, max]` inclusive, compared lexicographically on
    /// `(major, minor)`.
    pub compat_min_major: u16,
    pub compat_min_minor: u16,
    pub compat_max_major: u16,
    pub compat_max_minor: u16,

    /// Bitmask of extension-defined capabilities; meaning is extension-kind
    /// specific and opaque to the loader.
    pub capability_flags: u32,
    pub priority: u16,

    /// `255` (`HINT_UNSET`) means "not specified".
    pub voice_gender: u8,
    pub voice_age_range: u8,
    pub language_code: String,
    pub accent_code: String,

    pub quality_score: f32,
    pub performance_impact: f32,
    pub estimated_load_time_ms: f32,
    pub estimated_inference_overhead_ms: f32,
}

impl ExtensionMeta {
    pub fn validate(&self) -> LefResult<()> {
        for (label, v) in [
            ("quality_score", self.quality_score),
            ("performance_impact", self.performance_impact),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(LefError::InvalidFormat(format!(
                    "{label} must be within [0.0, 1.0], got {v}"
                )));
            }
        }
        if self.estimated_load_time_ms < 0.0 || self.estimated_inference_overhead_ms < 0.0 {
            return Err(LefError::InvalidFormat(
                "estimated timings must be non-negative".to_string(),
            ));
        }
        if (self.compat_max_major, self.compat_max_minor)
            < (self.compat_min_major, self.compat_min_minor)
        {
            return Err(LefError::InvalidFormat(
                "compatibility window's max version is below its min version".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> LefResult<Self> {
        let compat_min_major = read_u16(r)?;
        let compat_min_minor = read_u16(r)?;
        let compat_max_major = read_u16(r)?;
        let compat_max_minor = read_u16(r)?;
        let capability_flags = read_u32(r)?;
        let priority = read_u16(r)?;
        let voice_gender = read_u8(r)?;
        let voice_age_range = read_u8(r)?;
        let language_code = read_fixed_str(r, LANGUAGE_CODE_LEN)?;
        let accent_code = read_fixed_str(r, ACCENT_CODE_LEN)?;
        let quality_score = read_f32(r)?;
        let performance_impact = read_f32(r)?;
        let estimated_load_time_ms = read_f32(r)?;
        let estimated_inference_overhead_ms = read_f32(r)?;

        let meta = ExtensionMeta {
            compat_min_major,
            compat_min_minor,
            compat_max_major,
            compat_max_minor,
            capability_flags,
            priority,
            voice_gender,
            voice_age_range,
            language_code,
            accent_code,
            quality_score,
            performance_impact,
            estimated_load_time_ms,
            estimated_inference_overhead_ms,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> LefResult<()> {
        write_u16(w, self.compat_min_major)?;
        write_u16(w, self.compat_min_minor)?;
        write_u16(w, self.compat_max_major)?;
        write_u16(w, self.compat_max_minor)?;
        write_u32(w, self.capability_flags)?;
        write_u16(w, self.priority)?;
        write_u8(w, self.voice_gender)?;
        write_u8(w, self.voice_age_range)?;
        write_fixed_str(w, &self.language_code, LANGUAGE_CODE_LEN)?;
        write_fixed_str(w, &self.accent_code, ACCENT_CODE_LEN)?;
        write_f32(w, self.quality_score)?;
        write_f32(w, self.performance_impact)?;
        write_f32(w, self.estimated_load_time_ms)?;
        write_f32(w, self.estimated_inference_overhead_ms)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> ExtensionMeta {
        ExtensionMeta {
            compat_min_major: 1,
            compat_min_minor: 0,
            compat_max_major: 1,
            compat_max_minor: 9,
            capability_flags: 0,
            priority: 10,
            voice_gender: HINT_UNSET,
            voice_age_range: HINT_UNSET,
            language_code: "en".to_string(),
            accent_code: "us".to_string(),
            quality_score: 0.85,
            performance_impact: 0.1,
            estimated_load_time_ms: 12.5,
            estimated_inference_overhead_ms: 0.3,
        }
    }

    #[test]
    fn roundtrip() {
        let meta = sample();
        let mut buf = Vec::new();
        meta.write(&mut buf).unwrap();
        assert_eq!(buf.len(), EXTENSION_META_SIZE);
        let mut cursor = Cursor::new(buf);
        assert_eq!(ExtensionMeta::read(&mut cursor).unwrap(), meta);
    }

    #[test]
    fn rejects_quality_score_out_of_range() {
        let mut meta = sample();
        meta.quality_score = 1.5;
        assert!(meta.validate().is_err());
    }

    #[test]
    fn unset_hint_sentinel_is_accepted() {
        let meta = sample();
        assert_eq!(meta.voice_gender, HINT_UNSET);
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_compatibility_window() {
        let mut meta = sample();
        meta.compat_max_major = 0;
        meta.compat_max_minor = 0;
        assert!(meta.validate().is_err());
    }
}
