//! Extension/base compatibility checking.

use super::lefx::ExtensionModel;
use crate::error::{LefError, LefResult};
use crate::format::{Header, ModelMeta, Version};

/// Check that `ext` is safe to load against a particular base model. Checks,
/// in order: base model name (only if the extension named one), base model
/// hash (if the extension pinned one), minimum required base file size, and
/// the base model's version against the extension's declared compatibility
/// window (min/max base version, inclusive).
pub fn check_compatibility(
    ext: &ExtensionModel,
    base_header: &Header,
    base_meta: &ModelMeta,
) -> LefResult<()> {
    if !ext.header.base_model_name.is_empty() && ext.header.base_model_name != base_meta.name {
        return Err(LefError::InvalidArgument(format!(
            "extension '{}' targets base model '{}', loaded base is '{}'",
            ext.header.extension_name, ext.header.base_model_name, base_meta.name
        )));
    }

    if ext.header.base_model_hash != 0 && ext.header.base_model_hash != base_header.model_hash {
        return Err(LefError::InvalidArgument(format!(
            "extension '{}' pins base model hash {:#010x}, loaded base hashes to {:#010x}",
            ext.header.extension_name, ext.header.base_model_hash, base_header.model_hash
        )));
    }

    if ext.header.required_base_size > 0 && base_header.file_size < ext.header.required_base_size {
        return Err(LefError::InvalidArgument(format!(
            "extension '{}' requires a base file of at least {} bytes, loaded base is {} bytes",
            ext.header.extension_name, ext.header.required_base_size, base_header.file_size
        )));
    }

    let base_version = base_header.version();
    let floor = Version::new(ext.meta.compat_min_major, ext.meta.compat_min_minor);
    let ceiling = Version::new(ext.meta.compat_max_major, ext.meta.compat_max_minor);
    if !base_version.is_supported(floor, ceiling) {
        return Err(LefError::VersionIncompatible {
            file_major: base_version.major,
            file_minor: base_version.minor,
            min_major: floor.major,
            min_minor: floor.minor,
            max_major: ceiling.major,
            max_minor: ceiling.minor,
        });
    }

    Ok(())
}

pub fn is_compatible(ext: &ExtensionModel, base_header: &Header, base_meta: &ModelMeta) -> bool {
    check_compatibility(ext, base_header, base_meta).is_ok()
}
