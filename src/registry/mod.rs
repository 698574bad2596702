pub(crate) mod capability;
pub(crate) mod manifest;
pub(crate) mod standard;
