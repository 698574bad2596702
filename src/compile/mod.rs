pub(crate) mod compiler;
pub(crate) mod context;
pub(crate) mod fingerprint;
pub(crate) mod graph;
pub(crate) mod scheduler;
