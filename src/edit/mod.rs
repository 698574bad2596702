pub(crate) mod apply;
pub(crate) mod command;
pub(crate) mod ops;
pub(crate) mod ripple;
pub(crate) mod target;
pub(crate) mod trace;
