//! Test suites for the NAS daemon.

pub(crate) mod support;
