//! Command handlers for kmerge

pub mod contexts;
pub mod merge;
pub mod prereq;
pub mod profile;
pub mod setup;

#[cfg(test)]
pub(crate) mod testing;
