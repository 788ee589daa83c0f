//! Workspace management
//!
//! A workspace is a directory holding one schema, one key store, its
//! archives and its outputs. See [`layout`] for the directory structure.

pub mod layout;
pub mod registry;
pub mod status;

pub use layout::Workspace;
pub use registry::WorkspaceRegistry;
pub use status::WorkspaceStatus;
