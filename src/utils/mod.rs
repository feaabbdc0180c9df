// Utils module - Utility functions

pub mod network;
