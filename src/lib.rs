// DriveGate - Library Root
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// All modules exported here for use by the binary and tests.

pub mod paths;
pub mod config;
pub mod error;
pub mod outcome;
pub mod approval;
pub mod gate;
pub mod fs;
pub mod registry;
pub mod audit;
pub mod session;
pub mod mcp;
