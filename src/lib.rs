//! spritecut - Library for cutting sprite sheets into frames
//!
//! This library provides functionality to:
//! - Slice sheets laid out on a uniform grid, with offsets and spacing
//! - Extract irregular sprites found by connected-component labeling
//! - Detect frame size, margins and spacing heuristically
//! - Switch between extraction modes with rollback on failure

pub mod auto_detect;
pub mod ccl;
pub mod cli;
pub mod config;
pub mod controller;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod grid;
pub mod output;
