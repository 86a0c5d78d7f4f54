// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Session Layer                 │
//! └────────────────────┬────────────────────────┘
//!                      │ traits + DeviceEvent queue
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │ Camera contracts │  │ Virtual camera  │  │
//! │  │ (traits, types)  │  │ (synthetic)     │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: device, session and surface contracts shared by all backends
//! - [`virtual_camera`]: in-process camera with a synthetic sensor

pub mod camera;
pub mod virtual_camera;
