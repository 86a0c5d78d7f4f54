// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Still sink   │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG File   │
//! │ (JPEG plane) │     │  - copy + release │     │              │
//! │              │     │  - hand-off       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Preview      │ ──▶ │  Snapshot         │ ──▶ │  JPEG File   │
//! │ bitmap (RGBA)│     │  - RGBA→RGB       │     │              │
//! │              │     │  - JPEG q100      │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! - [`photo`]: still request building, image extraction and encoding

pub mod photo;
