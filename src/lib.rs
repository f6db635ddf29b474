//! # slirc-modes
//!
//! Channel and user mode engine for Straylight IRC daemons.
//!
//! This crate is the mode subsystem on its own: it defines, validates,
//! applies and reports mode changes, and deterministically reconciles
//! conflicting changes arriving from independently acting peer servers.
//! It owns no sockets, no parser for full IRC lines and no numerics;
//! callers feed it pre-tokenized requests and render its change records.
//!
//! ## Features
//!
//! - Mode definitions in four categories (flags, mask lists, parameter
//!   values, prefix ranks) behind one registry, extensible at runtime
//! - Per-channel bounded lists with glob-configured, rehashable limits
//! - Rank-based access control with operator override and trusted peers
//! - Batch application with per-tuple outcomes; one bad tuple never
//!   aborts its siblings
//! - Timestamp-first conflict resolution with pure, commutative
//!   tie-breakers, so a meshed network converges without consensus
//!
//! ## Quick start
//!
//! ```rust
//! use slirc_modes::def::TargetKind;
//! use slirc_modes::engine::parse_mode_args;
//! use slirc_modes::target::ChannelModes;
//! use slirc_modes::{ModeEngine, ModeRegistry, ModesConfig, Origin, Target, register_standard};
//!
//! let mut registry = ModeRegistry::new();
//! let modes = register_standard(&mut registry).expect("fresh registry");
//! let engine = ModeEngine::with_config(&ModesConfig::default().lists).expect("default config");
//!
//! let mut chan = ChannelModes::new("#rust");
//! chan.join("alice");
//! chan.member_mut("alice").unwrap().grant(modes.op, 10);
//! chan.join("bob");
//!
//! let parsed = parse_mode_args(&registry, TargetKind::Channel, &["+tv", "bob"]).unwrap();
//! let record = engine.apply(
//!     &registry,
//!     Target::Channel(&mut chan),
//!     Origin::Local { nick: "alice", oper: false },
//!     &parsed.changes,
//!     1_700_000_000,
//! );
//!
//! assert_eq!(record.mode_string().as_deref(), Some("+tv bob"));
//! assert_eq!(chan.mode_string(&registry), "+t");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod catalog;
pub mod config;
pub mod def;
pub mod engine;
pub mod error;
pub mod isupport;
pub mod list;
pub mod member;
pub mod param;
pub mod target;

pub use catalog::{StandardModes, register_standard};
pub use config::{ListLimits, ListLimitsConfig, ModesConfig};
pub use def::{ModeDef, ModeId, ModeKind, ModeRegistry, ParamPolicy, ParamValue, TargetKind};
pub use engine::{
    ChangeRecord, ModeEngine, Origin, Outcome, ParsedModes, RecordItem, RequestedChange, Target,
    parse_mode_args,
};
pub use error::{ConfigError, ParseError, RegistryError, RejectReason, SkipReason};
pub use list::{ListEntry, ModeList};
pub use member::Membership;
pub use param::Merge;
pub use target::{ChannelModes, UserModes};
